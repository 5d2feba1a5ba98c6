//! Thin wrapper around `rusqlite` that prepares, binds, and steps a
//! statement once, converting engine failures into a chained
//! [`zsql_runtime::Error`]. `rusqlite::Statement` finalizes itself on
//! `Drop`, so this module's job is purely the error-chaining contract: any
//! failure carries the SQL engine's message as a `Database`-kind error,
//! applying the Error Chain's de-duplication rule when a `cause` is given.

use rusqlite::{Connection, Params, Row};
use zsql_runtime::Error;

/// Runs `sql` to completion (no result rows expected), e.g. DDL or a
/// one-shot `INSERT`/`UPDATE`/`DELETE`.
pub fn exec(conn: &Connection, sql: &str) -> Result<(), Error> {
    conn.execute_batch(sql)
        .map_err(|e| Error::from_database(e.to_string(), None))
}

/// Prepares `sql`, binds `params`, and steps once, mapping the first row
/// (if any) with `row_fn`. Returns `Ok(None)` if the statement produced no
/// rows — callers distinguish "not found" from the SQL Helper's "no error"
/// contract by inspecting the `Option`.
pub fn query_row_opt<T, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    row_fn: impl FnOnce(&Row) -> rusqlite::Result<T>,
) -> Result<Option<T>, Error> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| Error::from_database(e.to_string(), None))?;

    let mut rows = stmt
        .query(params)
        .map_err(|e| Error::from_database(e.to_string(), None))?;

    match rows.next() {
        Ok(Some(row)) => row_fn(row)
            .map(Some)
            .map_err(|e| Error::from_database(e.to_string(), None)),
        Ok(None) => Ok(None),
        Err(e) => Err(Error::from_database(e.to_string(), None)),
    }
}

/// Runs a parameterized statement expected to affect rows but return none,
/// e.g. `INSERT ... ON CONFLICT DO UPDATE`.
pub fn exec_params<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<usize, Error> {
    conn.execute(sql, params)
        .map_err(|e| Error::from_database(e.to_string(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_runs_ddl() {
        let conn = Connection::open_in_memory().unwrap();
        exec(&conn, "CREATE TABLE t(x INTEGER)").unwrap();
        exec_params(&conn, "INSERT INTO t(x) VALUES (?1)", [1]).unwrap();
        let value: Option<i64> =
            query_row_opt(&conn, "SELECT x FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(value, Some(1));
    }

    #[test]
    fn query_row_opt_returns_none_on_empty_result() {
        let conn = Connection::open_in_memory().unwrap();
        exec(&conn, "CREATE TABLE t(x INTEGER)").unwrap();
        let value: Option<i64> =
            query_row_opt(&conn, "SELECT x FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn exec_reports_database_error_with_engine_message() {
        let conn = Connection::open_in_memory().unwrap();
        let err = exec(&conn, "SELECT * FROM no_such_table").unwrap_err();
        assert!(err.message().contains("no such table"));
    }
}
