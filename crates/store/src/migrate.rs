//! Monotonic, forward-only schema evolution. Migrations run inside a single
//! `BEGIN EXCLUSIVE` transaction, re-checking the on-disk version once
//! inside the transaction to guard against a racing migrator from another
//! process.

use rusqlite::{Connection, OptionalExtension};

use crate::sqlh;
use zsql_runtime::Error;

/// The schema version this build understands. Equal to the number of
/// migrations in [`MIGRATIONS`].
pub const CURRENT_VERSION: i64 = 3;

type MigrationFn = fn(&Connection) -> Result<(), Error>;

const MIGRATIONS: &[MigrationFn] = &[migrate_v1, migrate_v2, migrate_v3];

/// Reads `PRAGMA user_version`.
fn read_version(conn: &Connection) -> Result<i64, Error> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| Error::from_database(e.to_string(), None))
}

fn write_version(conn: &Connection, version: i64) -> Result<(), Error> {
    sqlh::exec(conn, &format!("PRAGMA user_version = {version}"))
}

/// Brings `conn`'s schema from its current version up to
/// [`CURRENT_VERSION`]. A no-op if already current. Fails loudly (without
/// mutating anything) if the database's version is newer than this build
/// knows how to handle.
pub fn migrate(conn: &mut Connection) -> Result<(), Error> {
    let on_disk = read_version(conn)?;

    if on_disk > CURRENT_VERSION {
        return Err(Error::schema(format!(
            "database schema newer than application (db={on_disk}, app={CURRENT_VERSION})"
        )));
    }
    if on_disk == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction_with_behavior(rusqlite::TransactionBehavior::Exclusive)
        .map_err(|e| Error::from_database(e.to_string(), None))?;

    // Re-read inside the exclusive transaction: guards against another
    // process having migrated between our first read and acquiring the
    // lock.
    let current: i64 = tx
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| Error::from_database(e.to_string(), None))?;

    if current > CURRENT_VERSION {
        // Rollback happens on Drop since we never commit.
        return Err(Error::schema(format!(
            "database schema newer than application (db={current}, app={CURRENT_VERSION})"
        )));
    }

    for version in current..CURRENT_VERSION {
        log::info!("applying migration {} -> {}", version, version + 1);
        let step = MIGRATIONS[version as usize];
        step(&tx)?;
    }

    write_version(&tx, CURRENT_VERSION)?;

    tx.commit().map_err(|e| {
        log::error!("migration commit failed: {e}");
        Error::from_database(e.to_string(), None)
    })?;

    Ok(())
}

/// v0 -> v1: the initial schema. A `dirs` table keyed by `frecency`, its
/// uniqueness/ordering index, the decay trigger, and a `meta` table
/// carrying the endianness marker.
fn migrate_v1(conn: &Connection) -> Result<(), Error> {
    sqlh::exec(
        conn,
        "CREATE TABLE dirs (
            dir BLOB NOT NULL UNIQUE,
            frecency INTEGER NOT NULL DEFAULT 1
        )",
    )?;
    sqlh::exec(
        conn,
        "CREATE INDEX index_by_frecency_and_dir ON dirs(frecency, dir)",
    )?;
    sqlh::exec(
        conn,
        "CREATE TRIGGER trigger_on_update_forget
         AFTER UPDATE ON dirs
         WHEN (SELECT SUM(frecency) FROM dirs) >= 5000
         BEGIN
            UPDATE dirs SET frecency = CAST(frecency * 0.9 AS INTEGER);
            DELETE FROM dirs WHERE frecency = 0;
         END",
    )?;
    sqlh::exec(
        conn,
        "CREATE TABLE meta (key TEXT UNIQUE NOT NULL, value NUMERIC)",
    )?;
    sqlh::exec_params(
        conn,
        "INSERT INTO meta(key, value) VALUES ('little_endian', ?1)",
        [i64::from(cfg!(target_endian = "little"))],
    )?;
    Ok(())
}

/// v1 -> v2: add a surrogate `id` primary key and a `visited_at` timestamp,
/// defaulting existing rows to the migration's own run time.
fn migrate_v2(conn: &Connection) -> Result<(), Error> {
    sqlh::exec(
        conn,
        "CREATE TABLE dirs_v2 (
            id INTEGER PRIMARY KEY,
            dir BLOB NOT NULL UNIQUE,
            frecency INTEGER NOT NULL DEFAULT 1,
            visited_at INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    let now = chrono::Utc::now().timestamp();
    sqlh::exec_params(
        conn,
        "INSERT INTO dirs_v2(dir, frecency, visited_at)
         SELECT dir, frecency, ?1 FROM dirs",
        [now],
    )?;
    sqlh::exec(conn, "DROP TRIGGER trigger_on_update_forget")?;
    sqlh::exec(conn, "DROP INDEX index_by_frecency_and_dir")?;
    sqlh::exec(conn, "DROP TABLE dirs")?;
    sqlh::exec(conn, "ALTER TABLE dirs_v2 RENAME TO dirs")?;
    sqlh::exec(
        conn,
        "CREATE INDEX index_by_frecency_and_dir ON dirs(frecency, dir)",
    )?;
    sqlh::exec(
        conn,
        "CREATE TRIGGER trigger_on_update_forget
         AFTER UPDATE ON dirs
         WHEN (SELECT SUM(frecency) FROM dirs) >= 5000
         BEGIN
            UPDATE dirs SET frecency = CAST(frecency * 0.9 AS INTEGER);
            DELETE FROM dirs WHERE frecency = 0;
         END",
    )?;
    Ok(())
}

/// v2 -> v3: split `frecency` into separate `visits` (carrying over the old
/// column's value) and rebuild the decay trigger to scale/evict on
/// `visits` instead.
fn migrate_v3(conn: &Connection) -> Result<(), Error> {
    sqlh::exec(conn, "ALTER TABLE dirs ADD COLUMN visits INTEGER NOT NULL DEFAULT 1")?;
    sqlh::exec(conn, "UPDATE dirs SET visits = frecency")?;
    sqlh::exec(conn, "DROP TRIGGER trigger_on_update_forget")?;
    sqlh::exec(conn, "DROP INDEX index_by_frecency_and_dir")?;
    sqlh::exec(conn, "ALTER TABLE dirs DROP COLUMN frecency")?;
    sqlh::exec(
        conn,
        "CREATE INDEX index_by_visits_and_dir ON dirs(visits, dir)",
    )?;
    sqlh::exec(
        conn,
        "CREATE TRIGGER trigger_on_update_forget
         AFTER UPDATE ON dirs
         WHEN (SELECT SUM(visits) FROM dirs) >= 5000
         BEGIN
            UPDATE dirs SET visits = CAST(visits * 0.9 AS INTEGER);
            DELETE FROM dirs WHERE visits = 0;
         END",
    )?;
    Ok(())
}

/// Reads the `little_endian` marker from the `meta` table, if present.
pub fn little_endian_marker(conn: &Connection) -> Result<Option<bool>, Error> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = 'little_endian'",
        [],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.map(|n| n != 0))
    .map_err(|e| Error::from_database(e.to_string(), None))
}
