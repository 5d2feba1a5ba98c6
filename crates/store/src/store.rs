//! Owns the database connection, registers the scorer as a SQL UDF, and
//! implements the three store operations: `add`, `search`, and the
//! search-half of `forget` (the confirmation prompt and row deletion are
//! split across [`Store::search_best`] and [`Store::delete`] so the store
//! itself never touches a terminal).

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

use zsql_runtime::Error;

use crate::normalize::{self, NormalizeOptions};
use crate::sqlh;

/// Initial-open retry policy: `SQLITE_BUSY` is retried up to this many
/// times with a fixed sleep between attempts before giving up.
const OPEN_RETRY_ATTEMPTS: u32 = 8;
const OPEN_RETRY_SLEEP: Duration = Duration::from_millis(16);
/// Busy-timeout applied once the connection is open, for lock contention
/// encountered mid-session.
const BUSY_TIMEOUT: Duration = Duration::from_millis(128);

pub struct Store {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub id: i64,
    pub dir: Vec<u8>,
}

impl Store {
    /// Opens the database at the default XDG-resolved path, creating the
    /// containing directory (mode `0700`) if necessary, then migrates and
    /// registers the scorer UDF.
    pub fn open() -> Result<Store, Error> {
        let path = zsql_runtime::default_database_path().ok_or_else(|| {
            Error::system("neither XDG_DATA_HOME nor HOME is set; cannot locate the database")
        })?;

        if let Some(dir) = path.parent() {
            zsql_runtime::ensure_dir_mode_0700(dir)?;
        }

        Store::open_at(&path)
    }

    /// Opens (and migrates) the database at an explicit path. Exposed for
    /// tests; production callers should use [`Store::open`].
    pub fn open_at(path: &Path) -> Result<Store, Error> {
        let mut conn = open_with_busy_retry(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| Error::from_database(e.to_string(), None))?;

        // `Connection::open` already created the file on disk (SQLite opens
        // the main database file eagerly, even before any writes), so it is
        // safe to restrict its permissions here rather than after migration.
        zsql_runtime::ensure_file_mode_0600(path)
            .map_err(|e| Error::system(format!("failed to set database file permissions: {e}")))?;

        crate::migrate::migrate(&mut conn)?;
        register_scorer(&conn)?;

        Ok(Store { conn })
    }

    /// Insert-or-update: a fresh `dir` is inserted with `visits = 1`; an
    /// existing `dir` has `visits` incremented and `visited_at` refreshed.
    pub fn add(&self, dir_bytes: &[u8]) -> Result<(), Error> {
        if dir_bytes.is_empty() {
            return Err(Error::user("cannot add an empty directory"));
        }

        let now = chrono::Utc::now().timestamp();
        sqlh::exec_params(
            &self.conn,
            "INSERT INTO dirs(dir, visits, visited_at) VALUES (?1, 1, ?2)
             ON CONFLICT(dir) DO UPDATE SET
                visits = visits + 1,
                visited_at = excluded.visited_at",
            (dir_bytes, now),
        )?;
        Ok(())
    }

    /// Finds the single best-ranked directory for `query`, or `Ok(None)`
    /// if nothing matched (every row's scorer output was `-inf`, or the
    /// table is empty).
    pub fn search_best(
        &self,
        query_codepoints: &[u32],
        opts: NormalizeOptions,
    ) -> Result<Option<DirEntry>, Error> {
        let blob = encode_query_blob(query_codepoints, opts);

        sqlh::query_row_opt(
            &self.conn,
            "WITH scored AS (
                SELECT id, dir, visits, visited_at,
                       match(dir, ?1) AS m,
                       DENSE_RANK() OVER (ORDER BY visited_at DESC) AS recency_rank
                FROM dirs
             )
             SELECT id, dir,
                    m
                    - (250000.0 / (visits + 300))
                    + (250000.0 / 301)
                    + (500.0 / recency_rank) AS rank
             FROM scored
             WHERE m IS NOT NULL
             ORDER BY rank DESC
             LIMIT 1",
            [blob],
            |row| {
                Ok(DirEntry {
                    id: row.get(0)?,
                    dir: row.get(1)?,
                })
            },
        )
    }

    /// Deletes the row with the given `id`. Used by the forget flow after
    /// the caller has confirmed the deletion with the user.
    pub fn delete(&self, id: i64) -> Result<(), Error> {
        sqlh::exec_params(&self.conn, "DELETE FROM dirs WHERE id = ?1", [id])?;
        Ok(())
    }
}

fn open_with_busy_retry(path: &Path) -> Result<Connection, Error> {
    let mut attempt = 0;
    loop {
        match Connection::open(path) {
            Ok(conn) => return Ok(conn),
            Err(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::DatabaseBusy && attempt < OPEN_RETRY_ATTEMPTS =>
            {
                attempt += 1;
                log::warn!(
                    "database busy opening {} (attempt {attempt}/{OPEN_RETRY_ATTEMPTS}): {}",
                    path.display(),
                    msg.unwrap_or_default()
                );
                std::thread::sleep(OPEN_RETRY_SLEEP);
            }
            Err(e) => return Err(Error::from_database(e.to_string(), None)),
        }
    }
}

/// Encodes the query blob handed to the `match` UDF: one options byte
/// followed by the query's codepoints as little-endian `u32`s.
fn encode_query_blob(codepoints: &[u32], opts: NormalizeOptions) -> Vec<u8> {
    let mut blob = Vec::with_capacity(1 + codepoints.len() * 4);
    blob.push(opts.to_byte());
    for &cp in codepoints {
        blob.extend_from_slice(&cp.to_le_bytes());
    }
    blob
}

fn decode_query_blob(blob: &[u8]) -> (NormalizeOptions, Vec<u32>) {
    if blob.is_empty() {
        return (NormalizeOptions::empty(), Vec::new());
    }

    let opts = NormalizeOptions::from_byte(blob[0]);
    let codepoints = blob[1..]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect();
    (opts, codepoints)
}

/// Registers the `match(dir BLOB, query BLOB) -> DOUBLE | NULL` UDF.
/// Declared deterministic/UTF-8/direct-only: it has no side effects, its
/// result depends only on its two arguments, and it must not be used to
/// affect database contents (it is read-only ranking logic).
fn register_scorer(conn: &Connection) -> Result<(), Error> {
    conn.create_scalar_function(
        "match",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC | FunctionFlags::SQLITE_DIRECTONLY,
        move |ctx| {
            let dir_bytes = ctx.get_raw(0).as_blob().unwrap_or_default();
            let query_blob = ctx.get_raw(1).as_blob().unwrap_or_default();

            let (opts, query_codepoints) = decode_query_blob(query_blob);
            let candidate_codepoints = normalize::normalize(&zsql_codec::encode(dir_bytes), opts);

            let score = zsql_scorer::score(&candidate_codepoints, &query_codepoints);
            if score.is_finite() {
                Ok(Some(score))
            } else {
                Ok(None)
            }
        },
    )
    .map_err(|e| Error::from_database(e.to_string(), None))
}

pub fn default_database_path() -> Option<PathBuf> {
    zsql_runtime::default_database_path()
}
