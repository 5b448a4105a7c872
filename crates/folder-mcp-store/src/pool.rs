//! Opening and closing the per-folder SQLite database.

use crate::error::StoreResult;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Open (creating if absent) the SQLite database at `path`, apply the
/// required pragmas, and run any pending migrations inside a single
/// transaction.
///
/// # Errors
///
/// Returns an error if the file can't be opened/created or migrations fail.
pub async fn open_store(path: &Path) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .map_err(sqlx::Error::from)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    info!(path = %path.display(), "opened embedding store");

    sqlx::migrate!("./migrations").run(&pool).await?;
    debug!("embedding store migrations applied");

    Ok(pool)
}

/// Drain pending writes, checkpoint the WAL into the main database file, and
/// close the pool so the OS releases the WAL/SHM file handles.
///
/// # Errors
///
/// Returns an error if the checkpoint query fails.
pub async fn close_store(pool: SqlitePool) -> StoreResult<()> {
    sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
        .execute(&pool)
        .await?;
    pool.close().await;
    debug!("embedding store closed");
    Ok(())
}
