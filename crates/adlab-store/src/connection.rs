//! Connection pooling.
//!
//! A small r2d2 pool over SQLite. The reference workload is sequential, so
//! the pool exists for lifetime management rather than parallelism: it is
//! opened once at batch start and dropped on all exit paths.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::Result;
use crate::migrations::run_migrations;

/// Pooled SQLite connections.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// One checked-out connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

fn init_pragmas(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
}

/// Open a file-backed pool and run migrations.
pub fn open_pool(path: &Path) -> Result<ConnectionPool> {
    let manager =
        SqliteConnectionManager::file(path).with_init(|conn: &mut rusqlite::Connection| init_pragmas(conn));
    let pool = r2d2::Pool::builder().max_size(4).build(manager)?;
    let conn = pool.get()?;
    run_migrations(&conn)?;
    Ok(pool)
}

/// Open an in-memory pool (single connection — each SQLite memory
/// connection is its own database) and run migrations. Test use only.
pub fn open_in_memory() -> Result<ConnectionPool> {
    let manager =
        SqliteConnectionManager::memory().with_init(|conn: &mut rusqlite::Connection| init_pragmas(conn));
    let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
    let conn = pool.get()?;
    run_migrations(&conn)?;
    Ok(pool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_is_migrated() {
        let pool = open_in_memory().unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn file_pool_is_migrated_and_reopenable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adlab.db");
        {
            let pool = open_pool(&path).unwrap();
            let conn = pool.get().unwrap();
            let _ = conn
                .execute(
                    "INSERT INTO campaigns
                     (campaign_number, product_type, event_type, profile, status, created_at)
                     VALUES (1, 'Smartphone', 'Christmas', 'speed', 'pending', '2026-01-01T00:00:00Z')",
                    [],
                )
                .unwrap();
        }
        let pool = open_pool(&path).unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM campaigns", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
