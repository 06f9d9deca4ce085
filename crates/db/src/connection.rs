use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

/// Opens a pool, creating the database file on first use.
///
/// sqlx names each `sqlite::memory:` pool's database and opens it in shared
/// cache mode, so every connection of one pool sees the same catalog.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::connect_with_settings;

    #[tokio::test]
    async fn in_memory_pool_answers_queries() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("select");

        assert_eq!(one, 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn in_memory_pool_connections_share_one_database() {
        let pool = connect_with_settings("sqlite::memory:", 3, 5).await.expect("connect");
        let mut first = pool.acquire().await.expect("first connection");
        let mut second = pool.acquire().await.expect("second connection");

        sqlx::query("CREATE TABLE shared (id INTEGER)").execute(&mut *first).await.expect("create");
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'shared'",
        )
        .fetch_one(&mut *second)
        .await
        .expect("lookup");

        assert_eq!(tables, 1);
        drop(first);
        drop(second);
        pool.close().await;
    }

    #[tokio::test]
    async fn file_database_is_created_on_first_connect() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.db");
        let url = format!("sqlite://{}", path.display());

        let pool = connect_with_settings(&url, 2, 5).await.expect("connect");

        assert!(path.exists(), "database file should be created");
        pool.close().await;
    }
}
