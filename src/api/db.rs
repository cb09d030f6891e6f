use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use time::OffsetDateTime;

use super::err::PortalError;

pub mod calendar;
pub mod content;
pub mod dues;
pub mod results;
pub mod students;
pub mod table;

/// Opens the SQLite pool and applies pending migrations. Foreign keys are
/// switched on per connection; the cascade behaviour in the schema
/// depends on it.
pub async fn init_db(database_url: &str) -> Result<Pool<Sqlite>, PortalError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Timestamp bound into created_at/updated_at columns.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::{Pool, Sqlite};
    use tempfile::TempDir;

    /// Fresh file-backed database for one test. The directory guard must
    /// stay alive for as long as the pool is used.
    pub(crate) async fn test_pool() -> (TempDir, Pool<Sqlite>) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let pool = super::init_db(&url).await.expect("failed to init test db");
        (dir, pool)
    }
}
