use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use time::{OffsetDateTime, UtcOffset, macros::format_description};
use tracing::info;

use crate::{config::Config, include_res};

/// How long a writer waits for another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("parsing {}", config.database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("connecting to {}", config.database_url))?;

    init_schema(&db_pool).await.context("applying schema")?;
    info!("database ready");

    Ok(db_pool)
}

/// Creates the tables if they are missing. Safe to run on every start.
pub async fn init_schema(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_res!(str, "/schema.sql"))
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Takes the write lock up front. A deferred transaction that reads first
/// cannot wait for the lock when it later writes; it fails with
/// `SQLITE_BUSY` at once.
pub async fn begin_write(db_pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    db_pool.begin_with("BEGIN IMMEDIATE").await
}

/// Fixed-width UTC text, so comparing stored timestamps as strings agrees
/// with comparing them as times.
pub fn timestamp(at: OffsetDateTime) -> Result<String, sqlx::Error> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
        ))
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}
