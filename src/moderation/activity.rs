use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};
use time::OffsetDateTime;

use crate::{db::timestamp, profiles::Profile};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
pub enum Action {
    Created,
    Updated,
    Verified,
    Rejected,
    Deleted,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub profile_id: String,
    pub profile_name: String,
    pub action: Action,
    #[serde(rename = "timestamp", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn record(
    conn: &mut SqliteConnection,
    profile: &Profile,
    action: Action,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO activity (profile_id,profile_name,action,created_at) VALUES (?,?,?,?)")
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(action)
        .bind(timestamp(OffsetDateTime::now_utc())?)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Newest first.
pub async fn recent(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id,profile_id,profile_name,action,created_at FROM activity ORDER BY id DESC LIMIT ?",
    )
    .bind(limit.clamp(1, MAX_LIMIT))
    .fetch_all(&mut *conn)
    .await
}

pub async fn for_profile(
    conn: &mut SqliteConnection,
    profile_id: &str,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id,profile_id,profile_name,action,created_at FROM activity WHERE profile_id=? ORDER BY id",
    )
    .bind(profile_id)
    .fetch_all(&mut *conn)
    .await
}
