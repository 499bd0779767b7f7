use axum::{
    Json, debug_handler,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};

use crate::{AppResult, auth::Admin, profiles::store};

use super::{ActivityEntry, Status, activity};

#[derive(Deserialize)]
pub(crate) struct ActivityQuery {
    limit: Option<i64>,
    profile: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn activity(
    _: Admin,
    State(db_pool): State<SqlitePool>,
    Query(ActivityQuery { limit, profile }): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    let mut conn = db_pool.acquire().await?;

    let entries = match profile {
        Some(profile_id) => activity::for_profile(&mut conn, &profile_id).await?,
        None => activity::recent(&mut conn, limit.unwrap_or(activity::DEFAULT_LIMIT)).await?,
    };

    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
pub(crate) struct Analytics {
    pending: i64,
    verified: i64,
    rejected: i64,
    today: i64,
    week: i64,
    month: i64,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn analytics(
    _: Admin,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Analytics>> {
    let mut conn = db_pool.acquire().await?;
    let counts = store::status_counts(&mut conn).await?;
    let now = OffsetDateTime::now_utc();

    Ok(Json(Analytics {
        pending: counts.get(Status::Pending),
        verified: counts.get(Status::Verified),
        rejected: counts.get(Status::Rejected),
        today: store::count_created_since(&mut conn, now - Duration::days(1)).await?,
        week: store::count_created_since(&mut conn, now - Duration::weeks(1)).await?,
        month: store::count_created_since(&mut conn, now - Duration::days(30)).await?,
    }))
}
