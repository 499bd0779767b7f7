//! Queries over the `profiles` table.
//!
//! Everything takes a `&mut SqliteConnection` so the same calls work on a
//! pooled connection or inside a transaction.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db::timestamp, moderation::Status};

use super::{NewProfile, Profile, ProfilePatch};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

const COLUMNS: &str = "id,name,email,phone,address,age,profession,experience,skills,education,work_experience,achievements,profile_photo,slug,status,created_at";

/// `name` folded with Rust's Unicode lowercasing. SQLite's `LOWER` and
/// `LIKE` only fold ASCII, so search matches against this column instead.
fn name_search(name: &str) -> String {
    name.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub status: Option<Status>,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
        }
    }
}

impl ProfileQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.limit)
    }

    /// `LIKE` pattern for the name search, wildcards in the input escaped.
    fn search_pattern(&self) -> Option<String> {
        let search = self.search.as_deref()?.trim();
        if search.is_empty() {
            return None;
        }

        let mut pattern = String::with_capacity(search.len() + 2);
        pattern.push('%');
        for c in name_search(search).chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1=1");
        if let Some(pattern) = self.search_pattern() {
            qb.push(" AND name_search LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub profiles: Vec<Profile>,
    pub total: i64,
}

impl ProfilePage {
    pub fn page_count(&self, limit: u32) -> i64 {
        let limit = i64::from(limit.max(1));
        (self.total + limit - 1) / limit
    }
}

#[derive(Debug, Default)]
pub struct StatusCounts(HashMap<Status, i64>);

impl StatusCounts {
    pub fn get(&self, status: Status) -> i64 {
        self.0.get(&status).copied().unwrap_or(0)
    }
}

async fn fetch_by(
    conn: &mut SqliteConnection,
    column: &'static str,
    value: &str,
) -> Result<Option<Profile>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
    qb.push(COLUMNS)
        .push(" FROM profiles WHERE ")
        .push(column)
        .push("=")
        .push_bind(value);
    qb.build_query_as().fetch_optional(&mut *conn).await
}

pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<Profile>, sqlx::Error> {
    fetch_by(conn, "id", id).await
}

pub async fn fetch_by_slug(conn: &mut SqliteConnection, slug: &str) -> Result<Option<Profile>, sqlx::Error> {
    fetch_by(conn, "slug", slug).await
}

/// Email comparison is case-insensitive (the column is `COLLATE NOCASE`).
pub async fn fetch_by_email(conn: &mut SqliteConnection, email: &str) -> Result<Option<Profile>, sqlx::Error> {
    fetch_by(conn, "email", email).await
}

/// Stored slugs that could collide with `base` or one of its numbered
/// variants.
pub async fn slug_family(conn: &mut SqliteConnection, base: &str) -> Result<HashSet<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT slug FROM profiles WHERE slug=? OR slug LIKE ?")
        .bind(base)
        .bind(format!("{base}-%"))
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(|(slug,)| slug).collect())
}

/// Inserts a new `Pending` profile under `slug`.
pub async fn create(conn: &mut SqliteConnection, new: &NewProfile, slug: &str) -> Result<Profile, sqlx::Error> {
    let created_at = timestamp(OffsetDateTime::now_utc())?;

    let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO profiles (");
    qb.push(COLUMNS).push(",name_search) ");
    qb.push_values([new], |mut row, new| {
        row.push_bind(Uuid::now_v7().to_string())
            .push_bind(&new.name)
            .push_bind(&new.email)
            .push_bind(&new.phone)
            .push_bind(&new.address)
            .push_bind(new.age)
            .push_bind(&new.profession)
            .push_bind(&new.experience)
            .push_bind(&new.skills)
            .push_bind(&new.education)
            .push_bind(&new.work_experience)
            .push_bind(&new.achievements)
            .push_bind(&new.profile_photo)
            .push_bind(slug)
            .push_bind(Status::Pending)
            .push_bind(created_at.clone())
            .push_bind(name_search(&new.name));
    });
    qb.push(" RETURNING ").push(COLUMNS);

    qb.build_query_as().fetch_one(&mut *conn).await
}

/// Newest first, plus the total number of matches for paging.
pub async fn list(conn: &mut SqliteConnection, query: &ProfileQuery) -> Result<ProfilePage, sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM profiles");
    query.push_filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT ");
    select.push(COLUMNS).push(" FROM profiles");
    query.push_filters(&mut select);
    select
        .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
        .push_bind(i64::from(query.limit))
        .push(" OFFSET ")
        .push_bind(query.offset());
    let profiles = select.build_query_as().fetch_all(&mut *conn).await?;

    Ok(ProfilePage { profiles, total })
}

macro_rules! set_column {
    ($set:ident, $column:literal, $value:expr) => {
        if let Some(value) = $value {
            $set.push(concat!($column, "="));
            $set.push_bind_unseparated(value);
        }
    };
}

/// Writes whichever fields `patch` carries. `None` if there is no such id.
pub async fn update(
    conn: &mut SqliteConnection,
    id: &str,
    patch: &ProfilePatch,
) -> Result<Option<Profile>, sqlx::Error> {
    if patch.is_empty() {
        return fetch_by_id(conn, id).await;
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE profiles SET ");
    {
        let mut set = qb.separated(",");
        set_column!(set, "name", &patch.name);
        set_column!(set, "name_search", patch.name.as_deref().map(name_search));
        set_column!(set, "email", &patch.email);
        set_column!(set, "phone", &patch.phone);
        set_column!(set, "address", &patch.address);
        set_column!(set, "age", patch.age);
        set_column!(set, "profession", &patch.profession);
        set_column!(set, "experience", &patch.experience);
        set_column!(set, "skills", &patch.skills);
        set_column!(set, "education", &patch.education);
        set_column!(set, "work_experience", &patch.work_experience);
        set_column!(set, "achievements", &patch.achievements);
        set_column!(set, "profile_photo", &patch.profile_photo);
        set_column!(set, "status", patch.status);
    }
    qb.push(" WHERE id=").push_bind(id);
    qb.push(" RETURNING ").push(COLUMNS);

    qb.build_query_as().fetch_optional(&mut *conn).await
}

pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM profiles WHERE id=?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn status_counts(conn: &mut SqliteConnection) -> Result<StatusCounts, sqlx::Error> {
    let rows: Vec<(Status, i64)> = sqlx::query_as("SELECT status,COUNT(*) FROM profiles GROUP BY status")
        .fetch_all(&mut *conn)
        .await?;
    Ok(StatusCounts(rows.into_iter().collect()))
}

pub async fn count_created_since(
    conn: &mut SqliteConnection,
    since: OffsetDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE created_at >= ?")
        .bind(timestamp(since)?)
        .fetch_one(&mut *conn)
        .await
}
