//! Store calls that must happen together: uniqueness checks, slug
//! assignment, status transitions and their activity entries.

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    AppError, AppResult,
    appresult::EMAIL_TAKEN,
    db,
    moderation::activity::{self, Action},
};

use super::{NewProfile, Profile, ProfilePatch, slug, store};

const SLUG_RACE: &str = "A profile with this name was created at the same time, please submit again";

/// Result of a successful edit.
#[derive(Debug)]
pub struct Edited {
    pub profile: Profile,
    /// Photo the edit replaced or cleared; the caller removes the file.
    pub stale_photo: Option<String>,
}

pub async fn submit(db_pool: &SqlitePool, new: NewProfile) -> AppResult<Profile> {
    let mut tx = db::begin_write(db_pool).await?;

    if store::fetch_by_email(&mut tx, &new.email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_owned()));
    }

    let base = slug::base_slug(&new.name);
    let taken = store::slug_family(&mut tx, &base).await?;
    let slug = slug::next_free_slug(&base, &taken);

    let profile = store::create(&mut tx, &new, &slug)
        .await
        .map_err(unique_violation)?;
    activity::record(&mut tx, &profile, Action::Created).await?;
    tx.commit().await?;

    info!("new profile {} ({})", profile.slug, profile.id);
    Ok(profile)
}

pub async fn edit(db_pool: &SqlitePool, id: &str, patch: ProfilePatch) -> AppResult<Edited> {
    let mut tx = db::begin_write(db_pool).await?;

    let Some(current) = store::fetch_by_id(&mut tx, id).await? else {
        return Err(AppError::NotFound("Profile"));
    };

    let transition = match patch.status {
        Some(next) => current.status.transition(next).map_err(|e| AppError::Invalid(vec![e]))?,
        None => None,
    };

    if let Some(email) = &patch.email {
        if let Some(owner) = store::fetch_by_email(&mut tx, email).await? {
            if owner.id != current.id {
                return Err(AppError::Conflict(EMAIL_TAKEN.to_owned()));
            }
        }
    }

    let profile = store::update(&mut tx, id, &patch)
        .await
        .map_err(unique_violation)?
        .ok_or(AppError::NotFound("Profile"))?;

    if patch.touches_fields() {
        activity::record(&mut tx, &profile, Action::Updated).await?;
    }
    if let Some(action) = transition {
        activity::record(&mut tx, &profile, action).await?;
        info!("profile {} is now {}", profile.id, profile.status);
    }
    tx.commit().await?;

    let stale_photo = match patch.profile_photo {
        Some(_) => current.profile_photo.filter(|old| Some(old) != profile.profile_photo.as_ref()),
        None => None,
    };

    Ok(Edited { profile, stale_photo })
}

/// Deletes the profile and returns what was removed, `None` if the id is
/// unknown.
pub async fn remove(db_pool: &SqlitePool, id: &str) -> AppResult<Option<Profile>> {
    let mut tx = db::begin_write(db_pool).await?;

    let Some(profile) = store::fetch_by_id(&mut tx, id).await? else {
        return Ok(None);
    };
    if !store::delete(&mut tx, id).await? {
        return Ok(None);
    }
    activity::record(&mut tx, &profile, Action::Deleted).await?;
    tx.commit().await?;

    info!("deleted profile {} ({})", profile.slug, profile.id);
    Ok(Some(profile))
}

/// A UNIQUE failure here means another request won the check-then-insert
/// race.
fn unique_violation(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            if db_err.message().contains("email") {
                AppError::Conflict(EMAIL_TAKEN.to_owned())
            } else {
                AppError::Conflict(SLUG_RACE.to_owned())
            }
        }
        _ => err.into(),
    }
}
