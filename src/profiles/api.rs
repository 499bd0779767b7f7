use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    AppError, AppResult, AppState,
    appresult::FieldError,
    auth::{Admin, MaybeAdmin},
    moderation::Status,
    uploads::{PhotoKind, PhotoStore, PhotoUpload},
};

use super::{
    Profile, ProfileSubmission, service,
    store::{self, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, ProfilePage, ProfileQuery},
};

/// Raw query string. Anything unparsable falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    pub(crate) page: Option<String>,
    pub(crate) limit: Option<String>,
    pub(crate) search: Option<String>,
    pub(crate) status: Option<String>,
}

impl ListParams {
    pub(crate) fn into_query(self) -> ProfileQuery {
        let positive = |value: Option<String>| {
            value
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
        };

        ProfileQuery {
            page: positive(self.page).unwrap_or(1),
            limit: positive(self.limit)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
            search: self.search.filter(|s| !s.trim().is_empty()),
            status: self
                .status
                .filter(|s| !s.trim().is_empty())
                .and_then(|s| s.parse().ok()),
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn list(
    MaybeAdmin(is_admin): MaybeAdmin,
    State(db_pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ProfilePage>> {
    let mut query = params.into_query();
    if !is_admin {
        query.status = Some(Status::Verified);
    }

    let mut conn = db_pool.acquire().await?;
    Ok(Json(store::list(&mut conn, &query).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn show(
    Path(slug): Path<String>,
    MaybeAdmin(is_admin): MaybeAdmin,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Profile>> {
    let mut conn = db_pool.acquire().await?;

    match store::fetch_by_slug(&mut conn, &slug).await? {
        Some(profile) if is_admin || profile.is_public() => Ok(Json(profile)),
        _ => Err(AppError::NotFound("Profile")),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    State(photos): State<PhotoStore>,
    ProfileSubmission { fields, photo }: ProfileSubmission,
) -> AppResult<(StatusCode, Json<Profile>)> {
    let (mut new, photo) = collect_errors(fields.into_new_profile(), check_photo(&photos, photo))?;

    let stored = match photo {
        Some((upload, kind)) => Some(photos.save(&upload.bytes, kind).await?),
        None => None,
    };
    new.profile_photo = stored.clone();

    match service::submit(&db_pool, new).await {
        Ok(profile) => Ok((StatusCode::CREATED, Json(profile))),
        Err(e) => {
            if let Some(path) = stored {
                photos.discard(&path).await;
            }
            Err(e)
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn update(
    _: Admin,
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(photos): State<PhotoStore>,
    ProfileSubmission { fields, photo }: ProfileSubmission,
) -> AppResult<Json<Profile>> {
    let (mut patch, photo) = collect_errors(fields.into_patch(), check_photo(&photos, photo))?;

    let stored = match photo {
        Some((upload, kind)) => Some(photos.save(&upload.bytes, kind).await?),
        None => None,
    };
    if let Some(path) = &stored {
        patch.profile_photo = Some(Some(path.clone()));
    }

    match service::edit(&db_pool, &id, patch).await {
        Ok(edited) => {
            if let Some(old) = edited.stale_photo {
                photos.discard(&old).await;
            }
            Ok(Json(edited.profile))
        }
        Err(e) => {
            if let Some(path) = stored {
                photos.discard(&path).await;
            }
            Err(e)
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove(
    _: Admin,
    Path(id): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(photos): State<PhotoStore>,
) -> AppResult<Json<Value>> {
    let Some(profile) = service::remove(&db_pool, &id).await? else {
        return Err(AppError::NotFound("Profile"));
    };

    if let Some(photo) = &profile.profile_photo {
        photos.discard(photo).await;
    }

    Ok(Json(json!({ "message": "Profile deleted successfully" })))
}

fn check_photo(
    photos: &PhotoStore,
    photo: Option<PhotoUpload>,
) -> Result<Option<(PhotoUpload, PhotoKind)>, Vec<FieldError>> {
    match photo {
        None => Ok(None),
        Some(upload) => match photos.check(&upload) {
            Ok(kind) => Ok(Some((upload, kind))),
            Err(e) => Err(vec![e]),
        },
    }
}

/// Reports field and photo problems together.
fn collect_errors<A, B>(
    a: Result<A, Vec<FieldError>>,
    b: Result<B, Vec<FieldError>>,
) -> AppResult<(A, B)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => {
            let mut errors = a.err().unwrap_or_default();
            errors.extend(b.err().unwrap_or_default());
            Err(AppError::Invalid(errors))
        }
    }
}
