//! The single admin login. The flag lives in the server-side session, so
//! every admin route checks it on the server.

use anyhow::anyhow;
use axum::{
    Json, Router, debug_handler,
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{AppError, AppResult, AppState, config::Config, session::IS_ADMIN};

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

/// Extracts only when the session belongs to a logged-in admin.
pub struct Admin;

/// Whether the session belongs to a logged-in admin.
pub struct MaybeAdmin(pub bool);

impl<S> FromRequestParts<S> for MaybeAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(anyhow!(msg)))?;

        Ok(MaybeAdmin(session.get::<bool>(IS_ADMIN).await?.unwrap_or(false)))
    }
}

impl<S> FromRequestParts<S> for Admin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match MaybeAdmin::from_request_parts(parts, state).await? {
            MaybeAdmin(true) => Ok(Admin),
            MaybeAdmin(false) => Err(AppError::Unauthorized),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(whoami))
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(config): State<Arc<Config>>,
    session: Session,
    Json(LoginRequest { username, password }): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    let Some(expected) = config.admin_password.as_deref() else {
        warn!("admin login attempted but ADMIN_PASSWORD is not set");
        return Err(AppError::Unauthorized);
    };

    if username != config.admin_username || password != expected {
        warn!("failed admin login for {username:?}");
        return Err(AppError::Unauthorized);
    }

    session.cycle_id().await?;
    session.insert(IS_ADMIN, true).await?;
    info!("admin logged in");

    Ok(Json(json!({ "isAdmin": true })))
}

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Json<Value>> {
    session.flush().await?;
    Ok(Json(json!({ "isAdmin": false })))
}

#[debug_handler]
pub(crate) async fn whoami(MaybeAdmin(is_admin): MaybeAdmin) -> Json<Value> {
    Json(json!({ "isAdmin": is_admin }))
}
