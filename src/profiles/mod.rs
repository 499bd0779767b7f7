pub(crate) mod api;
mod form;
mod model;
pub(crate) mod page;
pub mod seo;
pub mod service;
pub mod slug;
pub mod store;

use axum::{Router, routing::get};

use crate::AppState;

pub use form::{ProfileSubmission, RawFields};
pub use model::{NewProfile, Profile, ProfilePatch};

/// JSON routes, mounted under `/api`. Reads go by slug, writes by id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles", get(api::list).post(api::create))
        .route(
            "/profiles/{key}",
            get(api::show).put(api::update).delete(api::remove),
        )
}

/// Server-rendered profile pages.
pub fn pages() -> Router<AppState> {
    Router::new().route("/profile/{slug}", get(page::profile))
}
