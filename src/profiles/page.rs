use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    AppResult, AppState,
    auth::MaybeAdmin,
    config::Config,
    include_res,
    res::{self, escape, fill, markdown},
};

use super::{Profile, seo::SeoMeta, store};

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    Path(slug): Path<String>,
    MaybeAdmin(is_admin): MaybeAdmin,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
) -> AppResult<Response> {
    let mut conn = db_pool.acquire().await?;

    let Some(profile) = store::fetch_by_slug(&mut conn, &slug).await? else {
        return res::sorry("profile");
    };
    if !is_admin && !profile.is_public() {
        return res::sorry("profile");
    }

    Ok(Html(render(&profile, &config.public_base_url)).into_response())
}

pub(crate) fn render(profile: &Profile, base_url: &str) -> String {
    let head = SeoMeta::for_profile(profile, base_url).render();

    let skills: String = profile
        .skill_list()
        .into_iter()
        .map(|skill| format!("<li class=\"chip\">{}</li>", escape(skill)))
        .collect();
    let achievements: String = profile
        .achievement_list()
        .into_iter()
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect();

    let photo = match &profile.profile_photo {
        Some(photo) => format!(
            "<img class=\"avatar\" src=\"{}\" alt=\"{}\">",
            escape(photo),
            escape(&profile.name)
        ),
        None => format!("<div class=\"avatar initials\">{}</div>", escape(&initials(&profile.name))),
    };

    let details = [
        ("Email", Some(profile.email.clone())),
        ("Phone", profile.phone.clone()),
        ("Location", profile.address.clone()),
        ("Age", profile.age.map(|age| age.to_string())),
    ]
    .into_iter()
    .filter_map(|(label, value)| Some(format!("<dt>{label}</dt><dd>{}</dd>", escape(&value?))))
    .collect::<String>();

    fill(
        include_res!(str, "/pages/profile.html"),
        &[
            ("head", &head),
            ("status_banner", &status_banner(profile)),
            ("photo", &photo),
            ("name", &escape(&profile.name)),
            ("profession", &escape(&profile.profession)),
            ("details", &details),
            ("skills", &skills),
            ("experience", &section("Experience", profile.experience.as_deref())),
            ("work_experience", &section("Work history", profile.work_experience.as_deref())),
            ("education", &section("Education", profile.education.as_deref())),
            ("achievements", &achievements),
        ],
    )
}

fn section(title: &str, body: Option<&str>) -> String {
    match body {
        Some(body) => format!("<section><h2>{title}</h2>{}</section>", markdown(body)),
        None => String::new(),
    }
}

/// Only admins ever see a non-public profile page.
fn status_banner(profile: &Profile) -> String {
    if profile.is_public() {
        return String::new();
    }
    format!(
        "<p class=\"banner\">This profile is {} and not visible to the public.</p>",
        profile.status
    )
}

pub(crate) fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
