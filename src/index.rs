use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{
    AppResult, AppState,
    moderation::Status,
    profiles::{Profile, api::ListParams, page::initials, store},
    include_res,
    res::{escape, fill},
};

const CARD_SKILLS: usize = 4;

/// Public listing of verified profiles.
#[debug_handler(state = AppState)]
pub async fn index(
    State(db_pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let mut query = ListParams {
        limit: None,
        status: None,
        ..params
    }
    .into_query();
    query.status = Some(Status::Verified);

    let mut conn = db_pool.acquire().await?;
    let page = store::list(&mut conn, &query).await?;
    let page_count = page.page_count(query.limit);

    let cards: String = page.profiles.iter().map(card).collect();
    let cards = if cards.is_empty() {
        "<p class=\"empty\">No profiles found.</p>".to_owned()
    } else {
        cards
    };

    let search = query.search.as_deref().unwrap_or_default();
    let summary = match query.search.as_deref() {
        Some(search) => format!("{} result(s) for “{}”", page.total, escape(search)),
        None => format!("{} profile(s)", page.total),
    };

    Ok(Html(fill(
        include_res!(str, "/pages/index.html"),
        &[
            ("search", &escape(search)),
            ("summary", &summary),
            ("cards", &cards),
            ("pagination", &pagination(query.page, page_count, search)),
        ],
    ))
    .into_response())
}

fn card(profile: &Profile) -> String {
    let photo = match &profile.profile_photo {
        Some(photo) => format!("<img src=\"{}\" alt=\"\">", escape(photo)),
        None => format!("<span class=\"initials\">{}</span>", escape(&initials(&profile.name))),
    };
    let skills: String = profile
        .skill_list()
        .into_iter()
        .take(CARD_SKILLS)
        .map(|skill| format!("<li class=\"chip\">{}</li>", escape(skill)))
        .collect();

    fill(
        include_res!(str, "/pages/profile_card.html"),
        &[
            ("slug", &profile.slug),
            ("photo", &photo),
            ("name", &escape(&profile.name)),
            ("profession", &escape(&profile.profession)),
            ("skills", &skills),
        ],
    )
}

/// Prev/next as GET forms so the search text needs no URL encoding.
fn pagination(page: u32, page_count: i64, search: &str) -> String {
    if page_count <= 1 {
        return String::new();
    }

    let button = |label: &str, target: u32| {
        format!(
            "<form method=\"get\" action=\"/\"><input type=\"hidden\" name=\"search\" value=\"{}\"><button name=\"page\" value=\"{target}\">{label}</button></form>",
            escape(search)
        )
    };

    let mut nav = String::from("<nav class=\"pagination\">");
    if page > 1 {
        nav.push_str(&button("‹ Previous", page - 1));
    }
    nav.push_str(&format!("<span>Page {page} of {page_count}</span>"));
    if i64::from(page) < page_count {
        nav.push_str(&button("Next ›", page + 1));
    }
    nav.push_str("</nav>");
    nav
}
