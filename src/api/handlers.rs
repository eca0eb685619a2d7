use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::upstream::client::QUERY_FAILED_SENTINEL;
use crate::api::ApiState;

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpsertUserRequest {
    pub alias: String,
    pub steamid: String,
    /// Avatar URLs, smallest first. The largest is stored.
    #[serde(default)]
    pub avatars: Vec<String>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// A query-level failure is reported in-band as "-1" with a 200 status;
/// transport-level problems keep their HTTP status. Consumers distinguish
/// the two.
fn query_failed(context: &str, err: anyhow::Error) -> Response {
    tracing::error!("{}: {}", context, err);
    QUERY_FAILED_SENTINEL.into_response()
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/authorized/ — reachability and auth probe.
pub async fn authorized() -> &'static str {
    tracing::info!("GET /api/authorized/");
    "AUTHORIZED"
}

/// GET /api/user/:steamid — player record plus their match history.
pub async fn get_user(
    State(state): State<Arc<ApiState>>,
    Path(steamid): Path<String>,
) -> Response {
    tracing::info!("GET /api/user/{}", steamid);

    let player = match state.db.get_player(&steamid).await {
        Ok(p) => p,
        Err(e) => return query_failed("get_user: player lookup", e),
    };
    let matches = match state.db.matches_for(&steamid).await {
        Ok(m) => m,
        Err(e) => return query_failed("get_user: match lookup", e),
    };

    Json(json!({ "player": player, "matches": matches })).into_response()
}

/// GET /api/matches/ — latest 100 matches globally.
pub async fn latest_matches(State(state): State<Arc<ApiState>>) -> Response {
    tracing::info!("GET /api/matches/");

    match state.db.latest_matches().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => query_failed("latest_matches", e),
    }
}

/// GET /api/matches/:steamid — latest 100 matches for one player.
pub async fn user_matches(
    State(state): State<Arc<ApiState>>,
    Path(steamid): Path<String>,
) -> Response {
    tracing::info!("GET /api/matches/{}", steamid);

    match state.db.matches_for(&steamid).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => query_failed("user_matches", e),
    }
}

/// GET /api/users/:page — 100 users offset by page * 100.
pub async fn users_page(State(state): State<Arc<ApiState>>, Path(page): Path<u32>) -> Response {
    tracing::info!("GET /api/users/{}", page);

    match state.db.users_page(page).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => query_failed("users_page", e),
    }
}

/// GET /api/top10/ — top 10 players by rating, descending.
pub async fn top10(State(state): State<Arc<ApiState>>) -> Response {
    tracing::info!("GET /api/top10/");

    match state.db.top10().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => query_failed("top10", e),
    }
}

/// POST /api/user/ — upsert a player record. "0" on success.
pub async fn upsert_user(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<UpsertUserRequest>,
) -> Response {
    tracing::info!("POST /api/user/ ({})", payload.steamid);

    let avatar = payload.avatars.last().map(String::as_str);
    match state
        .db
        .upsert_player(&payload.alias, &payload.steamid, avatar)
        .await
    {
        Ok(()) => "0".into_response(),
        Err(e) => query_failed("upsert_user", e),
    }
}

/// POST /api/users/search/ — users whose alias matches %query%.
pub async fn search_users(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<SearchRequest>,
) -> Response {
    tracing::info!("POST /api/users/search/");

    match state.db.search_players(&payload.query).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => query_failed("search_users", e),
    }
}
