use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header::{COOKIE, SET_COOKIE},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};

use crate::errors::AggregateError;
use crate::models::view::ViewModel;
use crate::web::WebState;

type PageResult = Result<Json<ViewModel>, AggregateError>;

fn session_steamid(state: &WebState, headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| state.sessions.verify_header(cookies))
}

// ── Pages ────────────────────────────────────────────────────

/// GET / — front page: the most recent matches.
pub async fn home(State(state): State<Arc<WebState>>) -> PageResult {
    Ok(Json(state.aggregator.latest_matches().await?))
}

/// GET /user/me — the authenticated player's own profile.
pub async fn user_me(State(state): State<Arc<WebState>>, headers: HeaderMap) -> Response {
    match session_steamid(&state, &headers) {
        Some(steamid) => match state.aggregator.user_profile(&steamid).await {
            Ok(view) => Json(view).into_response(),
            Err(e) => e.into_response(),
        },
        None => Redirect::to("/auth/steam").into_response(),
    }
}

/// GET /user/:steamid — any player's profile.
pub async fn user_page(
    State(state): State<Arc<WebState>>,
    Path(steamid): Path<String>,
) -> PageResult {
    Ok(Json(state.aggregator.user_profile(&steamid).await?))
}

/// GET /matches — latest matches globally.
pub async fn latest_matches(State(state): State<Arc<WebState>>) -> PageResult {
    Ok(Json(state.aggregator.latest_matches().await?))
}

/// GET /matches/:steamid — one player's match history.
pub async fn user_matches(
    State(state): State<Arc<WebState>>,
    Path(steamid): Path<String>,
) -> PageResult {
    Ok(Json(state.aggregator.user_matches(&steamid).await?))
}

/// GET /users/:page — user directory page.
pub async fn users_page(State(state): State<Arc<WebState>>, Path(page): Path<u32>) -> PageResult {
    Ok(Json(state.aggregator.all_users(page).await?))
}

/// GET /top10 — the leaderboard.
pub async fn top10(State(state): State<Arc<WebState>>) -> PageResult {
    Ok(Json(state.aggregator.top().await?))
}

// ── Auth flow ────────────────────────────────────────────────

/// GET /auth/steam — send the browser to the identity provider.
pub async fn auth_steam(State(state): State<Arc<WebState>>) -> Redirect {
    Redirect::to(&state.steam.login_url())
}

/// GET /auth/steam/return — verify the provider's response, link the
/// account, establish a session. Verification failures bounce back to the
/// front page, as the original flow did.
pub async fn auth_steam_return(
    State(state): State<Arc<WebState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let steamid = match state.steam.verify_return(&params).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("steam login verification failed: {}", e);
            return Redirect::to("/").into_response();
        }
    };

    let profile = match state.steam.fetch_profile(&steamid).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("steam profile fetch failed for {}: {}", steamid, e);
            return Redirect::to("/").into_response();
        }
    };

    if let Err(e) = state.aggregator.link_account(&profile).await {
        return e.into_response();
    }

    tracing::info!(steamid = %steamid, "player logged in");
    let cookie = state.sessions.issue(&steamid);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to("/user/me"),
    )
        .into_response()
}

/// GET /logout — clear the session.
pub async fn logout(State(state): State<Arc<WebState>>) -> Response {
    (
        AppendHeaders([(SET_COOKIE, state.sessions.clear())]),
        Redirect::to("/"),
    )
        .into_response()
}
