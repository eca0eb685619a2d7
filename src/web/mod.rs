use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::aggregator::Aggregator;
use crate::auth::{Sessions, SteamAuth};

pub mod handlers;

/// Shared state of the web tier. Collaborators are constructed once at
/// startup and injected; request pipelines share them read-only.
pub struct WebState {
    pub aggregator: Aggregator,
    pub steam: SteamAuth,
    pub sessions: Sessions,
}

/// Build the presentation router. Handlers return view models as JSON for
/// the view adapter; login routes drive the identity-provider redirect
/// flow.
pub fn web_router(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/user/me", get(handlers::user_me))
        .route("/user/:steamid", get(handlers::user_page))
        .route("/matches", get(handlers::latest_matches))
        .route("/matches/:steamid", get(handlers::user_matches))
        .route("/users/:page", get(handlers::users_page))
        .route("/top10", get(handlers::top10))
        .route("/auth/steam", get(handlers::auth_steam))
        .route("/auth/steam/return", get(handlers::auth_steam_return))
        .route("/logout", get(handlers::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
