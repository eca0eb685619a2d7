use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::store::PgStore;

pub mod auth;
pub mod handlers;

pub struct ApiState {
    pub db: PgStore,
    pub config: Config,
}

/// Build the data-API router. Responses are JSON on success or the literal
/// string "-1" on query failure, the wire contract existing consumers
/// depend on.
pub fn api_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/authorized/", get(handlers::authorized))
        .route("/api/user/:steamid", get(handlers::get_user))
        .route("/api/user/", post(handlers::upsert_user))
        .route("/api/matches/", get(handlers::latest_matches))
        .route("/api/matches/:steamid", get(handlers::user_matches))
        .route("/api/users/:page", get(handlers::users_page))
        .route("/api/users/search/", post(handlers::search_users))
        .route("/api/top10/", get(handlers::top10))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
        .with_state(state)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: validates the inbound bearer JWT against the configured
/// JWKS. Returns 401 on a missing or invalid token.
async fn require_auth(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.api_auth_disabled {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        tracing::warn!("data API: missing bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match auth::validate(token, &state.config).await {
        Ok(_claims) => Ok(next.run(req).await),
        Err(e) => {
            tracing::warn!("data API: token rejected: {}", e);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
