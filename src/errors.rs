use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Token exchange failures (client-credentials grant).
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token endpoint unreachable")]
    Unreachable(#[source] reqwest::Error),

    #[error("token endpoint returned a malformed envelope")]
    MalformedResponse,
}

/// Failures of a single data-API call.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("data API unreachable or rejected the request")]
    AuthOrTransport,

    #[error("data API signaled a failed query")]
    BadQuery,

    #[error("data API returned a body that is not valid JSON")]
    MalformedResponse,
}

/// An aggregator operation failed. Wraps exactly one lower-level error
/// together with the operation that produced it.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("{op}: {source}")]
    Token {
        op: &'static str,
        #[source]
        source: TokenError,
    },

    #[error("{op}: {source}")]
    Downstream {
        op: &'static str,
        #[source]
        source: DownstreamError,
    },
}

impl AggregateError {
    pub fn operation(&self) -> &'static str {
        match self {
            AggregateError::Token { op, .. } | AggregateError::Downstream { op, .. } => op,
        }
    }

    /// Stable machine-readable code, surfaced on the error page.
    pub fn code(&self) -> &'static str {
        match self {
            AggregateError::Token { source: TokenError::Unreachable(_), .. } => "token_unreachable",
            AggregateError::Token { source: TokenError::MalformedResponse, .. } => {
                "token_malformed_response"
            }
            AggregateError::Downstream { source: DownstreamError::AuthOrTransport, .. } => {
                "auth_or_transport"
            }
            AggregateError::Downstream { source: DownstreamError::BadQuery, .. } => "bad_query",
            AggregateError::Downstream { source: DownstreamError::MalformedResponse, .. } => {
                "malformed_response"
            }
        }
    }
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        let status = match &self {
            AggregateError::Token { .. } => StatusCode::BAD_GATEWAY,
            AggregateError::Downstream { source: DownstreamError::BadQuery, .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AggregateError::Downstream { .. } => StatusCode::BAD_GATEWAY,
        };

        tracing::error!(operation = self.operation(), code = self.code(), "{}", self);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "operation": self.operation(),
                "code": self.code(),
            }
        }));

        (status, body).into_response()
    }
}
