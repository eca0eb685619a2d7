use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use crate::errors::DownstreamError;
use crate::upstream::token::AccessToken;

/// The data API's in-band marker for "the query failed". Preserved for
/// compatibility with existing consumers of that API; inside this crate it
/// is immediately lifted into [`DownstreamError::BadQuery`].
pub const QUERY_FAILED_SENTINEL: &str = "-1";

/// One authenticated call against the data API. Transient, built per
/// operation by the aggregator.
#[derive(Debug, Clone)]
pub struct DownstreamRequest {
    pub method: reqwest::Method,
    pub path: String,
    pub body: Option<Value>,
}

impl DownstreamRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: reqwest::Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: reqwest::Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// HTTP client for the data API. Stateless per invocation; the inner
/// `reqwest` client is shared read-only across request pipelines and
/// carries the configured timeout.
#[derive(Clone)]
pub struct DataApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl DataApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    /// Issue the call and classify the outcome.
    ///
    /// - network error or non-2xx → `AuthOrTransport`
    /// - body equal to the `"-1"` sentinel → `BadQuery` (checked before
    ///   JSON parsing; the sentinel is itself valid JSON)
    /// - body that does not parse as JSON → `MalformedResponse`
    /// - otherwise the parsed payload
    pub async fn call(
        &self,
        request: &DownstreamRequest,
        token: &AccessToken,
    ) -> Result<Value, DownstreamError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(AUTHORIZATION, token.header_value());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            tracing::warn!(path = %request.path, "data API call failed: {}", e);
            DownstreamError::AuthOrTransport
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(path = %request.path, %status, "data API rejected the call");
            return Err(DownstreamError::AuthOrTransport);
        }

        let body = resp
            .text()
            .await
            .map_err(|_| DownstreamError::AuthOrTransport)?;

        if body == QUERY_FAILED_SENTINEL {
            return Err(DownstreamError::BadQuery);
        }

        serde_json::from_str(&body).map_err(|_| {
            tracing::warn!(path = %request.path, "data API returned non-JSON body");
            DownstreamError::MalformedResponse
        })
    }
}
