use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::errors::TokenError;

/// Static service credential for the client-credentials grant. Loaded once
/// from config, never mutated.
#[derive(Debug, Clone)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
    pub token_url: String,
}

impl Credential {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            audience: cfg.audience.clone(),
            token_url: cfg.token_url.clone(),
        }
    }

    fn cache_key(&self) -> String {
        format!("{}@{}", self.client_id, self.audience)
    }
}

/// A bearer token usable against the data API. Never persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    token_type: String,
    access_token: String,
}

impl AccessToken {
    pub fn new(token_type: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: access_token.into(),
        }
    }

    /// The Authorization header value, exactly as the token endpoint
    /// shaped it: `"{token_type} {access_token}"`.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Expected shape of the token endpoint's success body. Fields are optional
/// so a missing one classifies as a malformed envelope rather than a serde
/// type error.
#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token_type: Option<String>,
    access_token: Option<String>,
    expires_in: Option<u64>,
}

struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

/// Exchanges the service credential for bearer tokens.
///
/// Tokens are cached per credential until their advertised expiry (or the
/// configured fallback TTL when the endpoint omits `expires_in`). The
/// aggregator invalidates the cache whenever a downstream call fails with
/// an auth/transport error, forcing a fresh exchange on the next operation.
/// No retries, no backoff: one POST per cache miss.
pub struct TokenProvider {
    http: reqwest::Client,
    credential: Credential,
    cache: DashMap<String, CachedToken>,
    fallback_ttl: Duration,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, credential: Credential, fallback_ttl: Duration) -> Self {
        Self {
            http,
            credential,
            cache: DashMap::new(),
            fallback_ttl,
        }
    }

    /// A valid bearer token for the data API, from cache or via a fresh
    /// exchange.
    pub async fn acquire(&self) -> Result<AccessToken, TokenError> {
        let key = self.credential.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            if Instant::now() < cached.expires_at {
                return Ok(cached.token.clone());
            }
            drop(cached);
            self.cache.remove(&key);
        }

        let (token, ttl) = self.exchange().await?;
        self.cache.insert(
            key,
            CachedToken {
                token: token.clone(),
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(token)
    }

    /// Drop the cached token so the next operation re-exchanges. Called on
    /// auth/transport failures from downstream calls.
    pub fn invalidate(&self) {
        self.cache.remove(&self.credential.cache_key());
    }

    async fn exchange(&self) -> Result<(AccessToken, Duration), TokenError> {
        let body = json!({
            "client_id": self.credential.client_id,
            "client_secret": self.credential.client_secret,
            "audience": self.credential.audience,
            "grant_type": "client_credentials",
        });

        let resp = self
            .http
            .post(&self.credential.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("token exchange failed: {}", e);
                TokenError::Unreachable(e)
            })?;

        let envelope: TokenEnvelope = resp
            .json()
            .await
            .map_err(|_| TokenError::MalformedResponse)?;

        let (Some(token_type), Some(access_token)) = (envelope.token_type, envelope.access_token)
        else {
            return Err(TokenError::MalformedResponse);
        };

        let ttl = envelope
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(self.fallback_ttl);

        Ok((
            AccessToken {
                token_type,
                access_token,
            },
            ttl,
        ))
    }
}
