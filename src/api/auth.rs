//! Bearer-JWT validation for the data API.
//!
//! Inbound calls carry an RS256 access token minted by the identity
//! provider's token endpoint. Validation:
//! 1. Pull the `kid` from the JWT header
//! 2. Fetch the provider's JWKS (cached in-memory, 1-hour TTL)
//! 3. Verify signature, expiry, audience, issuer
//!
//! `MGE_API_AUTH_DISABLED=true` skips the check for local development.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::config::Config;

/// JSON Web Key Set.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A single JSON Web Key. Only RSA keys are used here.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: Option<String>,
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    pub alg: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

struct CachedJwks {
    jwks: Jwks,
    fetched_at: chrono::DateTime<Utc>,
}

static JWKS_CACHE: Lazy<DashMap<String, CachedJwks>> = Lazy::new(DashMap::new);

const JWKS_CACHE_TTL_SECS: i64 = 3600; // 1 hour

/// Fetch the JWKS for the configured provider, with caching.
pub async fn get_jwks(jwks_uri: &str) -> anyhow::Result<Jwks> {
    if let Some(cached) = JWKS_CACHE.get(jwks_uri) {
        let age = Utc::now() - cached.fetched_at;
        if age < Duration::seconds(JWKS_CACHE_TTL_SECS) {
            return Ok(cached.jwks.clone());
        }
    }

    tracing::info!(jwks_uri = %jwks_uri, "Fetching JWKS keys");
    let resp = reqwest::get(jwks_uri).await?;
    let jwks: Jwks = resp.json().await?;

    JWKS_CACHE.insert(
        jwks_uri.to_string(),
        CachedJwks {
            jwks: jwks.clone(),
            fetched_at: Utc::now(),
        },
    );

    Ok(jwks)
}

/// Key ID from the JWT header, if any.
pub fn extract_kid(token: &str) -> Option<String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    use base64::Engine;
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header_bytes = engine.decode(parts[0]).ok()?;
    let header: serde_json::Value = serde_json::from_slice(&header_bytes).ok()?;
    header.get("kid").and_then(|v| v.as_str()).map(String::from)
}

/// Validate an access token against the configured JWKS, audience and
/// issuer. Returns the decoded claims.
pub async fn validate(token: &str, cfg: &Config) -> anyhow::Result<serde_json::Value> {
    let kid = extract_kid(token);
    let jwks = get_jwks(&cfg.jwks_uri).await?;

    let jwk = jwks
        .keys
        .iter()
        .filter(|k| k.kty == "RSA")
        .find(|k| match (&kid, &k.kid) {
            (Some(want), Some(have)) => want == have,
            // No kid on either side: fall back to the first RSA key.
            (None, _) => true,
            (Some(_), None) => false,
        })
        .ok_or_else(|| anyhow::anyhow!("no JWKS key matches the token's kid"))?;

    let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
        return Err(anyhow::anyhow!("JWKS key is missing RSA components"));
    };
    let key = DecodingKey::from_rsa_components(n, e)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&cfg.audience]);
    validation.set_issuer(&[&cfg.issuer]);

    let data = decode::<serde_json::Value>(token, &key, &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_kid_from_jwt() {
        use base64::Engine;
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256","kid":"api-key-1"}"#);
        let payload = engine.encode(r#"{"sub":"web@clients","exp":9999999999}"#);
        let token = format!("{}.{}.signature", header, payload);

        assert_eq!(extract_kid(&token), Some("api-key-1".to_string()));
    }

    #[test]
    fn extract_kid_missing() {
        use base64::Engine;
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(r#"{"alg":"RS256"}"#);
        let token = format!("{}.payload.signature", header);

        assert_eq!(extract_kid(&token), None);
    }

    #[test]
    fn extract_kid_rejects_garbage() {
        assert_eq!(extract_kid("not-a-jwt"), None);
    }
}
