#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Base URL of the data API as seen from the web tier.
    pub data_api_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: String,
    /// JWKS endpoint + issuer the data API validates inbound bearer JWTs against.
    pub jwks_uri: String,
    pub issuer: String,
    /// Skips JWT validation on the data API. Local development only.
    pub api_auth_disabled: bool,
    pub steam_api_key: String,
    /// Externally visible base URL of the web tier (OpenID realm / return_to).
    pub public_url: String,
    pub session_secret: String,
    pub session_name: String,
    /// Timeout applied to every outbound HTTP call (token endpoint, data API, Steam).
    /// Set via MGE_HTTP_TIMEOUT_SECS. Default: 10.
    pub http_timeout_secs: u64,
    /// Fallback token lifetime when the token endpoint omits `expires_in`.
    /// Set via MGE_TOKEN_TTL_SECS. Default: 300.
    pub token_ttl_secs: u64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let session_secret = std::env::var("MGE_SESSION_SECRET")
        .unwrap_or_else(|_| "CHANGE_ME_SESSION_SECRET".into());

    if session_secret == "CHANGE_ME_SESSION_SECRET" {
        let env_mode = std::env::var("MGE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "MGE_SESSION_SECRET is still the insecure placeholder. \
                 Set a proper secret before running in production."
            );
        }
        eprintln!("⚠️  MGE_SESSION_SECRET is not set — using insecure placeholder. Set a real secret for production.");
    }

    Ok(Config {
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/mgestats".into()),
        data_api_url: std::env::var("MGE_DATA_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into()),
        token_url: std::env::var("MGE_TOKEN_URL")
            .unwrap_or_else(|_| "https://mgestats.auth0.com/oauth/token".into()),
        client_id: std::env::var("MGE_CLIENT_ID").unwrap_or_default(),
        client_secret: std::env::var("MGE_CLIENT_SECRET").unwrap_or_default(),
        audience: std::env::var("MGE_AUDIENCE")
            .unwrap_or_else(|_| "https://api.mgestats".into()),
        jwks_uri: std::env::var("MGE_JWKS_URI")
            .unwrap_or_else(|_| "https://mgestats.auth0.com/.well-known/jwks.json".into()),
        issuer: std::env::var("MGE_ISSUER")
            .unwrap_or_else(|_| "https://mgestats.auth0.com/".into()),
        api_auth_disabled: std::env::var("MGE_API_AUTH_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        steam_api_key: std::env::var("MGE_STEAM_API_KEY").unwrap_or_default(),
        public_url: std::env::var("MGE_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into()),
        session_secret,
        session_name: std::env::var("MGE_SESSION_NAME").unwrap_or_else(|_| "mge_session".into()),
        http_timeout_secs: std::env::var("MGE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10),
        token_ttl_secs: std::env::var("MGE_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300),
    })
}
