//! HMAC-signed cookie sessions.
//!
//! The cookie value is `{steamid}.{expiry}.{mac}` where `mac` is the hex
//! HMAC-SHA256 of `{steamid}.{expiry}` under the configured secret.
//! Verification is constant-time. No server-side session store.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

/// Half a year, matching the original site's session lifetime.
const SESSION_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60 / 2;

#[derive(Clone)]
pub struct Sessions {
    name: String,
    secret: Vec<u8>,
}

impl Sessions {
    pub fn new(cfg: &Config) -> Self {
        Self {
            name: cfg.session_name.clone(),
            secret: cfg.session_secret.as_bytes().to_vec(),
        }
    }

    /// Set-Cookie header value establishing a session for `steamid`.
    pub fn issue(&self, steamid: &str) -> String {
        let expires = Utc::now().timestamp() + SESSION_MAX_AGE_SECS;
        let value = self.sign(steamid, expires);
        format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            self.name, value, SESSION_MAX_AGE_SECS
        )
    }

    /// Set-Cookie header value clearing the session.
    pub fn clear(&self) -> String {
        format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", self.name)
    }

    /// Steamid of the authenticated session, if the Cookie header carries a
    /// valid one.
    pub fn verify_header(&self, cookie_header: &str) -> Option<String> {
        cookie_header
            .split(';')
            .filter_map(|part| part.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .and_then(|(_, value)| self.verify(value))
    }

    fn sign(&self, steamid: &str, expires: i64) -> String {
        let payload = format!("{steamid}.{expires}");
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(payload.as_bytes());
        let tag = hex::encode(mac.finalize().into_bytes());
        format!("{payload}.{tag}")
    }

    fn verify(&self, value: &str) -> Option<String> {
        let mut parts = value.split('.');
        let (steamid, expires, tag) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let expires: i64 = expires.parse().ok()?;
        if expires <= Utc::now().timestamp() {
            return None;
        }

        let payload = format!("{steamid}.{expires}");
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        let provided = hex::decode(tag).ok()?;
        if provided.ct_eq(expected.as_slice()).into() {
            Some(steamid.to_string())
        } else {
            None
        }
    }
}
