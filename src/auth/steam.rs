//! Steam OpenID 2.0 login flow.
//!
//! 1. Redirect the browser to the provider's `checkid_setup` endpoint
//! 2. On return, replay the signed parameters with
//!    `mode=check_authentication` and require `is_valid:true`
//! 3. Extract the steamid from `claimed_id` and fetch the player summary
//!
//! The aggregator consumes the resulting [`SteamProfile`]; nothing past
//! this module knows about the provider's wire protocol.

use std::collections::HashMap;

use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::models::profile::SteamProfile;

const OPENID_ENDPOINT: &str = "https://steamcommunity.com/openid/login";
const OPENID_NS: &str = "http://specs.openid.net/auth/2.0";
const IDENTIFIER_SELECT: &str = "http://specs.openid.net/auth/2.0/identifier_select";
const CLAIMED_ID_PREFIX: &str = "https://steamcommunity.com/openid/id/";
const PLAYER_SUMMARY_URL: &str =
    "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/";

pub struct SteamAuth {
    http: reqwest::Client,
    api_key: String,
    public_url: String,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    response: SummaryPlayers,
}

#[derive(Debug, Deserialize)]
struct SummaryPlayers {
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    steamid: String,
    personaname: String,
    avatar: Option<String>,
    avatarmedium: Option<String>,
    avatarfull: Option<String>,
}

impl SteamAuth {
    pub fn new(http: reqwest::Client, cfg: &Config) -> Self {
        Self {
            http,
            api_key: cfg.steam_api_key.clone(),
            public_url: cfg.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// The provider URL the browser is redirected to for login.
    pub fn login_url(&self) -> String {
        let return_to = format!("{}/auth/steam/return", self.public_url);
        let realm = format!("{}/", self.public_url);
        let url = Url::parse_with_params(
            OPENID_ENDPOINT,
            &[
                ("openid.ns", OPENID_NS),
                ("openid.mode", "checkid_setup"),
                ("openid.return_to", return_to.as_str()),
                ("openid.realm", realm.as_str()),
                ("openid.identity", IDENTIFIER_SELECT),
                ("openid.claimed_id", IDENTIFIER_SELECT),
            ],
        )
        .expect("static OpenID endpoint URL");
        url.into()
    }

    /// Verify the signed return parameters with the provider and extract
    /// the authenticated steamid.
    pub async fn verify_return(&self, params: &HashMap<String, String>) -> anyhow::Result<String> {
        if params.get("openid.mode").map(String::as_str) != Some("id_res") {
            anyhow::bail!("OpenID return is not an id_res response");
        }

        let claimed = params
            .get("openid.claimed_id")
            .ok_or_else(|| anyhow::anyhow!("OpenID return is missing claimed_id"))?;
        let steamid = parse_claimed_id(claimed)
            .ok_or_else(|| anyhow::anyhow!("claimed_id is not a Steam identity URL"))?;

        // Replay the provider's own parameters, switching the mode. The
        // provider re-checks the signature server-side.
        let mut form: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, _)| k.starts_with("openid.") && *k != "openid.mode")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        form.push(("openid.mode", "check_authentication"));

        let body = self
            .http
            .post(OPENID_ENDPOINT)
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        if !body.lines().any(|l| l.trim() == "is_valid:true") {
            anyhow::bail!("OpenID signature check failed");
        }

        Ok(steamid)
    }

    /// Fetch the player summary for a verified steamid and shape it into
    /// the profile the aggregator consumes.
    pub async fn fetch_profile(&self, steamid: &str) -> anyhow::Result<SteamProfile> {
        let envelope: SummaryEnvelope = self
            .http
            .get(PLAYER_SUMMARY_URL)
            .query(&[("key", self.api_key.as_str()), ("steamids", steamid)])
            .send()
            .await?
            .json()
            .await?;

        let player = envelope
            .response
            .players
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("player summary is empty for {steamid}"))?;

        let photos = [player.avatar, player.avatarmedium, player.avatarfull]
            .into_iter()
            .flatten()
            .collect();

        Ok(SteamProfile {
            id: player.steamid,
            display_name: player.personaname,
            photos,
        })
    }
}

/// Steamid from a claimed-id URL like
/// `https://steamcommunity.com/openid/id/76561198000000000`.
fn parse_claimed_id(claimed: &str) -> Option<String> {
    let id = claimed.strip_prefix(CLAIMED_ID_PREFIX)?.trim_end_matches('/');
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}
