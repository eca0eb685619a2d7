//! Aggregation layer of the web tier: one operation per page need.
//!
//! Every operation is the same deterministic pipeline: acquire a token,
//! issue the downstream call(s), merge the payload into a [`ViewModel`].
//! The first failure short-circuits the pipeline and surfaces as an
//! [`AggregateError`] carrying the operation name; a partial view is never
//! produced.

use serde_json::{json, Value};

use crate::errors::{AggregateError, DownstreamError};
use crate::models::profile::SteamProfile;
use crate::models::view::ViewModel;
use crate::upstream::{DataApiClient, DownstreamRequest, TokenProvider};

pub struct Aggregator {
    tokens: TokenProvider,
    api: DataApiClient,
}

impl Aggregator {
    pub fn new(tokens: TokenProvider, api: DataApiClient) -> Self {
        Self { tokens, api }
    }

    /// Token → downstream → payload. On an auth/transport failure the
    /// cached token is dropped so the next operation re-exchanges.
    async fn run(
        &self,
        op: &'static str,
        request: DownstreamRequest,
    ) -> Result<Value, AggregateError> {
        let token = self
            .tokens
            .acquire()
            .await
            .map_err(|source| AggregateError::Token { op, source })?;

        match self.api.call(&request, &token).await {
            Ok(payload) => Ok(payload),
            Err(source) => {
                if matches!(source, DownstreamError::AuthOrTransport) {
                    self.tokens.invalidate();
                }
                Err(AggregateError::Downstream { op, source })
            }
        }
    }

    /// Player record plus their match history, split into the `player` and
    /// `matches` slots.
    pub async fn user_profile(&self, steamid: &str) -> Result<ViewModel, AggregateError> {
        let mut payload = self
            .run(
                "user_profile",
                DownstreamRequest::get(format!("/api/user/{steamid}")),
            )
            .await?;

        let mut view = ViewModel::new();
        if let Some(obj) = payload.as_object_mut() {
            if let Some(player) = obj.remove("player") {
                view.fill("player", player);
            }
            if let Some(matches) = obj.remove("matches") {
                view.fill("matches", matches);
            }
        }
        Ok(view)
    }

    /// Match history for one player, most recent first.
    pub async fn user_matches(&self, steamid: &str) -> Result<ViewModel, AggregateError> {
        let payload = self
            .run(
                "user_matches",
                DownstreamRequest::get(format!("/api/matches/{steamid}")),
            )
            .await?;
        Ok(ViewModel::new().with("matches", payload))
    }

    /// One page of the user directory (100 users, offset `page * 100`).
    pub async fn all_users(&self, page: u32) -> Result<ViewModel, AggregateError> {
        let payload = self
            .run("all_users", DownstreamRequest::get(format!("/api/users/{page}")))
            .await?;
        Ok(ViewModel::new().with("users", payload))
    }

    /// Most recent matches across all players.
    pub async fn latest_matches(&self) -> Result<ViewModel, AggregateError> {
        let payload = self
            .run("latest_matches", DownstreamRequest::get("/api/matches/"))
            .await?;
        Ok(ViewModel::new().with("matches", payload))
    }

    /// Top-10 leaderboard by rating.
    pub async fn top(&self) -> Result<ViewModel, AggregateError> {
        let payload = self
            .run("top", DownstreamRequest::get("/api/top10/"))
            .await?;
        Ok(ViewModel::new().with("top", payload))
    }

    /// Upsert the authenticated player's record after a successful login.
    /// The resulting view carries the profile under the `user` slot.
    pub async fn link_account(&self, profile: &SteamProfile) -> Result<ViewModel, AggregateError> {
        let body = json!({
            "alias": profile.display_name,
            "steamid": profile.id,
            "avatars": profile.photos,
        });
        self.run("link_account", DownstreamRequest::post("/api/user/", body))
            .await?;

        let mut view = ViewModel::new();
        view.fill("user", json!(profile));
        Ok(view)
    }
}
