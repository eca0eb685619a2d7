//! Integration tests for the aggregation core: token exchange, downstream
//! call classification, and the per-operation pipelines.
//!
//! Both the token endpoint and the data API are stood in by wiremock; no
//! database or network access is needed.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mgestats::aggregator::Aggregator;
use mgestats::errors::{AggregateError, DownstreamError, TokenError};
use mgestats::models::profile::SteamProfile;
use mgestats::upstream::{AccessToken, Credential, DataApiClient, DownstreamRequest, TokenProvider};

fn credential(token_url: String) -> Credential {
    Credential {
        client_id: "web-frontend".into(),
        client_secret: "s3cret".into(),
        audience: "https://api.test".into(),
        token_url,
    }
}

fn provider(token_url: String) -> TokenProvider {
    TokenProvider::new(
        reqwest::Client::new(),
        credential(token_url),
        Duration::from_secs(300),
    )
}

fn aggregator(token_url: String, api_url: String) -> Aggregator {
    let http = reqwest::Client::new();
    Aggregator::new(
        TokenProvider::new(http.clone(), credential(token_url), Duration::from_secs(300)),
        DataApiClient::new(http, api_url),
    )
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "tok.abc.123",
            "expires_in": 600,
        })))
        .mount(server)
        .await;
}

fn token_url(server: &MockServer) -> String {
    format!("{}/oauth/token", server.uri())
}

// ── Token provider ───────────────────────────────────────────

#[tokio::test]
async fn acquire_preserves_the_envelope_in_the_header_value() {
    let idp = MockServer::start().await;
    mount_token_endpoint(&idp).await;

    let token = provider(token_url(&idp)).acquire().await.unwrap();
    assert_eq!(token.header_value(), "Bearer tok.abc.123");
}

#[tokio::test]
async fn unreachable_token_endpoint_classifies_as_unreachable() {
    // Nothing listens on port 1.
    let err = provider("http://127.0.0.1:1/oauth/token".into())
        .acquire()
        .await
        .unwrap_err();
    assert!(matches!(err, TokenError::Unreachable(_)));
}

#[tokio::test]
async fn envelope_missing_fields_classifies_as_malformed() {
    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
        })))
        .mount(&idp)
        .await;

    let err = provider(token_url(&idp)).acquire().await.unwrap_err();
    assert!(matches!(err, TokenError::MalformedResponse));
}

#[tokio::test]
async fn tokens_are_cached_until_expiry() {
    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "tok.cached",
            "expires_in": 600,
        })))
        .expect(1)
        .mount(&idp)
        .await;

    let tokens = provider(token_url(&idp));
    let first = tokens.acquire().await.unwrap();
    let second = tokens.acquire().await.unwrap();
    assert_eq!(first.header_value(), second.header_value());
}

#[tokio::test]
async fn invalidate_forces_a_fresh_exchange() {
    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "tok.fresh",
        })))
        .expect(2)
        .mount(&idp)
        .await;

    let tokens = provider(token_url(&idp));
    tokens.acquire().await.unwrap();
    tokens.invalidate();
    tokens.acquire().await.unwrap();
}

// ── Downstream client ────────────────────────────────────────

#[tokio::test]
async fn sentinel_body_classifies_as_bad_query() {
    let api = MockServer::start().await;
    // "-1" is itself valid JSON; the sentinel check must win.
    Mock::given(method("GET"))
        .and(path("/api/top10/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("-1"))
        .mount(&api)
        .await;

    let client = DataApiClient::new(reqwest::Client::new(), api.uri());
    let err = client
        .call(
            &DownstreamRequest::get("/api/top10/"),
            &AccessToken::new("Bearer", "tok"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DownstreamError::BadQuery));
}

#[tokio::test]
async fn non_json_body_classifies_as_malformed_response() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/top10/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&api)
        .await;

    let client = DataApiClient::new(reqwest::Client::new(), api.uri());
    let err = client
        .call(
            &DownstreamRequest::get("/api/top10/"),
            &AccessToken::new("Bearer", "tok"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DownstreamError::MalformedResponse));
}

#[tokio::test]
async fn non_2xx_classifies_as_auth_or_transport() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/top10/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&api)
        .await;

    let client = DataApiClient::new(reqwest::Client::new(), api.uri());
    let err = client
        .call(
            &DownstreamRequest::get("/api/top10/"),
            &AccessToken::new("Bearer", "tok"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DownstreamError::AuthOrTransport));
}

#[tokio::test]
async fn bearer_header_reaches_the_data_api() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/matches/"))
        .and(wiremock::matchers::header("authorization", "Bearer tok.abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&api)
        .await;

    let client = DataApiClient::new(reqwest::Client::new(), api.uri());
    let payload = client
        .call(
            &DownstreamRequest::get("/api/matches/"),
            &AccessToken::new("Bearer", "tok.abc"),
        )
        .await
        .unwrap();
    assert_eq!(payload, json!([]));
}

// ── Aggregator pipelines ─────────────────────────────────────

#[tokio::test]
async fn token_failure_short_circuits_before_any_downstream_call() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&api)
        .await;

    let agg = aggregator("http://127.0.0.1:1/oauth/token".into(), api.uri());
    let err = agg.user_profile("42").await.unwrap_err();

    assert!(matches!(
        err,
        AggregateError::Token {
            op: "user_profile",
            source: TokenError::Unreachable(_),
        }
    ));
}

#[tokio::test]
async fn link_account_then_user_profile_fills_both_slots_verbatim() {
    let idp = MockServer::start().await;
    mount_token_endpoint(&idp).await;

    let player = json!({"alias": "scout", "steamid": "42", "avatar": "http://a/full.jpg"});
    let matches = json!([
        {"id": 2, "winner": "42", "loser": "7", "winner_score": 20, "loser_score": 14},
        {"id": 1, "winner": "7", "loser": "42", "winner_score": 20, "loser_score": 19},
    ]);

    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/"))
        .and(body_string_contains("\"steamid\":\"42\""))
        .respond_with(ResponseTemplate::new(200).set_body_string("0"))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"player": player, "matches": matches})),
        )
        .mount(&api)
        .await;

    let agg = aggregator(token_url(&idp), api.uri());

    let profile = SteamProfile {
        id: "42".into(),
        display_name: "scout".into(),
        photos: vec!["http://a/small.jpg".into(), "http://a/full.jpg".into()],
    };
    let linked = agg.link_account(&profile).await.unwrap();
    assert!(linked.slot("user").is_some());

    let view = agg.user_profile("42").await.unwrap();
    assert_eq!(view.slot("player"), Some(&player));
    assert_eq!(view.slot("matches"), Some(&matches));
}

#[tokio::test]
async fn second_dependent_call_failure_yields_no_partial_view() {
    let idp = MockServer::start().await;
    mount_token_endpoint(&idp).await;

    let api = MockServer::start().await;
    // First dependent call (the upsert) succeeds...
    Mock::given(method("POST"))
        .and(path("/api/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0"))
        .mount(&api)
        .await;
    // ...the follow-up profile fetch fails at the query level.
    Mock::given(method("GET"))
        .and(path("/api/user/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("-1"))
        .mount(&api)
        .await;

    let agg = aggregator(token_url(&idp), api.uri());

    let profile = SteamProfile {
        id: "42".into(),
        display_name: "scout".into(),
        photos: vec![],
    };
    agg.link_account(&profile).await.unwrap();

    let err = agg.user_profile("42").await.unwrap_err();
    assert!(matches!(
        err,
        AggregateError::Downstream {
            op: "user_profile",
            source: DownstreamError::BadQuery,
        }
    ));
}

#[tokio::test]
async fn all_users_requests_the_page_the_data_api_offsets_by_100() {
    let idp = MockServer::start().await;
    mount_token_endpoint(&idp).await;

    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"alias": "u200"}])))
        .expect(1)
        .mount(&api)
        .await;

    let agg = aggregator(token_url(&idp), api.uri());
    let view = agg.all_users(2).await.unwrap();
    assert_eq!(view.slot("users"), Some(&json!([{"alias": "u200"}])));
}

#[tokio::test]
async fn auth_failure_downstream_invalidates_the_cached_token() {
    let idp = MockServer::start().await;
    // Two exchanges expected: initial acquire + re-acquire after the 401.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "tok.rotating",
            "expires_in": 600,
        })))
        .expect(2)
        .mount(&idp)
        .await;

    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/top10/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/matches/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&api)
        .await;

    let agg = aggregator(token_url(&idp), api.uri());

    let err = agg.top().await.unwrap_err();
    assert!(matches!(
        err,
        AggregateError::Downstream {
            op: "top",
            source: DownstreamError::AuthOrTransport,
        }
    ));

    // The next operation re-exchanges instead of reusing the dropped token.
    agg.latest_matches().await.unwrap();
}
