use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mgestats::aggregator::Aggregator;
use mgestats::api::{self, ApiState};
use mgestats::auth::{Sessions, SteamAuth};
use mgestats::cli::{Cli, Commands};
use mgestats::config::{self, Config};
use mgestats::store::PgStore;
use mgestats::upstream::{Credential, DataApiClient, TokenProvider};
use mgestats::web::{self, WebState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "mgestats=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::ServeApi { port }) => run_api(cfg, port).await,
        Some(Commands::ServeWeb { port }) => run_web(cfg, port).await,
        None => run_web(cfg, 3000).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_api(cfg: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    if cfg.api_auth_disabled {
        tracing::warn!("JWT validation is DISABLED — do not run like this in production");
    }

    let state = Arc::new(ApiState { db, config: cfg });
    let app = api::api_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("data API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_web(cfg: Config, port: u16) -> anyhow::Result<()> {
    // One HTTP client for every outbound call: token endpoint, data API,
    // identity provider. Safe for concurrent use across request pipelines.
    let http = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build HTTP client");

    let tokens = TokenProvider::new(
        http.clone(),
        Credential::from_config(&cfg),
        Duration::from_secs(cfg.token_ttl_secs),
    );
    let data_api = DataApiClient::new(http.clone(), cfg.data_api_url.clone());

    let state = Arc::new(WebState {
        aggregator: Aggregator::new(tokens, data_api),
        steam: SteamAuth::new(http, &cfg),
        sessions: Sessions::new(&cfg),
    });
    let app = web::web_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("web frontend listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
