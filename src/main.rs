use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use contest_board::api::health::HealthState;
use contest_board::api::routes::{router, ApiState};
use contest_board::config::Config;
use contest_board::contract::{ContestReader, GatewayClient, InMemoryContract};
use contest_board::error::Result;
use contest_board::matches::MatchFeed;
use contest_board::refresh::ContestRefresher;
use contest_board::state::ContestStore;
use contest_board::types::Address;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    match cfg.gateway_url.clone() {
        Some(url) => {
            let client = GatewayClient::new(&cfg, &url)?;
            info!("Reading contests through gateway at {url}");
            serve(cfg, client).await
        }
        None => {
            warn!("CONTRACT_GATEWAY_URL not set, serving an empty in-memory contract");
            let contest = Address::parse(&cfg.contest_address)?;
            let avs = Address::parse(&cfg.avs_address)?;
            serve(cfg, InMemoryContract::new(contest, avs)).await
        }
    }
}

async fn serve<C: ContestReader + 'static>(cfg: Config, client: C) -> Result<()> {
    let store = ContestStore::new();
    let health = Arc::new(HealthState::new());

    // Contest refresher (initial load happens on the first tick)
    let refresher = ContestRefresher::new(
        Arc::new(client),
        Arc::clone(&store),
        Arc::clone(&health),
        cfg.refresh_interval_secs,
    );
    tokio::spawn(async move { refresher.run().await });

    // HTTP API server
    let state = ApiState {
        store,
        health,
        feed: MatchFeed::new(&cfg)?,
    };
    let app = router(state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
