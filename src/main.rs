//! Poseidon admin node
//!
//! Loads the configuration, installs logging and the Prometheus recorder,
//! starts the statistics window timer and serves the admin endpoints.

use std::sync::Arc;
use dotenv::dotenv;
use log::info;
use poseidon_guard::api::{self, ApiState};
use poseidon_guard::config;
use poseidon_guard::core::{FaceStatsStore, WindowTimer};
use poseidon_guard::utils;

/// Table capacity reported until a forwarder attaches its own engine
const STANDALONE_TABLE_SIZE: u32 = 1_000;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    utils::init_logging();

    info!("Starting Poseidon admin node...");

    let config = config::load_config()?;
    let prometheus = api::install_prometheus()?;

    let stats = FaceStatsStore::shared(STANDALONE_TABLE_SIZE);
    let _window = WindowTimer::spawn(stats.clone(), config.strategy.window());

    let state = ApiState {
        stats,
        config: Arc::new(config.strategy.clone()),
        prometheus: Some(prometheus),
    };

    api::serve(state, &config.server).await
}
