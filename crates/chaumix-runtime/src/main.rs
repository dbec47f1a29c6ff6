//! # chaumix: Chaumian CoinJoin Coordinator
//!
//! Binary entry point wiring the pieces together:
//!
//! 1. Initialize logging
//! 2. Load (or create) the configuration file
//! 3. Load (or generate) the RSA signing key
//! 4. Start the phase bus and the round driver
//! 5. Run until Ctrl+C, then shut down gracefully

mod keyfile;
mod rates;

use anyhow::{Context, Result};
use chaumix_bus::PhaseBroadcaster;
use chaumix_coordinator::{CoordinatorConfig, RoundStateMachine};
use rates::HttpRateProvider;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn config_path() -> PathBuf {
    std::env::var_os("CHAUMIX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Config.json"))
}

fn key_path() -> PathBuf {
    std::env::var_os("CHAUMIX_KEY")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("RsaKey.der"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chaumix coordinator v{}", env!("CARGO_PKG_VERSION"));

    let config =
        CoordinatorConfig::load_or_create(&config_path()).context("loading configuration")?;

    let signing_key = keyfile::load_or_generate(&key_path()).await?;
    info!(bits = signing_key.key_size(), "signing key ready");

    let bus = Arc::new(PhaseBroadcaster::new());
    let rates = Arc::new(
        HttpRateProvider::new(config.exchange_rate_url.clone())
            .context("building exchange-rate client")?,
    );

    let machine = Arc::new(RoundStateMachine::new(config, rates, Arc::clone(&bus)));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Log every phase boundary; API surfaces subscribe the same way.
    let mut phases = bus.subscribe();
    tokio::spawn(async move {
        while let Some(event) = phases.recv().await {
            info!(phase = %event.new_phase, "phase change announced");
        }
    });

    let driver = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move { machine.run(shutdown_rx).await })
    };

    info!("coordinator is running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;

    info!("shutting down");
    let _ = shutdown_tx.send(true);
    driver.await.context("round driver task panicked")?;

    Ok(())
}
