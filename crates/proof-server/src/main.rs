//! HTTP API server for anonymous voting.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod routes;


use anonvote_circuits::{InMemoryLedger, LedgerError, PoseidonHasher};
use anonvote_prover::setup::{CircuitKeys, SetupError};

use crate::config::{Config, ConfigError};

/// Application state shared across handlers
pub struct AppState {
    pub keys: Arc<CircuitKeys>,
    pub ledger: InMemoryLedger<PoseidonHasher>,
}

pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    pub fn new(keys: CircuitKeys, proposals: &[String]) -> Result<Self, LedgerError> {
        let ledger = InMemoryLedger::new(keys.height, PoseidonHasher, proposals.iter().cloned())?;
        Ok(Self {
            keys: Arc::new(keys),
            ledger,
        })
    }
}

#[derive(Error, Debug)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;
    info!(?config, "starting anonymous voting server");

    // Load or generate circuit keys
    let keys = CircuitKeys::load_or_setup(&config.keys_dir, config.tree_height)?;
    let state = Arc::new(RwLock::new(AppState::new(keys, &config.proposals)?));

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
