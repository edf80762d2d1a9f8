// src/state.rs

use crate::client::PingClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::tls::TrustPolicy;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state accessible by all Axum handlers.
#[derive(Debug)]
pub struct AppState {
    pub ping_client: PingClient,
    started_at: Instant,
}

impl AppState {
    /// Builds the trust policy and the ping client from `config`.
    ///
    /// Fails atomically: no state exists unless both were built.
    pub fn new(config: &AppConfig) -> Result<Self> {
        info!("Creating shared AppState: building trust policy and ping client...");

        let policy = TrustPolicy::build(config.tls.mode, &config.tls.bundle_source()).map_err(|e| {
            error!(tls.mode = %config.tls.mode, error = ?e, "Failed to build trust policy.");
            e
        })?;

        let ping_client = PingClient::new(policy, &config.upstream, &config.server)?;
        Ok(Self::from_client(ping_client))
    }

    pub fn from_client(ping_client: PingClient) -> Self {
        Self {
            ping_client,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
