// src/client.rs

use crate::{
    config::{ServerConfig, UpstreamConfig},
    error::{AppError, Result},
    tls::{TrustMode, TrustPolicy},
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Client for the single upstream health probe.
///
/// Owns one `reqwest::Client` built around the TLS configuration of a
/// [`TrustPolicy`]. Nothing is mutated after construction, so `ping` can be
/// called concurrently from any number of tasks.
#[derive(Debug, Clone)]
pub struct PingClient {
    http: Client,
    ping_url: Url,
    timeout: Duration,
    trust_mode: TrustMode,
}

impl PingClient {
    /// Builds the client, consuming the policy so its TLS configuration backs exactly one client.
    pub fn new(policy: TrustPolicy, upstream: &UpstreamConfig, server: &ServerConfig) -> Result<Self> {
        let trust_mode = policy.mode();
        let ping_url = Url::parse(&upstream.base_url)?.join(&upstream.ping_path)?;
        let timeout = server.request_timeout();

        let http = Client::builder()
            .use_preconfigured_tls(policy.into_tls_config())
            .connect_timeout(server.connect_timeout())
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::configuration(
                    format!("Failed to build HTTP client: {e}"),
                    Some("tls"),
                )
            })?;

        info!(
            upstream.url = %ping_url,
            tls.mode = %trust_mode,
            timeout = ?timeout,
            "Ping client ready"
        );

        Ok(Self {
            http,
            ping_url,
            timeout,
            trust_mode,
        })
    }

    /// GETs the upstream ping path using the configured request timeout.
    pub async fn ping(&self) -> Result<String> {
        self.ping_within(self.timeout).await
    }

    /// GETs the upstream ping path, failing with a timeout once `deadline` elapses.
    ///
    /// Any 2xx status returns the body as text. Other statuses become
    /// [`AppError::Upstream`] without the body. No retries are made.
    pub async fn ping_within(&self, deadline: Duration) -> Result<String> {
        debug!(upstream.url = %self.ping_url, deadline = ?deadline, "Sending ping");

        let response = self
            .http
            .get(self.ping_url.clone())
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(upstream.url = %self.ping_url, status = %status, "Upstream returned non-success status");
            return Err(AppError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        info!(upstream.url = %self.ping_url, status = %status, body.len = body.len(), "Ping succeeded");
        Ok(body)
    }

    pub fn ping_url(&self) -> &Url {
        &self.ping_url
    }

    pub fn trust_mode(&self) -> TrustMode {
        self.trust_mode
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        let err = AppError::from(err);
        warn!(upstream.url = %self.ping_url, error = %err, "Ping transport failure");
        err
    }
}
