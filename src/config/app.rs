// src/config/app.rs

use crate::tls::{BundleSource, TrustMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub test_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            test_mode: false,
        }
    }
}

impl ServerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// The single upstream origin that pings are forwarded to.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ping_path")]
    pub ping_path: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ping_path: default_ping_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TrustMode,
    /// PEM bundle on disk; `None` uses the bundle embedded at build time.
    #[serde(default)]
    pub bundle_path: Option<PathBuf>,
}

impl TlsConfig {
    pub fn bundle_source(&self) -> BundleSource {
        BundleSource::from_optional_path(self.bundle_path.clone())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub tls: TlsConfig,
}

// Default value functions
fn default_base_url() -> String {
    "https://example.com".to_string()
}

fn default_ping_path() -> String {
    "/ping".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    10
}
