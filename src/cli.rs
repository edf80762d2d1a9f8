use crate::tls::TrustMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ping-proxy",
    version,
    about = "Forwards a ping to an HTTPS upstream using a configurable TLS trust policy",
    long_about = "A small HTTP service that forwards GET /api/ping to a fixed HTTPS upstream. Outbound TLS either trusts a fixed certificate bundle (trust-specific) or, for controlled test environments only, any certificate (trust-all)."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "PING_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Trust mode for upstream certificates (trust-all | trust-specific)
    #[arg(long, value_name = "MODE")]
    pub trust_mode: Option<TrustMode>,

    /// PEM trust bundle to use instead of the embedded one
    #[arg(long, value_name = "FILE")]
    pub bundle: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "PING_PROXY_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the proxy server (default)
    Serve,

    /// Validate the configuration and build the trust policy without serving
    Config {
        /// Show the loaded trust bundle
        #[arg(short, long)]
        verbose: bool,
    },

    /// Send one ping to the upstream and print the response body
    Ping {
        /// Timeout in seconds, overriding server.request_timeout_secs
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

/// Values from the command line that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub trust_mode: Option<TrustMode>,
    pub bundle: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            trust_mode: self.trust_mode,
            bundle: self.bundle.clone(),
        }
    }
}
