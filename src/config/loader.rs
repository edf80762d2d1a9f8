// src/config/loader.rs

use crate::config::{AppConfig, ConfigValidator};
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ENV_PORT: &str = "PORT";
pub const ENV_UPSTREAM_URL: &str = "PING_PROXY_UPSTREAM_URL";
pub const ENV_TRUST_MODE: &str = "PING_PROXY_TRUST_MODE";
pub const ENV_BUNDLE_PATH: &str = "PING_PROXY_BUNDLE_PATH";

/// Load configuration from file or defaults, then apply environment overrides.
///
/// The result is not validated yet; callers apply CLI overrides first and then
/// run [`ConfigValidator::validate`], or use [`load_config`].
pub fn load_unvalidated(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!("Configuration file not found, using defaults");
        AppConfig::default()
    };

    override_with_env(&mut config)?;
    Ok(config)
}

/// Load, override from the environment and validate.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let config = load_unvalidated(config_path)?;
    ConfigValidator::validate(&config)?;

    debug!("Configuration loaded and validated successfully");
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(config_path).map_err(|_| AppError::ConfigNotFound {
        path: config_path.display().to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParse {
        message: format!("Failed to parse config file: {}", e),
        line: e.location().map(|loc| loc.line()),
    })
}

fn override_with_env(config: &mut AppConfig) -> Result<()> {
    if let Ok(port_str) = std::env::var(ENV_PORT) {
        if let Ok(port) = port_str.parse::<u16>() {
            info!("Overriding server port from environment variable: {}", port);
            config.server.port = port;
        } else {
            warn!("Invalid PORT environment variable: {}", port_str);
        }
    }

    if let Ok(url) = std::env::var(ENV_UPSTREAM_URL) {
        info!("Overriding upstream URL from environment variable: {}", url);
        config.upstream.base_url = url;
    }

    // A bad trust mode must never fall back to a default policy.
    if let Ok(mode) = std::env::var(ENV_TRUST_MODE) {
        config.tls.mode = mode.parse()?;
        info!("Overriding trust mode from environment variable: {}", config.tls.mode);
    }

    if let Ok(path) = std::env::var(ENV_BUNDLE_PATH) {
        info!("Overriding trust bundle path from environment variable: {}", path);
        config.tls.bundle_path = Some(PathBuf::from(path));
    }

    Ok(())
}
