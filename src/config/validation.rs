// src/config/validation.rs

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::tls::TrustMode;
use tracing::{debug, warn};
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        debug!("Starting configuration validation");

        if let Err(e) = Self::validate_upstream(config) {
            warn!("Upstream config validation failed: {}", e);
            return Err(e);
        }
        debug!("Upstream config validation passed");

        if let Err(e) = Self::validate_tls(config) {
            warn!("TLS config validation failed: {}", e);
            return Err(e);
        }
        debug!("TLS config validation passed");

        if let Err(e) = Self::validate_server_config(config) {
            warn!("Server config validation failed: {}", e);
            return Err(e);
        }
        debug!("Server config validation passed");

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_upstream(config: &AppConfig) -> Result<()> {
        let upstream = &config.upstream;
        let url = Url::parse(&upstream.base_url).map_err(|e| {
            AppError::configuration(
                format!("Invalid URL in upstream.base_url: {} - {}", upstream.base_url, e),
                Some("upstream.base_url"),
            )
        })?;

        match url.scheme() {
            "https" => {}
            "http" if config.server.test_mode => {
                warn!("Plain HTTP upstream allowed because test_mode is enabled");
            }
            scheme => {
                return Err(AppError::configuration(
                    format!("Unsupported upstream scheme '{}'. Supported: https", scheme),
                    Some("upstream.base_url"),
                ));
            }
        }

        if url.host_str().is_none() {
            return Err(AppError::configuration(
                format!("Upstream URL has no host: {}", upstream.base_url),
                Some("upstream.base_url"),
            ));
        }

        if !upstream.ping_path.starts_with('/') {
            return Err(AppError::configuration(
                format!("Ping path must start with '/': {}", upstream.ping_path),
                Some("upstream.ping_path"),
            ));
        }

        Ok(())
    }

    fn validate_tls(config: &AppConfig) -> Result<()> {
        match config.tls.mode {
            TrustMode::TrustAll => {
                if config.tls.bundle_path.is_some() {
                    warn!("tls.bundle_path is ignored in trust-all mode");
                }
                if !config.server.test_mode {
                    warn!("trust-all mode is enabled outside test mode");
                }
            }
            TrustMode::TrustSpecific => {
                if let Some(path) = &config.tls.bundle_path {
                    if !path.is_file() {
                        return Err(AppError::CertificateLoad {
                            message: format!("Trust bundle not found: {}", path.display()),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_server_config(config: &AppConfig) -> Result<()> {
        // Allow port 0 in test mode (system will assign a free port)
        if config.server.port == 0 && !config.server.test_mode {
            return Err(AppError::configuration(
                "Server port cannot be 0 (except in test mode)",
                Some("server.port"),
            ));
        }

        if config.server.connect_timeout_secs == 0 {
            return Err(AppError::configuration(
                "Connect timeout cannot be 0",
                Some("server.connect_timeout_secs"),
            ));
        }

        if config.server.request_timeout_secs == 0 {
            return Err(AppError::configuration(
                "Request timeout cannot be 0",
                Some("server.request_timeout_secs"),
            ));
        }

        Ok(())
    }
}
