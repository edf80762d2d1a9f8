// src/tls/policy.rs

use crate::error::{AppError, Result};
use crate::tls::bundle::{BundleSource, TrustStore};
use crate::tls::verifier::{AcceptAnyServerCert, BundleServerCertVerifier};
use rustls::client::danger::ServerCertVerifier;
use rustls::crypto::CryptoProvider;
use rustls::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// How outbound server certificates are verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustMode {
    /// Accept any server certificate. Insecure; for controlled test environments only.
    #[serde(alias = "trust_all")]
    TrustAll,
    /// Accept only certificates that chain to, or match, the trust bundle.
    #[default]
    #[serde(alias = "trust_specific")]
    TrustSpecific,
}

impl TrustMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrustAll => "trust-all",
            Self::TrustSpecific => "trust-specific",
        }
    }
}

impl fmt::Display for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "trust-all" => Ok(Self::TrustAll),
            "trust-specific" => Ok(Self::TrustSpecific),
            other => Err(AppError::configuration(
                format!("Unrecognized trust mode '{other}'. Supported: trust-all, trust-specific"),
                Some("tls.mode"),
            )),
        }
    }
}

/// A built trust policy: the chosen mode plus the rustls client configuration it produced.
///
/// Construction either fully succeeds or fails; there is no degraded policy.
#[derive(Debug)]
pub struct TrustPolicy {
    mode: TrustMode,
    anchors: usize,
    tls_config: ClientConfig,
}

impl TrustPolicy {
    /// Builds the policy for `mode`. `source` is only read for [`TrustMode::TrustSpecific`].
    pub fn build(mode: TrustMode, source: &BundleSource) -> Result<Self> {
        match mode {
            TrustMode::TrustAll => Self::danger_trust_all(),
            TrustMode::TrustSpecific => Self::trust_specific(source),
        }
    }

    /// Policy that trusts only the certificates in `source`.
    pub fn trust_specific(source: &BundleSource) -> Result<Self> {
        let provider = crypto_provider();
        let store = TrustStore::load(source)?;
        let anchors = store.len();
        let verifier = BundleServerCertVerifier::new(store, provider.clone())
            .map_err(|e| AppError::certificate_load(e.to_string()))?;

        let tls_config = client_config(provider, verifier)?;
        info!(tls.mode = %TrustMode::TrustSpecific, tls.anchors = anchors, "Trust policy ready");

        Ok(Self {
            mode: TrustMode::TrustSpecific,
            anchors,
            tls_config,
        })
    }

    /// Policy that accepts every server certificate.
    ///
    /// Never use this against an upstream reachable over an untrusted network.
    pub fn danger_trust_all() -> Result<Self> {
        let provider = crypto_provider();
        let verifier = AcceptAnyServerCert::new(provider.clone());
        let tls_config = client_config(provider, verifier)?;
        warn!(
            tls.mode = %TrustMode::TrustAll,
            "Server certificate verification is DISABLED; any upstream certificate will be accepted"
        );

        Ok(Self {
            mode: TrustMode::TrustAll,
            anchors: 0,
            tls_config,
        })
    }

    pub fn mode(&self) -> TrustMode {
        self.mode
    }

    /// Number of trust anchors loaded; zero for trust-all.
    pub fn anchor_count(&self) -> usize {
        self.anchors
    }

    /// Hands the TLS configuration to exactly one HTTP client.
    pub fn into_tls_config(self) -> ClientConfig {
        self.tls_config
    }
}

/// Builds a TLS client configuration for `mode`.
pub fn build_tls_config(mode: TrustMode, source: &BundleSource) -> Result<ClientConfig> {
    TrustPolicy::build(mode, source).map(TrustPolicy::into_tls_config)
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn client_config(
    provider: Arc<CryptoProvider>,
    verifier: Arc<dyn ServerCertVerifier>,
) -> Result<ClientConfig> {
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth())
}
