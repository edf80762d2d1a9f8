//! Outbound TLS trust policy.
//!
//! A [`TrustPolicy`] turns a [`TrustMode`] into a rustls `ClientConfig`:
//! - `trust-all` accepts any server certificate
//! - `trust-specific` accepts only chains anchored in, or leaves pinned by, a PEM bundle

pub mod bundle;
pub mod policy;
pub mod verifier;

pub use bundle::{BundleCertificate, BundleSource, CertificateBundle, TrustStore, EMBEDDED_BUNDLE};
pub use policy::{build_tls_config, TrustMode, TrustPolicy};
pub use verifier::{AcceptAnyServerCert, BundleServerCertVerifier};
