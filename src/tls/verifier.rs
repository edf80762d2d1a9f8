// src/tls/verifier.rs

use crate::tls::bundle::TrustStore;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, Error as TlsError, SignatureScheme};
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifier that accepts any server certificate.
///
/// Chain, hostname and expiry are not checked. Handshake signatures are still
/// verified, so the peer must hold the key for the certificate it presents.
#[derive(Debug)]
pub struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    pub fn new(provider: Arc<CryptoProvider>) -> Arc<Self> {
        Arc::new(Self { provider })
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        debug!(tls.server_name = ?server_name, "Accepting server certificate without verification");
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// Verifier backed by a fixed trust bundle.
///
/// A chain is accepted when it validates against the bundle's anchors
/// (including hostname and validity checks), or when the end-entity
/// certificate is byte-identical to a bundle entry.
#[derive(Debug)]
pub struct BundleServerCertVerifier {
    store: TrustStore,
    webpki: Arc<WebPkiServerVerifier>,
    provider: Arc<CryptoProvider>,
}

impl BundleServerCertVerifier {
    pub fn new(store: TrustStore, provider: Arc<CryptoProvider>) -> Result<Arc<Self>, TlsError> {
        let webpki = WebPkiServerVerifier::builder_with_provider(
            Arc::new(store.roots().clone()),
            provider.clone(),
        )
        .build()
        .map_err(|e| TlsError::General(format!("Failed to build certificate verifier: {e}")))?;

        Ok(Arc::new(Self {
            store,
            webpki,
            provider,
        }))
    }
}

impl ServerCertVerifier for BundleServerCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        match self
            .webpki
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Ok(verified) => {
                debug!(tls.server_name = ?server_name, "Server certificate chains to trust bundle");
                Ok(verified)
            }
            Err(chain_error) => {
                if self.store.bundle().contains_der(end_entity.as_ref()) {
                    debug!(
                        tls.server_name = ?server_name,
                        "Server certificate matches a pinned bundle entry"
                    );
                    return Ok(ServerCertVerified::assertion());
                }
                warn!(
                    tls.server_name = ?server_name,
                    error = %chain_error,
                    "Server certificate rejected by trust bundle"
                );
                Err(chain_error)
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.webpki.supported_verify_schemes()
    }
}
