//! Common test utilities and fixtures

#![allow(dead_code)]

use axum::{routing::get, Router};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder as ConnBuilder,
    service::TowerToHyperService,
};
use ping_proxy::{
    config::{AppConfig, ServerConfig, UpstreamConfig},
    tls::{BundleSource, TrustMode, TrustPolicy},
    PingClient,
};
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// Test configuration builder
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.test_mode = true;
        Self { config }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_upstream(mut self, base_url: impl Into<String>) -> Self {
        self.config.upstream.base_url = base_url.into();
        self
    }

    pub fn with_trust_mode(mut self, mode: TrustMode) -> Self {
        self.config.tls.mode = mode;
        self
    }

    pub fn with_timeouts(mut self, connect_secs: u64, request_secs: u64) -> Self {
        self.config.server.connect_timeout_secs = connect_secs;
        self.config.server.request_timeout_secs = request_secs;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn test_server_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        connect_timeout_secs: 5,
        request_timeout_secs: 5,
        test_mode: true,
    }
}

fn upstream(base_url: &str) -> UpstreamConfig {
    UpstreamConfig {
        base_url: base_url.to_string(),
        ping_path: "/ping".to_string(),
    }
}

/// Ping client for `base_url` that trusts only the certificates in `pem`.
pub fn trust_specific_client(base_url: &str, pem: &str) -> ping_proxy::Result<PingClient> {
    let policy = TrustPolicy::build(
        TrustMode::TrustSpecific,
        &BundleSource::Pem(pem.as_bytes().to_vec()),
    )?;
    PingClient::new(policy, &upstream(base_url), &test_server_config())
}

/// Ping client for `base_url` that accepts any certificate.
pub fn trust_all_client(base_url: &str) -> PingClient {
    let policy = TrustPolicy::danger_trust_all().expect("trust-all policy should build");
    PingClient::new(policy, &upstream(base_url), &test_server_config())
        .expect("ping client should build")
}

/// Certificate and private key an upstream presents.
pub struct ServerIdentity {
    pub cert_der: CertificateDer<'static>,
    pub cert_pem: String,
    key_der: Vec<u8>,
}

impl ServerIdentity {
    fn from_parts(cert: rcgen::Certificate, key: &KeyPair) -> Self {
        Self {
            cert_der: cert.der().clone(),
            cert_pem: cert.pem(),
            key_der: key.serialize_der(),
        }
    }

    fn leaf_params(host: &str) -> CertificateParams {
        let mut params = CertificateParams::new(vec![host.to_string()]).expect("leaf params");
        params.distinguished_name.push(DnType::CommonName, host);
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params
    }

    /// Self-signed leaf for `host`.
    pub fn self_signed(host: &str) -> Self {
        let key = KeyPair::generate().expect("key pair");
        let cert = Self::leaf_params(host).self_signed(&key).expect("self-signed cert");
        Self::from_parts(cert, &key)
    }

    /// Self-signed leaf for `host` whose validity ended in 2001.
    pub fn expired(host: &str) -> Self {
        let key = KeyPair::generate().expect("key pair");
        let mut params = Self::leaf_params(host);
        params.not_before = rcgen::date_time_ymd(2000, 1, 1);
        params.not_after = rcgen::date_time_ymd(2001, 1, 1);
        let cert = params.self_signed(&key).expect("expired cert");
        Self::from_parts(cert, &key)
    }

    fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key_der.clone()))
    }
}

/// A throwaway certificate authority.
pub struct TestCa {
    key: KeyPair,
    cert: rcgen::Certificate,
}

impl TestCa {
    pub fn new(name: &str) -> Self {
        let key = KeyPair::generate().expect("ca key pair");
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("ca params");
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let cert = params.self_signed(&key).expect("ca cert");
        Self { key, cert }
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    /// Leaf for `host` signed by this CA.
    pub fn issue(&self, host: &str) -> ServerIdentity {
        let key = KeyPair::generate().expect("leaf key pair");
        let cert = ServerIdentity::leaf_params(host)
            .signed_by(&key, &self.cert, &self.key)
            .expect("ca-signed cert");
        ServerIdentity::from_parts(cert, &key)
    }
}

/// Router answering `GET /ping` with `pong`.
pub fn pong_router() -> Router {
    Router::new().route("/ping", get(|| async { "pong" }))
}

/// HTTPS upstream on 127.0.0.1 presenting `identity`. Returns the base URL (`https://localhost:<port>`).
pub async fn spawn_tls_upstream(identity: &ServerIdentity, app: Router) -> String {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![identity.cert_der.clone()], identity.private_key())
        .expect("server certificate");
    let acceptor = TlsAcceptor::from(Arc::new(server_config));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind tls upstream");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let app = app.clone();
            tokio::spawn(async move {
                // Handshake failures are expected in rejection tests.
                let Ok(tls) = acceptor.accept(stream).await else {
                    return;
                };
                let _ = ConnBuilder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(tls), TowerToHyperService::new(app))
                    .await;
            });
        }
    });

    format!("https://localhost:{}", addr.port())
}

/// TCP listener that accepts connections and never answers.
pub async fn spawn_silent_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind silent upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// A local address with nothing listening on it.
pub async fn closed_port_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

/// Environment setup for tests
pub fn setup_test_env() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
