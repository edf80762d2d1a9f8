// src/tls/bundle.rs

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use std::borrow::Cow;
use std::io::{BufReader, Cursor};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Trust bundle compiled into the binary.
pub const EMBEDDED_BUNDLE: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/certs/trusted.pem"));

/// Where the PEM trust bundle is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleSource {
    /// `certs/trusted.pem`, embedded at build time.
    Embedded,
    /// A PEM file on disk, read once during construction.
    File(PathBuf),
    /// PEM bytes already in memory.
    Pem(Vec<u8>),
}

impl BundleSource {
    /// Returns the bundle from `path`, or the embedded one when no path is configured.
    pub fn from_optional_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Embedded, Self::File)
    }

    fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Embedded => Ok(Cow::Borrowed(EMBEDDED_BUNDLE)),
            Self::File(path) => std::fs::read(path).map(Cow::Owned).map_err(|e| {
                AppError::certificate_load(format!(
                    "Failed to read trust bundle '{}': {}",
                    path.display(),
                    e
                ))
            }),
            Self::Pem(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Embedded => "embedded".to_string(),
            Self::File(path) => path.display().to_string(),
            Self::Pem(_) => "in-memory".to_string(),
        }
    }
}

/// One decoded certificate from the trust bundle.
#[derive(Clone)]
pub struct BundleCertificate {
    pub ordinal: usize,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub is_ca: bool,
    der: CertificateDer<'static>,
}

impl std::fmt::Debug for BundleCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleCertificate")
            .field("ordinal", &self.ordinal)
            .field("subject", &self.subject)
            .field("not_after", &self.not_after)
            .field("der_len", &self.der.len())
            .finish()
    }
}

impl BundleCertificate {
    fn decode(ordinal: usize, der: CertificateDer<'static>) -> Result<Self> {
        let (_, cert) = x509_parser::parse_x509_certificate(der.as_ref()).map_err(|e| {
            AppError::certificate_load(format!(
                "Certificate #{ordinal} in trust bundle is not valid X.509: {e}"
            ))
        })?;

        let validity = cert.validity();
        let not_before = to_utc(validity.not_before.timestamp(), ordinal)?;
        let not_after = to_utc(validity.not_after.timestamp(), ordinal)?;

        Ok(Self {
            ordinal,
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before,
            not_after,
            is_ca: cert.is_ca(),
            der,
        })
    }

    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }
}

fn to_utc(timestamp: i64, ordinal: usize) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        AppError::certificate_load(format!(
            "Certificate #{ordinal} has an out-of-range validity timestamp"
        ))
    })
}

/// Ordered certificates parsed from a PEM stream. Duplicates are kept.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    certificates: Vec<BundleCertificate>,
}

impl CertificateBundle {
    /// Parses every `CERTIFICATE` block in `pem`.
    ///
    /// Fails on broken PEM framing, on any block that is not an X.509
    /// certificate, and on a stream with no certificates at all.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let mut reader = BufReader::new(Cursor::new(pem));
        let ders: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::certificate_load(format!("Malformed PEM in trust bundle: {e}")))?;

        if ders.is_empty() {
            return Err(AppError::certificate_load("empty trust bundle"));
        }

        let certificates = ders
            .into_iter()
            .enumerate()
            .map(|(ordinal, der)| BundleCertificate::decode(ordinal, der))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { certificates })
    }

    pub fn load(source: &BundleSource) -> Result<Self> {
        let pem = source.read()?;
        let bundle = Self::from_pem(&pem)?;
        info!(
            tls.bundle.source = %source.describe(),
            tls.bundle.count = bundle.len(),
            "Loaded trust bundle"
        );
        Ok(bundle)
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BundleCertificate> {
        self.certificates.iter()
    }

    /// True when `der` is byte-identical to one of the bundle entries.
    pub fn contains_der(&self, der: &[u8]) -> bool {
        self.certificates.iter().any(|c| c.der.as_ref() == der)
    }
}

/// Trust anchors derived from a [`CertificateBundle`].
#[derive(Debug, Clone)]
pub struct TrustStore {
    bundle: CertificateBundle,
    roots: RootCertStore,
}

impl TrustStore {
    pub fn from_bundle(bundle: CertificateBundle) -> Result<Self> {
        let now = Utc::now();
        let mut roots = RootCertStore::empty();

        for cert in bundle.iter() {
            if cert.is_expired_at(now) {
                warn!(
                    tls.anchor.ordinal = cert.ordinal,
                    tls.anchor.subject = %cert.subject,
                    tls.anchor.not_after = %cert.not_after,
                    "Trust bundle contains an expired certificate"
                );
            }
            roots.add(cert.der.clone()).map_err(|e| {
                AppError::certificate_load(format!(
                    "Certificate #{} ({}) cannot be used as a trust anchor: {}",
                    cert.ordinal, cert.subject, e
                ))
            })?;
            debug!(
                tls.anchor.ordinal = cert.ordinal,
                tls.anchor.subject = %cert.subject,
                tls.anchor.ca = cert.is_ca,
                "Added trust anchor"
            );
        }

        Ok(Self { bundle, roots })
    }

    pub fn load(source: &BundleSource) -> Result<Self> {
        Self::from_bundle(CertificateBundle::load(source)?)
    }

    pub fn bundle(&self) -> &CertificateBundle {
        &self.bundle
    }

    pub fn roots(&self) -> &RootCertStore {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.bundle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty()
    }
}
