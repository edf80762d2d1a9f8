//! Error type definitions and conversions

use super::AppError;
use serde::Serialize;
use std::fmt;

/// What went wrong below the HTTP layer during a ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// The call did not finish within its deadline.
    Timeout,
    /// The TLS handshake failed, including certificate rejection.
    Tls,
    /// DNS resolution or TCP connect failed.
    Connect,
    /// Anything else: broken body stream, protocol errors.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::Connect => "connect",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl TransportErrorKind {
    /// Classify a reqwest failure.
    ///
    /// TLS failures are reported by reqwest as connect errors, so the source
    /// chain is searched for a rustls error before falling back to `Connect`.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if find_rustls_error(err).is_some() {
            Self::Tls
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Other
        }
    }
}

/// Walk an error's source chain looking for the rustls error that aborted a handshake.
///
/// `std::io::Error` skips its payload in `source()`, and hyper nests one io error
/// inside another, so io payloads are descended through `get_ref()` at every level.
pub fn find_rustls_error<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a rustls::Error> {
    let mut current: Option<&'a (dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(inner) = e.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
            current = Some(inner as &(dyn std::error::Error + 'static));
            continue;
        }
        current = e.source();
    }
    None
}

// Implement From traits for common error types
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            operation: "io_operation".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            message: err.to_string(),
            line: err.location().map(|loc| loc.line()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let kind = TransportErrorKind::classify(&err);
        let message = match find_rustls_error(&err) {
            Some(tls) => format!("{err}: {tls}"),
            None => err.to_string(),
        };
        Self::Transport { kind, message }
    }
}

impl From<rustls::Error> for AppError {
    fn from(err: rustls::Error) -> Self {
        Self::Configuration {
            message: format!("Failed to build TLS configuration: {err}"),
            field: Some("tls".to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration {
            message: format!("Invalid URL: {err}"),
            field: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_rustls_error_inside_io_error() {
        let io = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        let found = find_rustls_error(&io).expect("rustls error should be found");
        assert!(matches!(
            found,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer)
        ));
    }

    #[test]
    fn finds_rustls_error_inside_nested_io_errors() {
        let inner = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        let outer = std::io::Error::new(std::io::ErrorKind::Other, inner);

        let found = find_rustls_error(&outer).expect("rustls error should be found");
        assert!(matches!(
            found,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer)
        ));
    }

    #[test]
    fn nested_io_error_without_rustls_cause() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let outer = std::io::Error::new(std::io::ErrorKind::Other, inner);
        assert!(find_rustls_error(&outer).is_none());
    }

    #[test]
    fn plain_io_error_has_no_rustls_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(find_rustls_error(&io).is_none());
    }

    #[test]
    fn transport_kind_display() {
        assert_eq!(TransportErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(TransportErrorKind::Tls.to_string(), "tls");
    }
}
