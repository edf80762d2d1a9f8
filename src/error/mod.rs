//! Error handling for the ping proxy
//!
//! One enum covers every failure the service can produce:
//! - startup errors (configuration, trust bundle) that abort initialization
//! - per-call errors (transport, upstream status) surfaced to the caller of `ping`
//! - RFC 7807 Problem Details rendering for the inbound HTTP surface

pub mod types;

pub use types::TransportErrorKind;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Standard error response format following RFC 7807 Problem Details
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    pub detail: String,

    /// A URI reference that identifies the specific occurrence
    pub instance: String,

    /// Request ID for tracing
    pub request_id: Option<String>,

    /// Additional error-specific properties
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String, field: Option<String> },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String, line: Option<usize> },

    // Trust bundle errors
    #[error("Certificate load error: {message}")]
    CertificateLoad { message: String },

    // Per-call errors
    #[error("Transport error ({kind}): {message}")]
    Transport { kind: TransportErrorKind, message: String },

    #[error("Upstream returned non-success status {status}")]
    Upstream { status: u16 },

    // System errors
    #[error("IO operation failed: {operation} - {message}")]
    Io { operation: String, message: String },
}

impl AppError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>, field: Option<impl Into<String>>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(Into::into),
        }
    }

    /// Create a new certificate load error
    pub fn certificate_load(message: impl Into<String>) -> Self {
        Self::CertificateLoad {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Whether this error must abort process initialization.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigParse { .. }
                | Self::CertificateLoad { .. }
        )
    }

    /// The transport kind, if this is a transport error.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 502 Bad Gateway
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Transport { kind, .. } => match kind {
                TransportErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },

            // 500 Internal Server Error
            Self::Configuration { .. }
            | Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::CertificateLoad { .. }
            | Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type URI for RFC 7807 compliance
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                "https://ping-proxy.dev/errors/configuration"
            }
            Self::CertificateLoad { .. } => "https://ping-proxy.dev/errors/certificate",
            Self::Transport { .. } => "https://ping-proxy.dev/errors/transport",
            Self::Upstream { .. } => "https://ping-proxy.dev/errors/upstream",
            _ => "https://ping-proxy.dev/errors/internal",
        }
    }

    /// Get a human-readable title for the error
    pub fn title(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                "Configuration Error"
            }
            Self::CertificateLoad { .. } => "Certificate Load Error",
            Self::Transport { .. } => "Transport Error",
            Self::Upstream { .. } => "Upstream Error",
            _ => "Internal Server Error",
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self, request_id: Option<&str>) {
        let request_id = request_id.unwrap_or("unknown");

        if self.status_code().is_server_error() {
            error!(
                error = %self,
                request_id = request_id,
                error_type = self.error_type(),
                "Application error occurred"
            );
        } else {
            warn!(
                error = %self,
                request_id = request_id,
                error_type = self.error_type(),
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        self.log(Some(&request_id));

        let status = self.status_code();
        let mut extensions = serde_json::Map::new();
        match &self {
            Self::Upstream { status } => {
                extensions.insert("upstream_status".to_string(), (*status).into());
            }
            Self::Transport { kind, .. } => {
                extensions.insert("transport_kind".to_string(), kind.to_string().into());
            }
            _ => {}
        }

        let error_response = ErrorResponse {
            error_type: self.error_type().to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: self.to_string(),
            instance: format!("/errors/{}", request_id),
            request_id: Some(request_id),
            extensions,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
