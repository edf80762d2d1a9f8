// tests/error_module_tests.rs

use axum::{
    body::to_bytes,
    http::StatusCode,
    response::IntoResponse,
};
use ping_proxy::error::{AppError, ErrorResponse, TransportErrorKind};

#[test]
fn test_upstream_error_is_bad_gateway() {
    let error = AppError::Upstream { status: 503 };

    assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(error.title(), "Upstream Error");
    assert!(!error.is_startup_fatal());
}

#[test]
fn test_transport_timeout_is_gateway_timeout() {
    let error = AppError::transport(TransportErrorKind::Timeout, "deadline elapsed");

    assert_eq!(error.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error.transport_kind(), Some(TransportErrorKind::Timeout));
}

#[test]
fn test_transport_tls_is_bad_gateway() {
    let error = AppError::transport(TransportErrorKind::Tls, "invalid peer certificate: UnknownIssuer");

    assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(error.error_type(), "https://ping-proxy.dev/errors/transport");
    assert!(error.to_string().contains("tls"));
}

#[test]
fn test_startup_errors_are_fatal_and_internal() {
    let errors = [
        AppError::configuration("bad mode", Some("tls.mode")),
        AppError::certificate_load("empty trust bundle"),
        AppError::ConfigNotFound {
            path: "config.yaml".to_string(),
        },
        AppError::ConfigParse {
            message: "bad yaml".to_string(),
            line: Some(3),
        },
    ];

    for error in errors {
        assert!(error.is_startup_fatal(), "{error:?} should be fatal");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.transport_kind(), None);
    }
}

#[test]
fn test_certificate_load_error_type() {
    let error = AppError::certificate_load("empty trust bundle");

    assert_eq!(error.error_type(), "https://ping-proxy.dev/errors/certificate");
    assert_eq!(error.to_string(), "Certificate load error: empty trust bundle");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error = AppError::from(io);

    assert!(matches!(error, AppError::Io { .. }));
    assert!(!error.is_startup_fatal());
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.title(), "Internal Server Error");
    assert_eq!(error.error_type(), "https://ping-proxy.dev/errors/internal");
}

#[tokio::test]
async fn test_problem_details_body() {
    let response = AppError::transport(TransportErrorKind::Connect, "connection refused").into_response();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let problem: ErrorResponse = serde_json::from_slice(&body).unwrap();

    assert_eq!(problem.status, 502);
    assert_eq!(problem.title, "Transport Error");
    assert_eq!(problem.extensions["transport_kind"], "connect");
    let request_id = problem.request_id.expect("request id");
    assert_eq!(problem.instance, format!("/errors/{request_id}"));
}
