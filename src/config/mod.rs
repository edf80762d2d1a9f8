// src/config/mod.rs

pub mod app;
pub mod loader;
pub mod validation;

pub use app::{AppConfig, ServerConfig, TlsConfig, UpstreamConfig};
pub use loader::{load_config, load_unvalidated};
pub use validation::ConfigValidator;
