//! Error types shared across the crate.

use thiserror::Error;

/// A probe or application configuration that cannot be used.
///
/// These are raised to the host instead of being folded into an unavailable
/// outcome: a broken configuration is not a statement about the target.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Probe '{name}': TCP target '{url}' must be in format host:port")]
    InvalidTcpTarget { name: String, url: String },

    #[error("Probe '{name}': invalid port in '{url}', expected 1-65535")]
    InvalidPort { name: String, url: String },

    #[error("Probe '{name}': invalid URL '{url}': {source}")]
    InvalidUrl {
        name: String,
        url: String,
        source: url::ParseError,
    },

    #[error("Probe '{name}': invalid proxy '{proxy}': {reason}")]
    InvalidProxy {
        name: String,
        proxy: String,
        reason: String,
    },

    #[error("Probe '{name}': invalid {field} regex: {source}")]
    InvalidPattern {
        name: String,
        field: &'static str,
        source: regex::Error,
    },

    #[error("Probe '{name}': timeout must be at least 1 second")]
    ZeroTimeout { name: String },

    #[error("Probe '{name}' has entityid set but {missing} is not configured")]
    MissingAlertCredentials { name: String, missing: &'static str },
}

/// Failure to set up a probe execution. Network problems are never reported
/// through this type; they end up in the outcome's failure reason.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Failure to deliver an availability event.
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Event request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Event endpoint rejected the event: {status} - {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Failure to push buffered samples to Mimir.
#[derive(Error, Debug)]
pub enum MimirError {
    #[error("Failed to encode write request: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("Failed to compress write request: {0}")]
    Compress(#[from] snap::Error),

    #[error("Invalid tenant header: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to push to Mimir: {status} - {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}
