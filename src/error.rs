//! Error taxonomy.
//!
//! `ConfigError` is fatal at startup. Auth, query and update errors are
//! caught at the cycle boundary and end the current cycle only.
//! `NotifyError` is logged and dropped.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Marketplace credentials not provided")]
    MissingCredentials,

    #[error("Marketplace login rejected: {0}")]
    Rejected(String),

    #[error("Marketplace login request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed login response: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Marketplace session expired")]
    SessionExpired,

    #[error("Listing query failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Listing query returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse listings: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Marketplace session expired")]
    SessionExpired,

    #[error("Price update request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Price update rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Telegram API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Telegram API returned an error: {0}")]
    Api(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Required configuration '{0}' is missing or empty")]
    Missing(&'static str),

    #[error("Invalid configuration '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Environment variable not set: {0}")]
    MissingEnv(String),
}
