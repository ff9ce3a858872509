use std::path::PathBuf;
use thiserror::Error;

use crate::report::ReportType;

#[derive(Error, Debug)]
pub enum MessError {
    #[error("Config directory not found at {0}. Run 'mess init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Unknown report type '{0}'. Use inventory, consumption, expense, menu or billing.")]
    UnknownReportType(String),

    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Server returned {status} for {url}: {message}")]
    Server {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Authentication failed. Update api.token in config.toml or set MESS_API_TOKEN.")]
    Unauthorized,

    #[error("Malformed {kind} report payload: {source}")]
    Payload {
        kind: ReportType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read view state {path}: {source}")]
    ViewState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write CSV: {0}")]
    Export(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MessError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        MessError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MessError>;
