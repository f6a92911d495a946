// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A DOC must be referenced in the config file")]
    MissingDocument,

    #[error("API_KEY is not set or empty")]
    MissingCredential,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    /// Short remediation hint shown under the error message.
    pub fn hint(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "Check the path passed as <CONFIG>.",
            ConfigError::MissingDocument => "Add a line like `DOC = reports/fund.pdf` to the config file.",
            ConfigError::MissingCredential => "Export API_KEY with a completion API key before running.",
            ConfigError::InvalidValue { .. } => "DOC_HEADER/DOC_FOOTER take non-negative integers, DOC_COLCOUNT a positive integer.",
        }
    }
}

#[derive(Error, Debug)]
pub enum DocumentReadError {
    #[error("Could not open document {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Failed to read page {page}: {message}")]
    Page { page: usize, message: String },

    #[error("Page {page}: header ({header}) + footer ({footer}) exceed page height {height}")]
    Geometry {
        page: usize,
        header: f64,
        footer: f64,
        height: f64,
    },
}

/// A continuation page with no primary page before it. Reported, not fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Continuation page {page_number} has no preceding schedule page")]
pub struct DanglingContinuation {
    pub page_number: usize,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Completion API rejected the credential")]
    Unauthorized,

    #[error("Completion API rate limit exceeded")]
    RateLimited,

    #[error("Completion API returned no content")]
    EmptyResponse,

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Document read failed: {0}")]
    Document(#[from] DocumentReadError),

    #[error("Extraction service failed: {0}")]
    Service(#[from] ServiceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
