//! Error types for findings export

use thiserror::Error;

/// Errors raised while configuring, serializing or writing an export.
///
/// Markup conversion and section building never fail; everything here
/// comes from the output side or from reading configuration/input files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container error while writing the .docx package
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for findings export
pub type Result<T> = std::result::Result<T, ExportError>;
