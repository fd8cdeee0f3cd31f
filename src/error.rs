use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema loading error: {path} - {details}")]
    SchemaLoad { path: PathBuf, details: String },

    #[error("Schema set compilation failed: {details}")]
    SchemaCompile { details: String },

    #[error("{file}: {details}")]
    DocumentParse { file: PathBuf, details: String },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },
}

impl ValidationError {
    /// Errors that abandon the remaining documents of a batch instead of
    /// failing the whole run.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            ValidationError::DocumentParse { .. } | ValidationError::LibXml2Internal { .. }
        )
    }
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: {}", join_messages(.messages))]
    SchemaParseFailed { messages: Vec<String> },

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("Parser context creation failed")]
    ParserContextCreationFailed,

    #[error("File validation failed with code {code}: {file}")]
    ValidationFailed { code: i32, file: PathBuf },

    #[error("{details}")]
    NotWellFormed { details: String },

    #[error("Path is not valid UTF-8 or contains a NUL byte: {path}")]
    InvalidPath { path: PathBuf },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,
}

fn join_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "no diagnostics reported".to_string()
    } else {
        messages.join("; ")
    }
}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}

impl From<LibXml2Error> for ValidationError {
    fn from(err: LibXml2Error) -> Self {
        ValidationError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
