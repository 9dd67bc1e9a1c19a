//! Structured error types for configuration loading and lookups.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors
    InvalidPath,
    InvalidLoader,
    NotAnObject,

    // Lookup errors
    NoSuchPath,
    UnsupportedExtension,

    // Structural errors in a config directory
    DuplicateKey,
    CyclicPath,

    // I/O and decoding errors
    ReadFailed,
    ParseFailed,

    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::InvalidPath => "invalid path",
            ErrorCode::InvalidLoader => "invalid loader",
            ErrorCode::NotAnObject => "not an object",
            ErrorCode::NoSuchPath => "no such path",
            ErrorCode::UnsupportedExtension => "unsupported extension",
            ErrorCode::DuplicateKey => "duplicate key",
            ErrorCode::CyclicPath => "cyclic path",
            ErrorCode::ReadFailed => "read failed",
            ErrorCode::ParseFailed => "parse failed",
            ErrorCode::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Structured error for every fallible operation in the crate.
///
/// `path` holds the offending key path or filesystem path, `message` the reason.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            details: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Whether this error aborts a whole directory walk rather than just
    /// excluding the entry that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self.code, ErrorCode::DuplicateKey | ErrorCode::CyclicPath)
    }

    // Convenience constructors

    pub fn invalid_path(path: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidPath,
            format!("Invalid path '{}': {}", path, reason),
        )
        .with_path(path)
    }

    pub fn invalid_loader(extension: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::InvalidLoader,
            format!("Invalid loader for '{}': {}", extension, reason),
        )
        .with_path(extension)
    }

    pub fn not_an_object(path: &str, found: &str) -> Self {
        Self::new(
            ErrorCode::NotAnObject,
            format!("Expected an object at '{}', found {}", path, found),
        )
        .with_path(path)
    }

    pub fn no_such_path(path: &str) -> Self {
        Self::new(ErrorCode::NoSuchPath, format!("No such path: {}", path)).with_path(path)
    }

    pub fn unsupported_extension(file: &Path) -> Self {
        Self::new(
            ErrorCode::UnsupportedExtension,
            format!("No loader registered for {}", file.display()),
        )
        .with_path(file.display().to_string())
    }

    pub fn duplicate_key(key: &str, dir: &Path) -> Self {
        Self::new(
            ErrorCode::DuplicateKey,
            format!(
                "Key '{}' is contributed by more than one entry in {}",
                key,
                dir.display()
            ),
        )
        .with_path(dir.join(key).display().to_string())
    }

    pub fn cyclic_path(dir: &Path) -> Self {
        Self::new(
            ErrorCode::CyclicPath,
            format!("Directory {} is already being composed", dir.display()),
        )
        .with_path(dir.display().to_string())
    }

    pub fn read_failed(file: &Path, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ReadFailed,
            format!("Can not read config path {}", file.display()),
        )
        .with_path(file.display().to_string())
        .with_details(err.to_string())
    }

    pub fn parse_failed(file: &Path, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ParseFailed,
            format!("Failed to parse {}", file.display()),
        )
        .with_path(file.display().to_string())
        .with_details(err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Internal, err.to_string())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
