//! Error types and result type for the shamela crate.
//!
//! This module defines all error variants that can occur while ingesting a
//! Shamela book database. It uses the `snafu` library for ergonomic error
//! handling with automatic backtrace capture.
//!
//! # Error Variants
//!
//! - [`ShamelaError::SourceOpen`]: the source file is missing, truncated, or
//!   not a Jet/ACE database (also covers source driver failures; callers
//!   never see driver-specific types)
//! - [`ShamelaError::NoContentTable`]: table discovery found no plausible
//!   body-text table
//! - [`ShamelaError::DestinationUnavailable`]: the destination server could
//!   not be reached or refused authentication
//! - [`ShamelaError::SchemaMigration`]: the one-time destination schema
//!   repair could not complete
//! - [`ShamelaError::Destination`]: any other destination statement failure
//! - [`ShamelaError::Ingest`]: wraps a failure with the source filename
//!   attached
//!
//! Row-level duplicate-key failures are recoverable and are handled inside
//! the loader; they never surface as a variant of their own.

use std::io;
use snafu::{Snafu, Backtrace};

// Re-export snafu for context providers
pub use snafu;

/// Main error type for the shamela crate.
///
/// All errors include automatic backtrace capture for debugging purposes.
/// Use the helper methods on `ShamelaError` for convenient error
/// construction.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ShamelaError {
    /// I/O error occurred during file operations.
    #[snafu(display("IO error: {source}"))]
    Io {
        source: io::Error,
        backtrace: Backtrace,
    },

    /// The source book file cannot be opened or read.
    #[snafu(display("Cannot open source book {path}: {message}"))]
    SourceOpen {
        path: String,
        message: String,
        backtrace: Backtrace,
    },

    /// Table discovery found no plausible content table in the source file.
    #[snafu(display("No content table found in {path}"))]
    NoContentTable {
        path: String,
        backtrace: Backtrace,
    },

    /// The destination database could not be reached or authenticated.
    #[snafu(display("Destination unavailable: {source}"))]
    DestinationUnavailable {
        source: mysql::Error,
        backtrace: Backtrace,
    },

    /// The runtime destination schema repair failed.
    #[snafu(display("Schema migration failed: {message}"))]
    SchemaMigration {
        message: String,
        backtrace: Backtrace,
    },

    /// A destination statement failed for a non-recoverable reason.
    #[snafu(display("Destination error: {source}"))]
    Destination {
        source: mysql::Error,
        backtrace: Backtrace,
    },

    /// Error parsing JSON or another structured format.
    #[snafu(display("Parser error: {source}"))]
    Parser {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        backtrace: Backtrace,
    },

    /// Operation was interrupted by user.
    #[snafu(display("User interrupted"))]
    UserInterrupted {
        backtrace: Backtrace,
    },

    /// General error that doesn't fit other categories.
    #[snafu(display("General error: {message}"))]
    GeneralError {
        message: String,
        backtrace: Backtrace,
    },

    /// A failure during ingestion of one file, with the filename attached.
    #[snafu(display("Ingest of {file} failed: {source}"))]
    Ingest {
        file: String,
        #[snafu(source(from(ShamelaError, Box::new)))]
        source: Box<ShamelaError>,
        backtrace: Backtrace,
    },
}

// For automatic conversions from standard error types
impl From<io::Error> for ShamelaError {
    fn from(source: io::Error) -> Self {
        Self::Io { source, backtrace: Backtrace::capture() }
    }
}

impl From<mysql::Error> for ShamelaError {
    fn from(source: mysql::Error) -> Self {
        Self::Destination { source, backtrace: Backtrace::capture() }
    }
}

impl From<serde_json::Error> for ShamelaError {
    fn from(source: serde_json::Error) -> Self {
        Self::Parser { source: Box::new(source), backtrace: Backtrace::capture() }
    }
}

impl From<std::string::FromUtf8Error> for ShamelaError {
    fn from(source: std::string::FromUtf8Error) -> Self {
        Self::GeneralError { message: format!("Invalid UTF-8: {}", source), backtrace: Backtrace::capture() }
    }
}

/// Helper methods for creating errors without context providers.
impl ShamelaError {
    /// Creates a `SourceOpen` error for the given path.
    pub fn source_open<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::SourceOpen {
            path: path.into(),
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a `NoContentTable` error for the given path.
    pub fn no_content_table<P: Into<String>>(path: P) -> Self {
        Self::NoContentTable {
            path: path.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a `SchemaMigration` error with the given message.
    pub fn schema_migration<S: Into<String>>(message: S) -> Self {
        Self::SchemaMigration {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a `GeneralError` with the given message.
    pub fn general_error<S: Into<String>>(message: S) -> Self {
        Self::GeneralError {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a `UserInterrupted` error.
    pub fn user_interrupted() -> Self {
        Self::UserInterrupted {
            backtrace: Backtrace::capture(),
        }
    }

    /// Wraps an error with the source filename it occurred on.
    pub fn ingest<F: Into<String>>(file: F, source: ShamelaError) -> Self {
        Self::Ingest {
            file: file.into(),
            source: Box::new(source),
            backtrace: Backtrace::capture(),
        }
    }

    /// Checks if this error is a `NoContentTable` variant.
    pub fn is_no_content_table(&self) -> bool {
        if let ShamelaError::NoContentTable { .. } = self {
            return true;
        }
        false
    }

    /// Stable kind name for per-file status reporting.
    ///
    /// `Ingest` wrappers report the kind of the underlying failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IoError",
            Self::SourceOpen { .. } => "SourceOpenError",
            Self::NoContentTable { .. } => "NoContentTable",
            Self::DestinationUnavailable { .. } => "DestinationUnavailable",
            Self::SchemaMigration { .. } => "SchemaMigrationFailed",
            Self::Destination { .. } => "RowInsertOther",
            Self::Parser { .. } => "ParserError",
            Self::UserInterrupted { .. } => "UserInterrupted",
            Self::GeneralError { .. } => "GeneralError",
            Self::Ingest { source, .. } => source.kind(),
        }
    }
}

/// A specialized `Result` type for shamela operations.
///
/// This is a convenience type alias that uses [`ShamelaError`] as the error
/// type.
pub type Result<T> = std::result::Result<T, ShamelaError>;
