//! services/console/src/error.rs
//!
//! Defines the primary error type for the console service.

use quizr_console_core::ApiError;

use crate::config::ConfigError;

/// The primary error type for the `console` service.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core ports.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Represents a standard Input/Output error (e.g. reading the terminal).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
