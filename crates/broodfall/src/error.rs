//! # Broodfall Error Types
//!
//! The tick loop never fails. Errors only come out of construction and
//! configuration.

use thiserror::Error;

/// Errors that can occur while setting up the swarm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroodError {
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read or parsed.
    #[error("failed to read config {path}: {reason}")]
    ConfigRead {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O or parse error.
        reason: String,
    },
}

/// Result type for swarm setup.
pub type BroodResult<T> = Result<T, BroodError>;
