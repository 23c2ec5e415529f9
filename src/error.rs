//! Error types for donotshout
//!
//! Errors are grouped by subsystem. Configuration problems are always fatal
//! at startup; responder errors carry a fatality flag so the server shell
//! can tell a lost write apart from a broken codec.

use std::io;
use std::net::SocketAddr;

use hickory_proto::error::ProtoError;
use thiserror::Error;

/// Top-level error type for donotshout
#[derive(Debug, Error)]
pub enum DoNotShoutError {
    /// Configuration errors (file parsing, validation, environment)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Responder and server shell errors
    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (out-of-range values, unresolvable listen address)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// I/O error while reading or writing config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}

/// Errors raised while answering queries or running the server shell
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The synthetic answer could not be serialized
    #[error("Failed to encode answer: {0}")]
    Encode(#[from] ProtoError),

    /// Writing the response back to the requester failed
    #[error("Failed to write response: {0}")]
    Write(#[source] io::Error),

    /// Binding the listening socket failed
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl ResponderError {
    /// Encode and bind failures end the process; a failed write only ends the query.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Encode(_) | Self::Bind { .. } => true,
            Self::Write(_) => false,
        }
    }
}
