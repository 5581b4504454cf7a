//! Error types for the routedrift library
//!
//! Startup failures (bad input, unreachable routing engine) abort a run;
//! everything else is handled per-address and reflected in the run stats.

use std::fmt;

/// Main error type for routedrift operations
#[derive(Debug)]
pub enum Error {
    /// Invalid or missing input data (addresses, origin, configuration)
    InvalidInput(String),

    /// Routing engine failed the upfront connectivity probe
    RoutingUnavailable(String),

    /// HTTP-specific error (non-success status, unusable response)
    HttpError(String),

    /// Network connectivity issues (connect failure, timeout)
    NetworkError(String),

    /// Malformed or unexpected payload from the routing engine
    ParseError(String),

    /// File I/O error
    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            Error::RoutingUnavailable(msg) => {
                write!(f, "Routing engine unavailable: {}", msg)
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {}", msg)
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::ParseError(msg) => {
                write!(f, "Malformed routing response: {}", msg)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

/// Convenience result type for routedrift operations
pub type Result<T> = std::result::Result<T, Error>;
