//! Error handling for IP identification.
//!
//! Every failure a caller can see falls into one of two user-facing kinds:
//! the input was not an IP address, or the RDAP lookup did not produce an
//! answer. Configuration problems form a third kind used by the CLI.

use std::fmt;
use std::time::Duration;

/// Main error type for identification operations.
#[derive(Debug, Clone)]
pub enum IdentifyError {
    /// Input string is not a valid IPv4 or IPv6 address
    InvalidAddress { input: String, reason: String },

    /// Network-related errors (connection refused, DNS, TLS, ...)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The RDAP server answered but not with a usable record
    RdapError {
        address: String,
        message: String,
        status_code: Option<u16>,
    },

    /// IANA bootstrap registry could not be fetched or understood
    BootstrapError { message: String },

    /// JSON parsing errors for RDAP responses
    ParseError { message: String },

    /// The record was fetched but no registrant name could be found in it
    MissingRegistrant { address: String },

    /// Timeout while waiting for the RDAP server
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Configuration errors (invalid settings, unknown registry, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration files
    FileError { path: String, message: String },

    /// Errors that don't fit any other category
    Internal { message: String },
}

/// Coarse classification of an [`IdentifyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The address could not be parsed
    InvalidInput,
    /// Network, protocol or record-content failure
    LookupFailure,
    /// Bad configuration file, environment variable or flag value
    Configuration,
}

impl IdentifyError {
    /// Create a new invalid address error.
    pub fn invalid_address<I: Into<String>, R: Into<String>>(input: I, reason: R) -> Self {
        Self::InvalidAddress {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new RDAP error.
    pub fn rdap<A: Into<String>, M: Into<String>>(address: A, message: M) -> Self {
        Self::RdapError {
            address: address.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new RDAP error with HTTP status code.
    pub fn rdap_with_status<A: Into<String>, M: Into<String>>(
        address: A,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::RdapError {
            address: address.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new bootstrap error.
    pub fn bootstrap<M: Into<String>>(message: M) -> Self {
        Self::BootstrapError {
            message: message.into(),
        }
    }

    /// Create a new missing registrant error.
    pub fn missing_registrant<A: Into<String>>(address: A) -> Self {
        Self::MissingRegistrant {
            address: address.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Which of the user-facing error kinds this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddress { .. } => ErrorKind::InvalidInput,
            Self::ConfigError { .. } | Self::FileError { .. } => ErrorKind::Configuration,
            Self::NetworkError { .. }
            | Self::RdapError { .. }
            | Self::BootstrapError { .. }
            | Self::ParseError { .. }
            | Self::MissingRegistrant { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => ErrorKind::LookupFailure,
        }
    }

    /// True for every error that came out of the RDAP lookup step.
    pub fn is_lookup_failure(&self) -> bool {
        self.kind() == ErrorKind::LookupFailure
    }

    /// HTTP status code returned by the RDAP server, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RdapError { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { input, reason } => {
                write!(f, "'{}' does not appear to be an IPv4 or IPv6 address: {}", input, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::RdapError {
                address,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "RDAP lookup failed for '{}' (HTTP {}): {}", address, code, message)
                } else {
                    write!(f, "RDAP lookup failed for '{}': {}", address, message)
                }
            }
            Self::BootstrapError { message } => {
                write!(f, "Bootstrap error: {}", message)
            }
            Self::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            Self::MissingRegistrant { address } => {
                write!(f, "registrant not found for IP Address {}", address)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for IdentifyError {}

impl From<reqwest::Error> for IdentifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for IdentifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<std::io::Error> for IdentifyError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
