//! Error handling for WHOIS lookups.
//!
//! This module defines a single error type covering every way a lookup can
//! fail, from an unreachable registry host to a missing server for the zone.
//! A reply that cannot be decoded is *not* an error: decoders report it as an
//! absent record.

use std::fmt;

/// Main error type for lookup operations.
#[derive(Debug, Clone)]
pub enum WhoisError {
    /// Transport-level failure: unreachable host, timeout, write/read failure.
    ///
    /// Swallowed per attempt, surfaced only when the whole chain produced no record.
    Connection {
        host: String,
        message: String,
        source: Option<String>,
    },

    /// The server answered but flagged a rate limit or an invalid state.
    Protocol { host: String, message: String },

    /// No configured server matches the domain
    ServerMismatch { domain: String },

    /// Every candidate server produced neither a response nor a record
    NoResponse { domain: String },

    /// Query template is unusable
    InvalidFormat { format: String, reason: String },

    /// Domain could not be normalized
    InvalidDomain { domain: String, reason: String },

    /// Decoder name not recognized
    UnknownDecoder { name: String },

    /// Configuration errors (invalid settings, bad TOML)
    ConfigError { message: String },

    /// File I/O errors when reading config or saved replies
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl WhoisError {
    /// Create a new connection error.
    pub fn connection<H: Into<String>, M: Into<String>>(host: H, message: M) -> Self {
        Self::Connection {
            host: host.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a new connection error with source information.
    pub fn connection_with_source<H: Into<String>, M: Into<String>, S: Into<String>>(
        host: H,
        message: M,
        source: S,
    ) -> Self {
        Self::Connection {
            host: host.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new protocol error.
    pub fn protocol<H: Into<String>, M: Into<String>>(host: H, message: M) -> Self {
        Self::Protocol {
            host: host.into(),
            message: message.into(),
        }
    }

    pub fn server_mismatch<D: Into<String>>(domain: D) -> Self {
        Self::ServerMismatch {
            domain: domain.into(),
        }
    }

    pub fn no_response<D: Into<String>>(domain: D) -> Self {
        Self::NoResponse {
            domain: domain.into(),
        }
    }

    /// Create a new invalid query format error.
    pub fn invalid_format<F: Into<String>, R: Into<String>>(format: F, reason: R) -> Self {
        Self::InvalidFormat {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_decoder<N: Into<String>>(name: N) -> Self {
        Self::UnknownDecoder { name: name.into() }
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

    /// Whether this is a transport failure that a later attempt may recover from.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Whether the server itself refused the query (rate limit, invalid state).
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

impl fmt::Display for WhoisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection {
                host,
                message,
                source,
            } => {
                if let Some(source) = source {
                    write!(f, "Connection to '{}' failed: {} (source: {})", host, message, source)
                } else {
                    write!(f, "Connection to '{}' failed: {}", host, message)
                }
            }
            Self::Protocol { host, message } => {
                write!(f, "WHOIS server '{}' rejected the query: {}", host, message)
            }
            Self::ServerMismatch { domain } => {
                write!(f, "No servers matched for domain '{}'", domain)
            }
            Self::NoResponse { domain } => {
                write!(f, "No response for domain '{}'", domain)
            }
            Self::InvalidFormat { format, reason } => {
                write!(f, "Invalid query format {:?}: {}", format, reason)
            }
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::UnknownDecoder { name } => {
                write!(f, "Unknown decoder '{}'", name)
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

impl std::error::Error for WhoisError {}

impl From<serde_json::Error> for WhoisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for WhoisError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<std::io::Error> for WhoisError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<regex::Error> for WhoisError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(WhoisError::connection("whois.test", "timed out").is_connection());
        assert!(!WhoisError::connection("whois.test", "timed out").is_protocol());
        assert!(WhoisError::protocol("whois.test", "LIMIT EXCEEDED").is_protocol());
        assert!(!WhoisError::server_mismatch("example.test").is_connection());
    }

    #[test]
    fn test_display_messages() {
        let err = WhoisError::connection_with_source("whois.test", "read failed", "reset by peer");
        assert_eq!(
            err.to_string(),
            "Connection to 'whois.test' failed: read failed (source: reset by peer)"
        );
        assert_eq!(
            WhoisError::server_mismatch("example.zz").to_string(),
            "No servers matched for domain 'example.zz'"
        );
        assert_eq!(
            WhoisError::no_response("example.test").to_string(),
            "No response for domain 'example.test'"
        );
    }
}
