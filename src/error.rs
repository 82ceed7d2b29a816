//! Error types and result handling.
//!
//! Failures fall into a handful of classes (see [`ErrorClass`]). Configuration and
//! charset-conversion errors are always returned to the caller. Transport,
//! response-format and protocol errors are only returned when the client's
//! [`ExceptionPolicy`](crate::client::ExceptionPolicy) asks for them; otherwise
//! they are captured into a [`Response`](crate::Response) fault.

use crate::fault::Fault;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Errors produced by the RPC client and the charset converters.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    /// The option name is not in the client's fixed key set.
    #[error("Option {0} is not supported")]
    UnsupportedOption(String),

    /// The option exists but the value was rejected.
    #[error("Invalid value for option {option}: {reason}")]
    InvalidOption {
        /// Option name
        option: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The endpoint URI could not be parsed.
    #[error("Invalid URI {uri}: {reason}")]
    InvalidUri {
        /// The rejected URI
        uri: String,
        /// Parser message
        reason: String,
    },

    /// The charset pair is outside the supported matrix or needs a table that was never enabled.
    #[error("Converting from {src} to {dest}: {reason}")]
    UnsupportedConversion {
        /// Source charset label
        src: String,
        /// Destination charset label
        dest: String,
        /// Why the conversion is refused
        reason: &'static str,
    },

    /// The input declared as UTF-8 is not valid UTF-8.
    #[error("Malformed UTF-8 at byte {offset}: {reason}")]
    MalformedUtf8 {
        /// Offset of the offending lead byte
        offset: usize,
        /// What is wrong with the sequence
        reason: &'static str,
    },

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(Fault),

    /// HTTP-layer failure (connection, timeout, status, empty body).
    #[error("Transport error: {0}")]
    Transport(Fault),

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    ResponseFormat(Fault),

    /// The remote peer answered with a fault.
    #[error("Remote fault: {0}")]
    Protocol(Fault),

    /// A call produced a fault instead of a value.
    #[error("Call failed: {0}")]
    Fault(Fault),
}

/// Coarse classification of an [`RpcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Option, URI or request construction errors
    Configuration,
    /// Charset conversion errors
    Conversion,
    /// HTTP-layer failures
    Transport,
    /// Undecodable responses
    ResponseFormat,
    /// Faults declared by the remote peer
    Protocol,
    /// A captured fault unwrapped by `call`
    Call,
}

impl RpcError {
    /// Create an [`RpcError::InvalidOption`].
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        RpcError::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// The fault carried by this error, if it carries one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RpcError::InvalidRequest(fault)
            | RpcError::Transport(fault)
            | RpcError::ResponseFormat(fault)
            | RpcError::Protocol(fault)
            | RpcError::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Which class of failure this is.
    pub fn class(&self) -> ErrorClass {
        match self {
            RpcError::UnsupportedOption(_)
            | RpcError::InvalidOption { .. }
            | RpcError::InvalidUri { .. }
            | RpcError::InvalidRequest(_) => ErrorClass::Configuration,
            RpcError::UnsupportedConversion { .. } | RpcError::MalformedUtf8 { .. } => {
                ErrorClass::Conversion
            }
            RpcError::Transport(_) => ErrorClass::Transport,
            RpcError::ResponseFormat(_) => ErrorClass::ResponseFormat,
            RpcError::Protocol(_) => ErrorClass::Protocol,
            RpcError::Fault(_) => ErrorClass::Call,
        }
    }

    /// Check if the error came from the HTTP layer
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;

    #[test]
    fn test_fault_accessor() {
        let err = RpcError::Protocol(Fault::new(17, "boom"));
        assert_eq!(err.fault().map(|f| f.code), Some(17));
        assert_eq!(err.class(), ErrorClass::Protocol);

        let err = RpcError::UnsupportedOption("bogus".into());
        assert!(err.fault().is_none());
        assert_eq!(err.class(), ErrorClass::Configuration);
    }

    #[test]
    fn test_display() {
        let err = RpcError::Transport(Fault::from_kind(FaultKind::NoData));
        assert_eq!(err.to_string(), "Transport error: [6] No data received from server");
        assert!(err.is_transport());

        let err = RpcError::UnsupportedOption("bogus".into());
        assert_eq!(err.to_string(), "Option bogus is not supported");
    }
}
