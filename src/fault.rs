//! Fault registry.
//!
//! Every failure the client can report carries a [`Fault`]: a numeric code plus a
//! human-readable message. Client-side failures are built from a [`FaultKind`], whose
//! code and default message come from a fixed registry. Faults declared by the remote
//! peer are built with [`Fault::new`] and keep whatever code the server sent.
//!
//! # Registry
//!
//! | Kind | Code | Default message |
//! |------|------|-----------------|
//! | `unknown_method` | 1 | Unknown method |
//! | `invalid_return` | 2 | Invalid response payload |
//! | `incorrect_params` | 3 | Incorrect parameters passed to method |
//! | `http_error` | 5 | Didn't receive 200 OK from remote server |
//! | `no_data` | 6 | No data received from server |
//! | `transport_failure` | 8 | HTTP transport error |
//! | `server_error` | 17 | Internal server error |
//! | `decompress_fail` | 104 | Received from server invalid compressed HTTP |
//!
//! The full table lives in [`FaultKind::ALL`]. The numbers are a wire compatibility
//! surface and must never change.
//!
//! # Examples
//!
//! ```
//! use http_rpc::fault::{Fault, FaultKind};
//!
//! let fault = Fault::with_detail(FaultKind::HttpError, "(HTTP 503)");
//! assert_eq!(fault.code, 5);
//! assert_eq!(fault.message, "Didn't receive 200 OK from remote server (HTTP 503)");
//! assert_eq!(fault.kind(), Some(FaultKind::HttpError));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbolic kind of a client-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The remote server does not know the method.
    UnknownMethod,
    /// The response payload could not be decoded.
    InvalidReturn,
    /// Parameters did not match what the method expects.
    IncorrectParams,
    /// Introspection was requested for an unknown method.
    IntrospectUnknown,
    /// The server answered with a non-success HTTP status.
    HttpError,
    /// The server answered with an empty body.
    NoData,
    /// TLS was required but is not available.
    NoTls,
    /// The HTTP transport failed (connection, timeout, I/O).
    TransportFailure,
    /// The request payload is invalid.
    InvalidRequest,
    /// No HTTP transport is available to send the request.
    NoTransport,
    /// The server hit an internal error.
    ServerError,
    /// A batched call returned an invalid response.
    MulticallError,
    /// A batched call entry is not a struct.
    MulticallNotStruct,
    /// A batched call entry has no method name.
    MulticallNoMethod,
    /// A batched call entry has a non-string method name.
    MulticallNotString,
    /// Batched calls cannot nest.
    MulticallRecursion,
    /// A batched call entry has no params.
    MulticallNoParams,
    /// A batched call entry has non-array params.
    MulticallNotArray,
    /// The response is compressed with an unsupported encoding.
    CannotDecompress,
    /// The compressed response is corrupt.
    DecompressFail,
    /// The chunked response is corrupt.
    DechunkFail,
    /// The server cannot decompress the request.
    ServerCannotDecompress,
    /// The server found the compressed request corrupt.
    ServerDecompressFail,
}

impl FaultKind {
    /// Every registered kind, in code order.
    pub const ALL: [FaultKind; 23] = [
        FaultKind::UnknownMethod,
        FaultKind::InvalidReturn,
        FaultKind::IncorrectParams,
        FaultKind::IntrospectUnknown,
        FaultKind::HttpError,
        FaultKind::NoData,
        FaultKind::NoTls,
        FaultKind::TransportFailure,
        FaultKind::MulticallNotStruct,
        FaultKind::MulticallNoMethod,
        FaultKind::MulticallNotString,
        FaultKind::MulticallRecursion,
        FaultKind::MulticallNoParams,
        FaultKind::MulticallNotArray,
        FaultKind::InvalidRequest,
        FaultKind::NoTransport,
        FaultKind::ServerError,
        FaultKind::MulticallError,
        FaultKind::CannotDecompress,
        FaultKind::DecompressFail,
        FaultKind::DechunkFail,
        FaultKind::ServerCannotDecompress,
        FaultKind::ServerDecompressFail,
    ];

    /// Stable numeric code.
    pub const fn code(self) -> i32 {
        match self {
            FaultKind::UnknownMethod => 1,
            FaultKind::InvalidReturn => 2,
            FaultKind::IncorrectParams => 3,
            FaultKind::IntrospectUnknown => 4,
            FaultKind::HttpError => 5,
            FaultKind::NoData => 6,
            FaultKind::NoTls => 7,
            FaultKind::TransportFailure => 8,
            FaultKind::MulticallNotStruct => 9,
            FaultKind::MulticallNoMethod => 10,
            FaultKind::MulticallNotString => 11,
            FaultKind::MulticallRecursion => 12,
            FaultKind::MulticallNoParams => 13,
            FaultKind::MulticallNotArray => 14,
            FaultKind::InvalidRequest => 15,
            FaultKind::NoTransport => 16,
            FaultKind::ServerError => 17,
            FaultKind::MulticallError => 18,
            FaultKind::CannotDecompress => 103,
            FaultKind::DecompressFail => 104,
            FaultKind::DechunkFail => 105,
            FaultKind::ServerCannotDecompress => 106,
            FaultKind::ServerDecompressFail => 107,
        }
    }

    /// Default human-readable message.
    pub const fn default_message(self) -> &'static str {
        match self {
            FaultKind::UnknownMethod => "Unknown method",
            FaultKind::InvalidReturn => "Invalid response payload (enable the debug option to allow analysis of the response)",
            FaultKind::IncorrectParams => "Incorrect parameters passed to method",
            FaultKind::IntrospectUnknown => "Can't introspect: method unknown",
            FaultKind::HttpError => "Didn't receive 200 OK from remote server",
            FaultKind::NoData => "No data received from server",
            FaultKind::NoTls => "No TLS support available",
            FaultKind::TransportFailure => "HTTP transport error",
            FaultKind::InvalidRequest => "Invalid request payload",
            FaultKind::NoTransport => "No HTTP transport available",
            FaultKind::ServerError => "Internal server error",
            FaultKind::MulticallError => "Received from server invalid multicall response",
            FaultKind::MulticallNotStruct => "system.multicall expected struct",
            FaultKind::MulticallNoMethod => "Missing methodName",
            FaultKind::MulticallNotString => "methodName is not a string",
            FaultKind::MulticallRecursion => "Recursive system.multicall forbidden",
            FaultKind::MulticallNoParams => "Missing params",
            FaultKind::MulticallNotArray => "params is not an array",
            FaultKind::CannotDecompress => "Received from server compressed HTTP and cannot decompress",
            FaultKind::DecompressFail => "Received from server invalid compressed HTTP",
            FaultKind::DechunkFail => "Received from server invalid chunked HTTP",
            FaultKind::ServerCannotDecompress => "Received from client compressed HTTP request and cannot decompress",
            FaultKind::ServerDecompressFail => "Received from client invalid compressed HTTP request",
        }
    }

    /// Symbolic name, e.g. `"http_error"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            FaultKind::UnknownMethod => "unknown_method",
            FaultKind::InvalidReturn => "invalid_return",
            FaultKind::IncorrectParams => "incorrect_params",
            FaultKind::IntrospectUnknown => "introspect_unknown",
            FaultKind::HttpError => "http_error",
            FaultKind::NoData => "no_data",
            FaultKind::NoTls => "no_tls",
            FaultKind::TransportFailure => "transport_failure",
            FaultKind::InvalidRequest => "invalid_request",
            FaultKind::NoTransport => "no_transport",
            FaultKind::ServerError => "server_error",
            FaultKind::MulticallError => "multicall_error",
            FaultKind::MulticallNotStruct => "multicall_notstruct",
            FaultKind::MulticallNoMethod => "multicall_nomethod",
            FaultKind::MulticallNotString => "multicall_notstring",
            FaultKind::MulticallRecursion => "multicall_recursion",
            FaultKind::MulticallNoParams => "multicall_noparams",
            FaultKind::MulticallNotArray => "multicall_notarray",
            FaultKind::CannotDecompress => "cannot_decompress",
            FaultKind::DecompressFail => "decompress_fail",
            FaultKind::DechunkFail => "dechunk_fail",
            FaultKind::ServerCannotDecompress => "server_cannot_decompress",
            FaultKind::ServerDecompressFail => "server_decompress_fail",
        }
    }

    /// Reverse lookup by numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown fault kind: {}", s))
    }
}

/// A structured RPC failure: `{code, message}`.
///
/// The same value is used whether the failure is returned as an error or embedded
/// in a [`Response`](crate::Response).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fault {
    /// Numeric fault code
    pub code: i32,
    /// Human-readable description
    pub message: String,
}

impl Fault {
    /// Create a fault with an arbitrary code, typically one declared by the remote peer.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Fault {
            code,
            message: message.into(),
        }
    }

    /// Create a fault from the registry with its default message.
    pub fn from_kind(kind: FaultKind) -> Self {
        Fault::new(kind.code(), kind.default_message())
    }

    /// Create a fault from the registry, appending `detail` after a single space.
    ///
    /// An empty `detail` leaves the default message untouched.
    pub fn with_detail(kind: FaultKind, detail: impl AsRef<str>) -> Self {
        let detail = detail.as_ref();
        if detail.is_empty() {
            return Fault::from_kind(kind);
        }
        Fault::new(kind.code(), format!("{} {}", kind.default_message(), detail))
    }

    /// The registry kind matching this fault's code, if any.
    pub fn kind(&self) -> Option<FaultKind> {
        FaultKind::from_code(self.code)
    }
}

impl From<FaultKind> for Fault {
    fn from(kind: FaultKind) -> Self {
        Fault::from_kind(kind)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_codes() {
        assert_eq!(FaultKind::UnknownMethod.code(), 1);
        assert_eq!(FaultKind::InvalidReturn.code(), 2);
        assert_eq!(FaultKind::IncorrectParams.code(), 3);
        assert_eq!(FaultKind::HttpError.code(), 5);
        assert_eq!(FaultKind::NoData.code(), 6);
        assert_eq!(FaultKind::NoTls.code(), 7);
        assert_eq!(FaultKind::TransportFailure.code(), 8);
        assert_eq!(FaultKind::InvalidRequest.code(), 15);
        assert_eq!(FaultKind::ServerError.code(), 17);
        assert_eq!(FaultKind::MulticallNotStruct.code(), 9);
        assert_eq!(FaultKind::MulticallError.code(), 18);
        assert_eq!(FaultKind::CannotDecompress.code(), 103);
        assert_eq!(FaultKind::ServerDecompressFail.code(), 107);
    }

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<i32> = FaultKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), FaultKind::ALL.len());
    }

    #[test]
    fn test_symbolic_names_round_trip() {
        for kind in FaultKind::ALL {
            assert_eq!(kind.as_str().parse::<FaultKind>().unwrap(), kind);
        }
        assert!("bogus".parse::<FaultKind>().is_err());
    }

    #[test]
    fn test_with_detail_appends_suffix() {
        let fault = Fault::with_detail(FaultKind::TransportFailure, "connection refused");
        assert_eq!(fault.code, 8);
        assert_eq!(fault.message, "HTTP transport error connection refused");
    }

    #[test]
    fn test_with_empty_detail() {
        let fault = Fault::with_detail(FaultKind::NoData, "");
        assert_eq!(fault, Fault::from_kind(FaultKind::NoData));
    }

    #[test]
    fn test_remote_fault_kind_lookup() {
        assert_eq!(Fault::new(17, "boom").kind(), Some(FaultKind::ServerError));
        assert_eq!(Fault::new(4242, "custom").kind(), None);
    }
}
