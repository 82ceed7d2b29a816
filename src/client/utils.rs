//! Utility functions for the RPC client.
//!
//! This module provides helpers for:
//! - Request body compression and response body decompression
//! - Basic authentication headers
//! - Status code classification

use crate::client::config::Compression;
use crate::error::{Result, RpcError};
use crate::fault::{Fault, FaultKind};
use base64::Engine;
use bytes::Bytes;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use std::io::{Read, Write};

/// Compress a request body.
///
/// `deflate` produces a zlib-wrapped stream, as HTTP's `Content-Encoding: deflate` requires.
///
/// # Examples
///
/// ```
/// use http_rpc::client::{compress_body, decompress_body, Compression};
///
/// let packed = compress_body(b"<methodCall/>", Compression::Gzip).unwrap();
/// let unpacked = decompress_body(&packed, "gzip").unwrap();
/// assert_eq!(&unpacked[..], b"<methodCall/>");
/// ```
pub fn compress_body(body: &[u8], compression: Compression) -> Result<Bytes> {
    let level = flate2::Compression::default();
    let packed = match compression {
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(body).and_then(|_| encoder.finish())
        }
        Compression::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder.write_all(body).and_then(|_| encoder.finish())
        }
    };

    packed
        .map(Bytes::from)
        .map_err(|e| RpcError::InvalidRequest(Fault::with_detail(FaultKind::InvalidRequest, e.to_string())))
}

/// Undo a response `Content-Encoding`.
///
/// `identity` and an empty encoding return the body unchanged.
///
/// # Errors
///
/// `cannot_decompress` (103) for an unknown encoding, `decompress_fail` (104) for a
/// corrupt stream.
pub fn decompress_body(body: &[u8], encoding: &str) -> std::result::Result<Bytes, Fault> {
    let encoding = encoding.trim().to_ascii_lowercase();
    let mut out = Vec::new();

    let read = match encoding.as_str() {
        "" | "identity" => return Ok(Bytes::copy_from_slice(body)),
        "gzip" | "x-gzip" => GzDecoder::new(body).read_to_end(&mut out),
        "deflate" => ZlibDecoder::new(body).read_to_end(&mut out),
        other => {
            return Err(Fault::with_detail(
                FaultKind::CannotDecompress,
                format!("({})", other),
            ))
        }
    };

    read.map(|_| Bytes::from(out))
        .map_err(|e| Fault::with_detail(FaultKind::DecompressFail, e.to_string()))
}

/// `Authorization` value for HTTP basic authentication.
///
/// ```
/// use http_rpc::client::basic_auth_header;
///
/// assert_eq!(basic_auth_header("user", "pass"), "Basic dXNlcjpwYXNz");
/// ```
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

/// Check if status code is a 2xx success
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
