#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # http_rpc: RPC over HTTP
//!
//! This crate implements the client side of HTTP-transported RPC protocols such as
//! XML-RPC and JSON-RPC. It does not serialize payloads itself: a
//! [`WireFormat`](protocol::WireFormat) builds the request body and the
//! [`ResponseDecoder`](protocol::ResponseDecoder) it attaches to each request decodes
//! the answer.
//!
//! ## Overview
//!
//! The crate is composed of two subsystems:
//!
//! 1. **Charset conversion** - Re-encode text between US-ASCII, ISO-8859-1, UTF-8 and
//!    windows-1252, replacing characters the target cannot carry with XML character
//!    references or JSON `\u` escapes
//! 2. **Dispatch pipeline** - Build the HTTP request, send it, decode the response, and
//!    turn every failure into a numbered fault
//!
//! A call always produces a [`Response`] holding either a value or a [`Fault`](fault::Fault).
//! The [`ExceptionPolicy`](client::ExceptionPolicy) decides which failure classes are
//! returned as [`RpcError`]s instead.
//!
//! ## Fault Codes
//!
//! | Code | Name | Raised when |
//! |------|------|-------------|
//! | 2 | `invalid_return` | The response body cannot be decoded |
//! | 5 | `http_error` | The server answered with a non-2xx status |
//! | 6 | `no_data` | The response body is empty |
//! | 7 | `no_tls` | TLS negotiation failed |
//! | 8 | `transport_failure` | Connecting or reading failed |
//! | 16 | `no_transport` | No HTTP transport is available |
//! | 103 | `cannot_decompress` | Unknown response `Content-Encoding` |
//! | 104 | `decompress_fail` | Corrupt compressed response |
//!
//! See [`fault::FaultKind`] for the full registry.
//!
//! ## Client Usage
//!
//! ```ignore
//! use http_rpc::{RpcClient, Value};
//! use http_rpc::client::ExceptionPolicy;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::builder("http://localhost:8080/RPC2", Arc::new(MyFormat))
//!         .option("exceptionPolicy", ExceptionPolicy::TRANSPORT)
//!         .option("requestCompression", "gzip")
//!         .build()?;
//!
//!     let response = client.send(&client.create_request("echo", vec![Value::from("hi")], Default::default())?).await?;
//!     match response.fault() {
//!         Some(fault) => eprintln!("fault {}: {}", fault.code, fault.message),
//!         None => println!("{:?}", response.value()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Request, Response and decoding options
//! - **[error]** - Error types and result handling
//! - **[fault]** - Fault registry and fault values
//! - **[client]** - The RPC client, options and HTTP collaborators
//! - **[charset]** - Charset conversion with entity encoding
//! - **[protocol]** - Wire-format traits, constants and header helpers

pub mod charset;
pub mod client;
pub mod error;
pub mod fault;
pub mod protocol;
pub mod types;

pub use charset::{CharsetConverter, ConverterRegistry, EntityFormat};
pub use client::{ClientOptions, ExceptionPolicy, RpcClient};
pub use error::{ErrorClass, Result, RpcError};
pub use fault::{Fault, FaultKind};
pub use types::{Request, Response, ReturnType, Value};
