//! HTTP RPC client implementation.
//!
//! This module turns a method name and parameters into an HTTP exchange and
//! the HTTP response back into a [`Response`](crate::Response):
//!
//! - **Build requests** through the client's [`WireFormat`](crate::protocol::WireFormat)
//!   or an injected [`RequestFactory`](crate::protocol::RequestFactory)
//! - **Dispatch** through an injected [`HttpTransport`] or the built-in [`ReqwestTransport`]
//! - **Capture failures** as faults, or return them as errors per [`ExceptionPolicy`]
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── dispatch   - RpcClient and the send pipeline
//! ├── config     - Validated options, exception policy, transport mode
//! ├── transport  - HTTP request/response shapes and transports
//! ├── logging    - Injected leveled logger
//! └── utils      - Compression and header helpers
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RpcClient`] | The client |
//! | [`ClientOptions`] | Option map with a fixed key set |
//! | [`ExceptionPolicy`] | Which failure classes are returned as errors |
//! | [`HttpTransport`] | Sends one HTTP request |
//! | [`Logger`] | Receives client log messages |
//!
//! # Examples
//!
//! ## Configuring Options
//!
//! ```
//! use http_rpc::client::{ClientOptions, ExceptionPolicy, TransportMode};
//!
//! let mut options = ClientOptions::default();
//! options.set("exceptionPolicy", ExceptionPolicy::NEVER).unwrap();
//! options.set("transportMode", TransportMode::Never).unwrap();
//! options.set("requestCompression", "gzip").unwrap();
//!
//! assert_eq!(options.transport_mode(), TransportMode::Never);
//! ```
//!
//! ## Utility Functions
//!
//! ```
//! use http_rpc::client::{basic_auth_header, is_success_status};
//!
//! assert!(is_success_status(200));
//! assert!(!is_success_status(404));
//! assert!(basic_auth_header("u", "p").starts_with("Basic "));
//! ```

mod config;
mod dispatch;
mod logging;
mod transport;
mod utils;

pub use config::{
    ClientOptions, Compression, ExceptionPolicy, OptionName, OptionValue, TransportMode,
};
pub use dispatch::{RpcClient, RpcClientBuilder};
pub use logging::{Logger, TracingLogger};
pub use transport::{
    DefaultHttpRequestFactory, HttpRequest, HttpRequestFactory, HttpResponse, HttpTransport,
    ReqwestTransport, TransportError, SUPPORTED_PROTOCOL_VERSIONS,
};
pub use utils::*;
