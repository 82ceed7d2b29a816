//! Protocol contracts, constants, and header helpers.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WireFormat`] | Default request builder and option hooks of a wire format |
//! | [`RequestFactory`] | Replaceable request builder |
//! | [`ResponseDecoder`] | Turns an HTTP body into a [`Response`](crate::Response) |

mod format;
mod headers;

pub use format::{RequestFactory, ResponseDecoder, WireFormat};
pub use headers::{
    format_content_type, format_list, parse_charset_list, parse_content_type, parse_token_list,
};

/// Protocol constants.
pub mod constants {
    /// Header names the client sets.
    pub mod headers {
        pub use http::header::{
            ACCEPT_CHARSET, ACCEPT_ENCODING, AUTHORIZATION, CONNECTION, CONTENT_ENCODING,
            CONTENT_TYPE, USER_AGENT,
        };
    }

    /// HTTP protocol version used when `httpVersion` is not set.
    pub const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

    /// `User-Agent` sent when `userAgent` is not set.
    pub const DEFAULT_USER_AGENT: &str = concat!("http_rpc/", env!("CARGO_PKG_VERSION"));
}
