//! Wire-format strategy traits.
//!
//! The client never serializes payloads itself. A [`WireFormat`] builds requests for
//! one wire format (XML-RPC, JSON-RPC, ...) and every [`Request`] it builds carries
//! the [`ResponseDecoder`] that understands the matching response.

use crate::charset::{CharsetConverter, ConverterRegistry, EntityFormat};
use crate::client::{OptionName, OptionValue};
use crate::error::Result;
use crate::fault::Fault;
use crate::types::{DecodeOptions, Request, RequestOptions, Response, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Decodes an HTTP response body into a [`Response`].
pub trait ResponseDecoder: Send + Sync {
    /// Decode `body`.
    ///
    /// Return `Ok` with a fault [`Response`] when the peer declared a fault, and
    /// `Err` when the body itself cannot be decoded. The client applies the
    /// exception policy to both.
    ///
    /// # Errors
    ///
    /// A [`Fault`] describing why the body is malformed, typically
    /// [`FaultKind::InvalidReturn`](crate::fault::FaultKind::InvalidReturn).
    fn decode(
        &self,
        request: &Request,
        body: &[u8],
        headers: &BTreeMap<String, String>,
        options: &DecodeOptions,
    ) -> std::result::Result<Response, Fault>;
}

/// Builds [`Request`]s from a method name and parameters.
pub trait RequestFactory: Send + Sync {
    /// Build a request for `method_name`.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidRequest`](crate::RpcError::InvalidRequest) when the
    /// parameters cannot be serialized, or a conversion error from the charset layer.
    fn create_request(
        &self,
        method_name: &str,
        params: Vec<Value>,
        options: &RequestOptions,
    ) -> Result<Request>;
}

/// The default request builder of a client, plus its format-specific hooks.
pub trait WireFormat: RequestFactory {
    /// Short name used in logs, e.g. `"xmlrpc"`
    fn name(&self) -> &str;

    /// Entity scheme used when encoding bodies
    fn entity_format(&self) -> EntityFormat;

    /// Shared converter for [`entity_format`](Self::entity_format)
    fn charset_converter(&self) -> Arc<CharsetConverter> {
        ConverterRegistry::global().get(self.entity_format())
    }

    /// Extra validation for a client option, run after the base type checks.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidOption`](crate::RpcError::InvalidOption) to reject the value.
    fn validate_option(&self, name: OptionName, value: &OptionValue) -> Result<()> {
        let _ = (name, value);
        Ok(())
    }
}
