//! Core RPC message types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Value`] | Dynamic RPC value (parameters and results) |
//! | [`Request`] | One method call, ready to be sent |
//! | [`Response`] | Outcome of a call: a value or a fault, never both |
//! | [`ReturnType`] | How the decoder should shape returned values |
//! | [`DecodeOptions`] | Settings handed to the response decoder |
//! | [`RequestOptions`] | Settings handed to the request factory |

use crate::client::ExceptionPolicy;
use crate::fault::Fault;
use crate::protocol::ResponseDecoder;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Dynamic RPC value.
pub type Value = serde_json::Value;

/// Shape of the values a decoder returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// Plain Rust-side values
    #[default]
    Native,
    /// The wire format's own typed value tree
    Wire,
    /// The undecoded response body as a string
    Raw,
}

impl ReturnType {
    /// Option value spelling
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnType::Native => "native",
            ReturnType::Wire => "wire",
            ReturnType::Raw => "raw",
        }
    }
}

impl FromStr for ReturnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(ReturnType::Native),
            "wire" => Ok(ReturnType::Wire),
            "raw" => Ok(ReturnType::Raw),
            other => Err(format!("unknown return type: {}", other)),
        }
    }
}

/// Settings passed to [`ResponseDecoder::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Debug level from the client options
    pub debug: u32,
    /// Requested value shape
    pub return_type: ReturnType,
    /// The client's exception policy
    pub exception_policy: ExceptionPolicy,
}

/// Settings passed to [`RequestFactory::create_request`](crate::protocol::RequestFactory::create_request).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Charset the request body should be encoded in
    pub charset_encoding: Option<String>,
    /// Factory-specific settings
    pub extra: serde_json::Map<String, Value>,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body charset
    pub fn with_charset_encoding(mut self, charset: impl Into<String>) -> Self {
        self.charset_encoding = Some(charset.into());
        self
    }
}

/// A single RPC call, built by a request factory.
///
/// Requests are assembled with the `with_*` methods and are read-only afterwards.
///
/// # Examples
///
/// ```
/// use http_rpc::{Request, Response, Value};
/// use http_rpc::fault::Fault;
/// use http_rpc::protocol::ResponseDecoder;
/// use http_rpc::types::DecodeOptions;
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// struct Echo;
///
/// impl ResponseDecoder for Echo {
///     fn decode(
///         &self,
///         _request: &Request,
///         body: &[u8],
///         _headers: &BTreeMap<String, String>,
///         _options: &DecodeOptions,
///     ) -> Result<Response, Fault> {
///         Ok(Response::from_value(Value::from(String::from_utf8_lossy(body).into_owned())))
///     }
/// }
///
/// let request = Request::new("echo", vec![Value::from("hi")], "hi", Arc::new(Echo))
///     .with_header("X-Trace", "1");
/// assert_eq!(request.method_name(), "echo");
/// assert_eq!(request.http_method(), &http::Method::POST);
/// ```
#[derive(Clone)]
pub struct Request {
    method_name: String,
    params: Vec<Value>,
    target: Option<Url>,
    http_method: http::Method,
    headers: BTreeMap<String, String>,
    body: Bytes,
    charset_encoding: Option<String>,
    decoder: Arc<dyn ResponseDecoder>,
}

impl Request {
    /// Create a POST request with an already-serialized body.
    pub fn new(
        method_name: impl Into<String>,
        params: Vec<Value>,
        body: impl Into<Bytes>,
        decoder: Arc<dyn ResponseDecoder>,
    ) -> Self {
        Request {
            method_name: method_name.into(),
            params,
            target: None,
            http_method: http::Method::POST,
            headers: BTreeMap::new(),
            body: body.into(),
            charset_encoding: None,
            decoder,
        }
    }

    /// Send to `target` instead of the client's endpoint
    pub fn with_target(mut self, target: Url) -> Self {
        self.target = Some(target);
        self
    }

    /// Override the HTTP method
    pub fn with_http_method(mut self, method: http::Method) -> Self {
        self.http_method = method;
        self
    }

    /// Add an HTTP header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Record the charset the body was encoded in
    pub fn with_charset_encoding(mut self, charset: impl Into<String>) -> Self {
        self.charset_encoding = Some(charset.into());
        self
    }

    /// Name of the remote method
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Call parameters
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Target override, if any
    pub fn target(&self) -> Option<&Url> {
        self.target.as_ref()
    }

    /// HTTP method
    pub fn http_method(&self) -> &http::Method {
        &self.http_method
    }

    /// HTTP headers set by the request factory
    pub fn http_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Serialized body
    pub fn http_body(&self) -> &Bytes {
        &self.body
    }

    /// Charset of the body, if the factory declared one
    pub fn charset_encoding(&self) -> Option<&str> {
        self.charset_encoding.as_deref()
    }

    /// Decoder for the matching response
    pub fn decoder(&self) -> &Arc<dyn ResponseDecoder> {
        &self.decoder
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method_name", &self.method_name)
            .field("params", &self.params)
            .field("target", &self.target)
            .field("http_method", &self.http_method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("charset_encoding", &self.charset_encoding)
            .finish()
    }
}

/// Outcome of an RPC call.
///
/// Holds exactly one of a value or a fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    outcome: Result<Value, Fault>,
    http_status: Option<u16>,
    headers: BTreeMap<String, String>,
}

impl Response {
    /// Successful response
    pub fn from_value(value: Value) -> Self {
        Response {
            outcome: Ok(value),
            http_status: None,
            headers: BTreeMap::new(),
        }
    }

    /// Failed response
    pub fn from_fault(fault: Fault) -> Self {
        Response {
            outcome: Err(fault),
            http_status: None,
            headers: BTreeMap::new(),
        }
    }

    /// Attach the HTTP status and headers this response was decoded from
    pub fn with_http(mut self, status: u16, headers: BTreeMap<String, String>) -> Self {
        self.http_status = Some(status);
        self.headers = headers;
        self
    }

    /// The returned value, absent on fault
    pub fn value(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    /// The fault, absent on success
    pub fn fault(&self) -> Option<&Fault> {
        self.outcome.as_ref().err()
    }

    /// Whether this response carries a fault
    pub fn is_fault(&self) -> bool {
        self.outcome.is_err()
    }

    /// HTTP status of the wire response, when one was received
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// HTTP headers of the wire response
    pub fn http_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Consume into the value or the fault
    pub fn into_result(self) -> Result<Value, Fault> {
        self.outcome
    }
}

impl From<Fault> for Response {
    fn from(fault: Fault) -> Self {
        Response::from_fault(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;

    #[test]
    fn test_response_exclusive_outcome() {
        let ok = Response::from_value(Value::from(42));
        assert_eq!(ok.value(), Some(&Value::from(42)));
        assert!(ok.fault().is_none());
        assert!(!ok.is_fault());

        let failed = Response::from_fault(Fault::from_kind(FaultKind::NoData));
        assert!(failed.value().is_none());
        assert_eq!(failed.fault().map(|f| f.code), Some(6));
        assert_eq!(failed.into_result().unwrap_err().code, 6);
    }

    #[test]
    fn test_response_http_metadata() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/xml".to_string());
        let response = Response::from_value(Value::Null).with_http(200, headers);
        assert_eq!(response.http_status(), Some(200));
        assert_eq!(response.http_headers()["content-type"], "text/xml");
    }

    #[test]
    fn test_return_type_parse() {
        assert_eq!("NATIVE".parse::<ReturnType>().unwrap(), ReturnType::Native);
        assert_eq!("raw".parse::<ReturnType>().unwrap(), ReturnType::Raw);
        assert!("php".parse::<ReturnType>().is_err());
        assert_eq!(ReturnType::default(), ReturnType::Native);
    }
}
