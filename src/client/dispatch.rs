//! The RPC client: request creation, HTTP dispatch and response decoding.
//!
//! # Examples
//!
//! ```ignore
//! use http_rpc::{RpcClient, Value};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RpcClient::builder("http://example.com/rpc", Arc::new(MyFormat))
//!         .option("timeout", 10)
//!         .build()?;
//!
//!     let value = client.call("echo", vec![Value::from("hello")]).await?;
//!     println!("{}", value);
//!     Ok(())
//! }
//! ```

use crate::client::config::{
    ClientOptions, ExceptionPolicy, OptionName, OptionValue, TransportMode,
};
use crate::client::logging::{Logger, TracingLogger};
use crate::client::transport::{
    DefaultHttpRequestFactory, HttpRequest, HttpRequestFactory, HttpTransport, ReqwestTransport,
};
use crate::client::utils::{basic_auth_header, compress_body, decompress_body, is_success_status};
use crate::error::{Result, RpcError};
use crate::fault::{Fault, FaultKind};
use crate::protocol::constants::{self, headers};
use crate::protocol::{format_list, RequestFactory, WireFormat};
use crate::types::{DecodeOptions, Request, RequestOptions, Response, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::Level;
use url::Url;

/// HTTP-transported RPC client.
///
/// Collaborators are fixed at construction. Options can be changed through
/// `&mut self`, so they never change while a `send` is in flight.
pub struct RpcClient {
    uri: Url,
    wire_format: Arc<dyn WireFormat>,
    request_factory: Option<Arc<dyn RequestFactory>>,
    http_request_factory: Arc<dyn HttpRequestFactory>,
    transport: Option<Arc<dyn HttpTransport>>,
    builtin_transport: Option<Arc<ReqwestTransport>>,
    logger: Arc<dyn Logger>,
    options: ClientOptions,
}

/// Builder for [`RpcClient`].
pub struct RpcClientBuilder {
    uri: String,
    wire_format: Arc<dyn WireFormat>,
    request_factory: Option<Arc<dyn RequestFactory>>,
    http_request_factory: Option<Arc<dyn HttpRequestFactory>>,
    transport: Option<Arc<dyn HttpTransport>>,
    logger: Option<Arc<dyn Logger>>,
    options: Option<ClientOptions>,
    pending: Vec<(String, OptionValue)>,
}

impl RpcClientBuilder {
    /// Use `factory` instead of the wire format to build requests
    pub fn request_factory(mut self, factory: Arc<dyn RequestFactory>) -> Self {
        self.request_factory = Some(factory);
        self
    }

    /// Use `factory` to build wire requests
    pub fn http_request_factory(mut self, factory: Arc<dyn HttpRequestFactory>) -> Self {
        self.http_request_factory = Some(factory);
        self
    }

    /// Send through `transport`
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Log through `logger`
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Start from a full option set
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set one option; validated by [`build`](Self::build)
    pub fn option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.pending.push((name.into(), value.into()));
        self
    }

    /// Validate everything and create the client.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidUri`] for an unparseable or non-HTTP URI, and the option
    /// errors of [`RpcClient::set_option`].
    pub fn build(self) -> Result<RpcClient> {
        let uri = parse_uri(&self.uri)?;

        let mut options = self.options.unwrap_or_default();
        let overrides: Vec<(OptionName, OptionValue)> = options
            .overrides()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        for (name, value) in overrides {
            self.wire_format.validate_option(name, &value)?;
        }
        for (name, value) in self.pending {
            apply_option(self.wire_format.as_ref(), &mut options, &name, value)?;
        }

        let builtin_transport = builtin_transport(&options, self.transport.is_some())?;

        Ok(RpcClient {
            uri,
            wire_format: self.wire_format,
            request_factory: self.request_factory,
            http_request_factory: self
                .http_request_factory
                .unwrap_or_else(|| Arc::new(DefaultHttpRequestFactory)),
            transport: self.transport,
            builtin_transport,
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            options,
        })
    }
}

impl RpcClient {
    /// Start building a client for `uri` speaking `wire_format`.
    pub fn builder(uri: impl Into<String>, wire_format: Arc<dyn WireFormat>) -> RpcClientBuilder {
        RpcClientBuilder {
            uri: uri.into(),
            wire_format,
            request_factory: None,
            http_request_factory: None,
            transport: None,
            logger: None,
            options: None,
            pending: Vec::new(),
        }
    }

    /// Client with default options and collaborators.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidUri`] for an unparseable or non-HTTP URI.
    pub fn new(uri: impl Into<String>, wire_format: Arc<dyn WireFormat>) -> Result<Self> {
        Self::builder(uri, wire_format).build()
    }

    /// Endpoint URI
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Wire format used for default requests
    pub fn wire_format(&self) -> &Arc<dyn WireFormat> {
        &self.wire_format
    }

    /// Current options
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    // ========== Options ==========

    /// Current value of option `name`.
    ///
    /// # Errors
    ///
    /// [`RpcError::UnsupportedOption`] for an unknown key.
    pub fn get_option(&self, name: &str) -> Result<&OptionValue> {
        self.options.get(name)
    }

    /// Every recognized option key
    pub fn get_options_list(&self) -> Vec<&'static str> {
        ClientOptions::names()
    }

    /// Validate and store one option.
    ///
    /// # Errors
    ///
    /// [`RpcError::UnsupportedOption`] for an unknown key, [`RpcError::InvalidOption`]
    /// when the base checks or the wire format reject the value, or when the built-in
    /// transport cannot be rebuilt with it.
    pub fn set_option(&mut self, name: &str, value: impl Into<OptionValue>) -> Result<()> {
        self.set_options([(name, value.into())])
    }

    /// Validate and store several options.
    ///
    /// Either every value is stored or none is.
    ///
    /// # Errors
    ///
    /// The first error of [`set_option`](Self::set_option) among the entries.
    pub fn set_options<I, K, V>(&mut self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<OptionValue>,
    {
        let mut updated = self.options.clone();
        for (name, value) in options {
            apply_option(self.wire_format.as_ref(), &mut updated, name.as_ref(), value.into())?;
        }

        self.builtin_transport = builtin_transport(&updated, self.transport.is_some())?;
        self.options = updated;
        Ok(())
    }

    // ========== Calls ==========

    /// Build a request with the injected request factory, or the wire format.
    ///
    /// `options.charset_encoding` defaults to the `requestCharsetEncoding` option.
    ///
    /// # Errors
    ///
    /// Whatever the factory reports, typically [`RpcError::InvalidRequest`].
    pub fn create_request(
        &self,
        method_name: &str,
        params: Vec<Value>,
        mut options: RequestOptions,
    ) -> Result<Request> {
        if options.charset_encoding.is_none() {
            options.charset_encoding = self
                .options
                .text(OptionName::RequestCharsetEncoding)
                .map(str::to_string);
        }

        match &self.request_factory {
            Some(factory) => factory.create_request(method_name, params, &options),
            None => self.wire_format.create_request(method_name, params, &options),
        }
    }

    /// Call `method_name` and return its value.
    ///
    /// # Errors
    ///
    /// Everything [`send`](Self::send) returns, plus [`RpcError::Fault`] when the
    /// response carries a fault that the exception policy let through.
    pub async fn call(&self, method_name: &str, params: Vec<Value>) -> Result<Value> {
        let request = self.create_request(method_name, params, RequestOptions::default())?;
        let response = self.send(&request).await?;
        response.into_result().map_err(RpcError::Fault)
    }

    /// Send a request and decode its response.
    ///
    /// Failures are captured into a fault [`Response`] unless the matching
    /// [`ExceptionPolicy`] bit is set. A wire request that cannot be built
    /// (compression or [`HttpRequestFactory`] failure) counts as a transport
    /// failure carrying `invalid_request`.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Transport`] under [`ExceptionPolicy::TRANSPORT`]
    /// - [`RpcError::ResponseFormat`] under [`ExceptionPolicy::RESPONSE_FORMAT`]
    /// - [`RpcError::Protocol`] under [`ExceptionPolicy::PROTOCOL`]
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let policy = self.options.exception_policy();
        let debug = self.options.debug();

        let http_request = match self.build_http_request(request) {
            Ok(http_request) => http_request,
            Err(e) => {
                let fault = e.fault().cloned().unwrap_or_else(|| {
                    Fault::with_detail(FaultKind::InvalidRequest, e.to_string())
                });
                return self.transport_failure(request, policy, fault, None);
            }
        };

        let Some(transport) = self.select_transport() else {
            let fault = Fault::from_kind(FaultKind::NoTransport);
            return self.transport_failure(request, policy, fault, None);
        };

        if debug > 0 {
            self.logger.debug(&format!(
                "Sending {} {} ({} bytes): {}",
                http_request.method,
                http_request.uri,
                http_request.body.len(),
                String::from_utf8_lossy(request.http_body())
            ));
        }

        let http_response = match transport.send_request(http_request).await {
            Ok(response) => response,
            Err(e) => return self.transport_failure(request, policy, e.into_fault(), None),
        };

        let status = http_response.status;
        let response_headers = http_response.headers;

        if !is_success_status(status) {
            let fault = Fault::with_detail(FaultKind::HttpError, format!("(HTTP {})", status));
            return self.transport_failure(request, policy, fault, Some((status, response_headers)));
        }

        let encoding = response_headers
            .get(headers::CONTENT_ENCODING.as_str())
            .map(String::as_str)
            .unwrap_or("");
        let body = match decompress_body(&http_response.body, encoding) {
            Ok(body) => body,
            Err(fault) => {
                return self.transport_failure(request, policy, fault, Some((status, response_headers)))
            }
        };

        if body.is_empty() {
            let fault = Fault::from_kind(FaultKind::NoData);
            return self.transport_failure(request, policy, fault, Some((status, response_headers)));
        }

        if debug > 0 {
            self.logger.debug(&format!(
                "Received HTTP {} ({} bytes): {}",
                status,
                body.len(),
                String::from_utf8_lossy(&body)
            ));
        }

        let decode_options = DecodeOptions {
            debug,
            return_type: self.options.return_type(),
            exception_policy: policy,
        };

        match request
            .decoder()
            .decode(request, &body, &response_headers, &decode_options)
        {
            Err(fault) => {
                self.logger.log(
                    Level::WARN,
                    &format!("Invalid response: {}", fault),
                    &fault_context(request, &fault),
                );
                if policy.contains(ExceptionPolicy::RESPONSE_FORMAT) {
                    Err(RpcError::ResponseFormat(fault))
                } else {
                    Ok(Response::from_fault(fault).with_http(status, response_headers))
                }
            }
            Ok(response) => match response.fault() {
                Some(fault) if policy.contains(ExceptionPolicy::PROTOCOL) => {
                    Err(RpcError::Protocol(fault.clone()))
                }
                _ => Ok(response.with_http(status, response_headers)),
            },
        }
    }

    fn build_http_request(&self, request: &Request) -> Result<HttpRequest> {
        let mut http_headers = request.http_headers().clone();
        for (name, value) in self.client_headers() {
            http_headers.insert(name.to_string(), value);
        }

        let body = match self.options.request_compression() {
            Some(compression) => compress_body(request.http_body(), compression)?,
            None => request.http_body().clone(),
        };

        let uri = request.target().cloned().unwrap_or_else(|| self.uri.clone());
        let protocol_version = self
            .options
            .http_version()
            .unwrap_or(constants::DEFAULT_PROTOCOL_VERSION);

        self.http_request_factory.create_request(
            request.http_method().clone(),
            uri,
            http_headers,
            body,
            protocol_version,
        )
    }

    /// Headers derived from the options.
    fn client_headers(&self) -> Vec<(&'static str, String)> {
        let options = &self.options;
        let mut out = Vec::new();

        let user_agent = options
            .text(OptionName::UserAgent)
            .unwrap_or(constants::DEFAULT_USER_AGENT);
        out.push((headers::USER_AGENT.as_str(), user_agent.to_string()));

        let charsets = options.accepted_charset_encodings();
        if !charsets.is_empty() {
            out.push((headers::ACCEPT_CHARSET.as_str(), format_list(charsets)));
        }

        let accepted: Vec<&str> = options
            .accepted_compression()
            .into_iter()
            .map(|c| c.as_str())
            .collect();
        if !accepted.is_empty() {
            out.push((headers::ACCEPT_ENCODING.as_str(), format_list(&accepted[..])));
        }

        if let Some(compression) = options.request_compression() {
            out.push((headers::CONTENT_ENCODING.as_str(), compression.as_str().to_string()));
        }

        if !options.keep_alive() {
            out.push((headers::CONNECTION.as_str(), "close".to_string()));
        }

        // authType is already normalized to null or "basic"
        if let Some(username) = options.text(OptionName::Username) {
            let password = options.text(OptionName::Password).unwrap_or("");
            out.push((headers::AUTHORIZATION.as_str(), basic_auth_header(username, password)));
        }

        out
    }

    fn select_transport(&self) -> Option<Arc<dyn HttpTransport>> {
        let builtin = || {
            self.builtin_transport
                .clone()
                .map(|t| t as Arc<dyn HttpTransport>)
        };

        match self.options.transport_mode() {
            TransportMode::Never => self.transport.clone(),
            TransportMode::Always => builtin(),
            TransportMode::Auto => self.transport.clone().or_else(builtin),
        }
    }

    fn transport_failure(
        &self,
        request: &Request,
        policy: ExceptionPolicy,
        fault: Fault,
        http: Option<(u16, BTreeMap<String, String>)>,
    ) -> Result<Response> {
        self.logger.log(
            Level::WARN,
            &format!("HTTP transport failed: {}", fault),
            &fault_context(request, &fault),
        );

        if policy.contains(ExceptionPolicy::TRANSPORT) {
            return Err(RpcError::Transport(fault));
        }

        let response = Response::from_fault(fault);
        Ok(match http {
            Some((status, headers)) => response.with_http(status, headers),
            None => response,
        })
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("uri", &self.uri.as_str())
            .field("wire_format", &self.wire_format.name())
            .field("custom_request_factory", &self.request_factory.is_some())
            .field("injected_transport", &self.transport.is_some())
            .field("builtin_transport", &self.builtin_transport.is_some())
            .field("options", &self.options)
            .finish()
    }
}

fn fault_context(request: &Request, fault: &Fault) -> [(&'static str, String); 2] {
    [
        ("method", request.method_name().to_string()),
        ("code", fault.code.to_string()),
    ]
}

fn parse_uri(uri: &str) -> Result<Url> {
    let parsed = Url::parse(uri).map_err(|e| RpcError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RpcError::InvalidUri {
            uri: uri.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

fn apply_option(
    wire_format: &dyn WireFormat,
    options: &mut ClientOptions,
    name: &str,
    value: OptionValue,
) -> Result<()> {
    let key: OptionName = name.parse()?;
    let value = ClientOptions::validate(key, value)?;
    wire_format.validate_option(key, &value)?;
    options.insert_validated(key, value);
    Ok(())
}

/// The built-in transport, when the transport mode can ever pick it.
fn builtin_transport(
    options: &ClientOptions,
    has_injected: bool,
) -> Result<Option<Arc<ReqwestTransport>>> {
    let needed = match options.transport_mode() {
        TransportMode::Never => false,
        TransportMode::Always => true,
        TransportMode::Auto => !has_injected,
    };

    if needed {
        Ok(Some(Arc::new(ReqwestTransport::from_options(options)?)))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::EntityFormat;
    use crate::client::transport::{HttpResponse, TransportError};
    use async_trait::async_trait;

    struct NoFormat;

    impl RequestFactory for NoFormat {
        fn create_request(
            &self,
            _method_name: &str,
            _params: Vec<Value>,
            _options: &RequestOptions,
        ) -> Result<Request> {
            Err(RpcError::InvalidRequest(Fault::from_kind(FaultKind::InvalidRequest)))
        }
    }

    impl WireFormat for NoFormat {
        fn name(&self) -> &str {
            "none"
        }

        fn entity_format(&self) -> EntityFormat {
            EntityFormat::Xml
        }
    }

    struct Down;

    #[async_trait]
    impl HttpTransport for Down {
        async fn send_request(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            Err(TransportError::Unavailable)
        }
    }

    #[test]
    fn test_builtin_transport_only_when_reachable() {
        let injected = RpcClient::builder("http://localhost/", Arc::new(NoFormat))
            .transport(Arc::new(Down))
            .build()
            .unwrap();
        assert!(injected.builtin_transport.is_none());

        let standalone = RpcClient::new("http://localhost/", Arc::new(NoFormat)).unwrap();
        assert!(standalone.builtin_transport.is_some());

        let mut never = RpcClient::new("http://localhost/", Arc::new(NoFormat)).unwrap();
        never.set_option("transportMode", TransportMode::Never).unwrap();
        assert!(never.builtin_transport.is_none());
        assert!(never.select_transport().is_none());
    }

    #[test]
    fn test_default_client_headers() {
        let client = RpcClient::new("http://localhost/", Arc::new(NoFormat)).unwrap();
        let headers = client.client_headers();
        assert_eq!(headers, vec![("user-agent", constants::DEFAULT_USER_AGENT.to_string())]);
    }

    #[test]
    fn test_request_factory_errors_pass_through() {
        let client = RpcClient::new("http://localhost/", Arc::new(NoFormat)).unwrap();
        let err = tokio_test::block_on(client.call("anything", vec![])).unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Configuration);
    }

    struct NullDecoder;

    impl crate::protocol::ResponseDecoder for NullDecoder {
        fn decode(
            &self,
            _request: &Request,
            _body: &[u8],
            _headers: &BTreeMap<String, String>,
            _options: &DecodeOptions,
        ) -> std::result::Result<Response, Fault> {
            Ok(Response::from_value(Value::Null))
        }
    }

    #[test]
    fn test_injected_transport_failure_gated() {
        let request = Request::new("ping", vec![], "", Arc::new(NullDecoder));

        let lenient = RpcClient::builder("http://localhost/", Arc::new(NoFormat))
            .transport(Arc::new(Down))
            .option("exceptionPolicy", ExceptionPolicy::NEVER)
            .build()
            .unwrap();
        let response = tokio_test::block_on(lenient.send(&request)).unwrap();
        assert_eq!(response.fault().and_then(Fault::kind), Some(FaultKind::NoTransport));

        let strict = RpcClient::builder("http://localhost/", Arc::new(NoFormat))
            .transport(Arc::new(Down))
            .build()
            .unwrap();
        let err = tokio_test::block_on(strict.send(&request)).unwrap_err();
        assert!(err.is_transport());
    }

    struct Refusing;

    impl HttpRequestFactory for Refusing {
        fn create_request(
            &self,
            _method: http::Method,
            _uri: Url,
            _headers: BTreeMap<String, String>,
            _body: bytes::Bytes,
            _protocol_version: &str,
        ) -> Result<HttpRequest> {
            Err(RpcError::InvalidRequest(Fault::with_detail(
                FaultKind::InvalidRequest,
                "(refused)",
            )))
        }
    }

    #[test]
    fn test_wire_request_failure_gated() {
        let request = Request::new("ping", vec![], "", Arc::new(NullDecoder));
        let build = |policy: ExceptionPolicy| {
            RpcClient::builder("http://localhost/", Arc::new(NoFormat))
                .http_request_factory(Arc::new(Refusing))
                .transport(Arc::new(Down))
                .option("exceptionPolicy", policy)
                .build()
                .unwrap()
        };

        let response = tokio_test::block_on(build(ExceptionPolicy::NEVER).send(&request)).unwrap();
        let fault = response.fault().unwrap();
        assert_eq!(fault.code, 15);
        assert!(fault.message.ends_with("(refused)"));

        let err = tokio_test::block_on(build(ExceptionPolicy::TRANSPORT).send(&request)).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.fault().map(|f| f.code), Some(15));
    }

    #[test]
    fn test_debug_hides_collaborators() {
        let client = RpcClient::new("https://example.com/rpc", Arc::new(NoFormat)).unwrap();
        let text = format!("{:?}", client);
        assert!(text.contains("https://example.com/rpc"));
        assert!(text.contains("\"none\""));
    }
}
