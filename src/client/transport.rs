//! HTTP collaborators: wire request/response shapes, the request factory, and transports.
//!
//! The client never speaks HTTP itself. It builds an [`HttpRequest`] through an
//! [`HttpRequestFactory`] and hands it to an [`HttpTransport`]. [`ReqwestTransport`]
//! is the built-in transport, configured from the client options.

use crate::client::config::{ClientOptions, Compression, OptionName};
use crate::error::{Result, RpcError};
use crate::fault::{Fault, FaultKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// HTTP versions accepted by [`DefaultHttpRequestFactory`].
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 4] = ["1.0", "1.1", "2", "2.0"];

/// Request as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: http::Method,
    /// Target URI
    pub uri: Url,
    /// Headers, lowercase names
    pub headers: BTreeMap<String, String>,
    /// Body, already compressed if requested
    pub body: Bytes,
    /// `"1.0"`, `"1.1"`, `"2"` or `"2.0"`
    pub protocol_version: String,
}

/// Response as returned by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Headers, lowercase names
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        HttpResponse {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Add a header. Names are stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Builds wire requests.
pub trait HttpRequestFactory: Send + Sync {
    /// Assemble an [`HttpRequest`].
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidOption`] when `protocol_version` is not supported.
    fn create_request(
        &self,
        method: http::Method,
        uri: Url,
        headers: BTreeMap<String, String>,
        body: Bytes,
        protocol_version: &str,
    ) -> Result<HttpRequest>;
}

/// Request factory used when none is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHttpRequestFactory;

impl HttpRequestFactory for DefaultHttpRequestFactory {
    fn create_request(
        &self,
        method: http::Method,
        uri: Url,
        headers: BTreeMap<String, String>,
        body: Bytes,
        protocol_version: &str,
    ) -> Result<HttpRequest> {
        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&protocol_version) {
            return Err(RpcError::invalid_option(
                OptionName::HttpVersion.as_str(),
                format!("unsupported HTTP version {}", protocol_version),
            ));
        }

        Ok(HttpRequest {
            method,
            uri,
            headers,
            body,
            protocol_version: protocol_version.to_string(),
        })
    }
}

/// Failure reported by a transport.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// Could not connect
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request did not finish within the timeout
    #[error("Request timed out")]
    Timeout,

    /// TLS negotiation or certificate failure
    #[error("TLS failure: {0}")]
    Tls(String),

    /// The response body could not be decompressed
    #[error("Decompression failed: {0}")]
    Decompress(String),

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// No transport can serve the request
    #[error("No HTTP transport available")]
    Unavailable,
}

impl TransportError {
    /// Map to the transport-class fault reported by the client.
    pub fn into_fault(self) -> Fault {
        match self {
            TransportError::Connect(detail) | TransportError::Io(detail) => {
                Fault::with_detail(FaultKind::TransportFailure, detail)
            }
            TransportError::Timeout => {
                Fault::with_detail(FaultKind::TransportFailure, "(timed out)")
            }
            TransportError::Tls(detail) => Fault::with_detail(FaultKind::NoTls, detail),
            TransportError::Decompress(detail) => {
                Fault::with_detail(FaultKind::DecompressFail, detail)
            }
            TransportError::Unavailable => Fault::from_kind(FaultKind::NoTransport),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            return TransportError::Timeout;
        }

        let detail = describe_chain(&err);
        if is_tls_failure(&err) {
            TransportError::Tls(detail)
        } else if err.is_decode() {
            TransportError::Decompress(detail)
        } else if err.is_connect() {
            TransportError::Connect(detail)
        } else {
            TransportError::Io(detail)
        }
    }
}

/// True when the TLS backend produced an error anywhere in the source chain.
fn is_tls_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<native_tls::Error>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn describe_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        text.push_str(": ");
        text.push_str(&e.to_string());
        source = e.source();
    }
    text
}

/// Sends wire requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one request/response exchange.
    ///
    /// Non-2xx statuses are not errors at this level.
    async fn send_request(&self, request: HttpRequest)
        -> std::result::Result<HttpResponse, TransportError>;
}

/// Built-in transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with default settings
    pub fn new() -> Self {
        ReqwestTransport {
            client: reqwest::Client::new(),
        }
    }

    /// Wrap an existing `reqwest` client
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }

    /// Build a transport from the client options.
    ///
    /// Reads `timeout`, `keepAlive`, `httpVersion`, `acceptedCompression`, the
    /// `proxy*` keys and the `tls*` keys.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidOption`] when a TLS file cannot be read or parsed, or when
    /// the proxy settings do not form a valid proxy URL. [`RpcError::Transport`] with
    /// `no_tls` when the TLS backend cannot be initialized at all.
    pub fn from_options(options: &ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = options.timeout() {
            builder = builder.timeout(timeout);
        }
        if !options.keep_alive() {
            builder = builder.pool_max_idle_per_host(0);
        }

        builder = match options.http_version() {
            Some("1.0") | Some("1.1") => builder.http1_only(),
            Some("2") | Some("2.0") => builder.http2_prior_knowledge(),
            _ => builder,
        };

        let accepted = options.accepted_compression();
        builder = builder
            .gzip(accepted.contains(&Compression::Gzip))
            .deflate(accepted.contains(&Compression::Deflate));

        if let Some(proxy) = proxy_from_options(options)? {
            builder = builder.proxy(proxy);
        }

        builder = configure_tls(builder, options)?;

        let client = builder.build().map_err(|e| {
            let detail = describe_chain(&e);
            match tls_suspect(options) {
                Some(option) => RpcError::invalid_option(option.as_str(), detail),
                None => RpcError::Transport(Fault::with_detail(FaultKind::NoTls, detail)),
            }
        })?;
        Ok(ReqwestTransport { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send_request(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut req_builder = self
            .client
            .request(request.method, request.uri.as_str())
            .body(request.body);

        if request.protocol_version == "1.0" {
            req_builder = req_builder.version(http::Version::HTTP_10);
        }
        for (k, v) in &request.headers {
            req_builder = req_builder.header(k, v);
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// The TLS option a client build failure is most likely about.
fn tls_suspect(options: &ClientOptions) -> Option<OptionName> {
    [
        OptionName::TlsVersion,
        OptionName::TlsCert,
        OptionName::TlsKey,
        OptionName::TlsCaCert,
        OptionName::TlsCaCertDir,
    ]
    .into_iter()
    .find(|&name| options.text(name).is_some())
}

/// Proxy URL from `proxyHost` and `proxyPort`.
///
/// A port written into `proxyHost` wins over `proxyPort`.
fn proxy_url(options: &ClientOptions) -> Result<Option<Url>> {
    let Some(host) = options.text(OptionName::ProxyHost) else {
        return Ok(None);
    };
    let invalid = |reason: String| RpcError::invalid_option(OptionName::ProxyHost.as_str(), reason);

    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    let mut url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;

    if let Some(port) = options.proxy_port() {
        if url.port().is_none() {
            url.set_port(Some(port))
                .map_err(|_| invalid(format!("cannot set port {} on {}", port, host)))?;
        }
    }

    Ok(Some(url))
}

fn proxy_from_options(options: &ClientOptions) -> Result<Option<reqwest::Proxy>> {
    let Some(url) = proxy_url(options)? else {
        return Ok(None);
    };

    let mut proxy = reqwest::Proxy::all(url.as_str())
        .map_err(|e| RpcError::invalid_option(OptionName::ProxyHost.as_str(), e.to_string()))?;

    if let Some(user) = options.text(OptionName::ProxyUsername) {
        let pass = options.text(OptionName::ProxyPassword).unwrap_or("");
        proxy = proxy.basic_auth(user, pass);
    }

    Ok(Some(proxy))
}

fn configure_tls(
    mut builder: reqwest::ClientBuilder,
    options: &ClientOptions,
) -> Result<reqwest::ClientBuilder> {
    if options.flag(OptionName::TlsVerifyPeer) == Some(false) {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if options.flag(OptionName::TlsVerifyHost) == Some(false) {
        builder = builder.danger_accept_invalid_hostnames(true);
    }

    // native-tls has no TLS 1.3 minimum, so validation stops at 1.2
    if let Some(version) = options.text(OptionName::TlsVersion) {
        let min = match version {
            "1.0" => reqwest::tls::Version::TLS_1_0,
            "1.1" => reqwest::tls::Version::TLS_1_1,
            _ => reqwest::tls::Version::TLS_1_2,
        };
        builder = builder.min_tls_version(min);
    }

    if let Some(path) = options.text(OptionName::TlsCaCert) {
        builder = builder.add_root_certificate(load_certificate(OptionName::TlsCaCert, Path::new(path))?);
    }

    if let Some(dir) = options.text(OptionName::TlsCaCertDir) {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            RpcError::invalid_option(OptionName::TlsCaCertDir.as_str(), e.to_string())
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_cert = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "pem" | "crt"));
            if is_cert {
                builder = builder.add_root_certificate(load_certificate(OptionName::TlsCaCertDir, &path)?);
            }
        }
    }

    if let Some(cert) = options.text(OptionName::TlsCert) {
        let identity = load_identity(options, Path::new(cert))?;
        builder = builder.identity(identity);
    }

    Ok(builder)
}

fn read_file(option: OptionName, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        RpcError::invalid_option(option.as_str(), format!("{}: {}", path.display(), e))
    })
}

fn load_certificate(option: OptionName, path: &Path) -> Result<reqwest::Certificate> {
    let pem = read_file(option, path)?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| RpcError::invalid_option(option.as_str(), e.to_string()))
}

/// PEM certificate plus `tlsKey`, or a PKCS#12 bundle unlocked with `tlsCertPass`.
fn load_identity(options: &ClientOptions, cert_path: &Path) -> Result<reqwest::Identity> {
    if options.text(OptionName::TlsKeyPass).is_some() {
        return Err(RpcError::invalid_option(
            OptionName::TlsKeyPass.as_str(),
            "encrypted private keys are not supported",
        ));
    }

    let cert = read_file(OptionName::TlsCert, cert_path)?;

    match options.text(OptionName::TlsKey) {
        Some(key_path) => {
            let key = read_file(OptionName::TlsKey, Path::new(key_path))?;
            reqwest::Identity::from_pkcs8_pem(&cert, &key)
                .map_err(|e| RpcError::invalid_option(OptionName::TlsKey.as_str(), e.to_string()))
        }
        None => {
            let password = options.text(OptionName::TlsCertPass).unwrap_or("");
            reqwest::Identity::from_pkcs12_der(&cert, password)
                .map_err(|e| RpcError::invalid_option(OptionName::TlsCert.as_str(), e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("http://localhost/rpc").unwrap()
    }

    #[test]
    fn test_default_factory_accepts_known_versions() {
        let factory = DefaultHttpRequestFactory;
        for version in SUPPORTED_PROTOCOL_VERSIONS {
            let req = factory
                .create_request(http::Method::POST, uri(), BTreeMap::new(), Bytes::new(), version)
                .unwrap();
            assert_eq!(req.protocol_version, version);
        }
    }

    #[test]
    fn test_default_factory_rejects_unknown_version() {
        let err = DefaultHttpRequestFactory
            .create_request(http::Method::POST, uri(), BTreeMap::new(), Bytes::new(), "3")
            .unwrap_err();
        assert!(matches!(err, RpcError::InvalidOption { ref option, .. } if option == "httpVersion"));
    }

    #[test]
    fn test_transport_error_faults() {
        assert_eq!(TransportError::Timeout.into_fault().code, 8);
        assert_eq!(TransportError::Tls("bad cert".into()).into_fault().code, 7);
        assert_eq!(TransportError::Decompress("eof".into()).into_fault().code, 104);
        assert_eq!(TransportError::Unavailable.into_fault().code, 16);

        let fault = TransportError::Connect("refused".into()).into_fault();
        assert_eq!(fault.kind(), Some(FaultKind::TransportFailure));
        assert!(fault.message.ends_with(" refused"));
    }

    #[test]
    fn test_response_header_lookup() {
        let response = HttpResponse::new(200, "ok").with_header("Content-Type", "text/xml");
        assert_eq!(response.header("content-type"), Some("text/xml"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/xml"));
        assert!(response.header("etag").is_none());
    }

    #[test]
    fn test_from_options_defaults() {
        assert!(ReqwestTransport::from_options(&ClientOptions::default()).is_ok());
    }

    #[test]
    fn test_from_options_full_settings() {
        let mut options = ClientOptions::default();
        options.set("timeout", 3).unwrap();
        options.set("keepAlive", false).unwrap();
        options.set("httpVersion", "1.1").unwrap();
        options.set("acceptedCompression", "gzip").unwrap();
        options.set("proxyHost", "proxy.local").unwrap();
        options.set("proxyPort", 3128).unwrap();
        options.set("proxyUsername", "u").unwrap();
        options.set("tlsVerifyPeer", false).unwrap();
        options.set("tlsVersion", "1.2").unwrap();
        assert!(ReqwestTransport::from_options(&options).is_ok());
    }

    #[test]
    fn test_tls_detection_ignores_message_text() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "ssl proxy refused the tls certificate");
        assert!(!is_tls_failure(&io));
    }

    #[test]
    fn test_describe_chain_joins_sources() {
        #[derive(Debug, Error)]
        #[error("error sending request")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"));
        assert_eq!(describe_chain(&err), "error sending request: connection reset");
    }

    #[test]
    fn test_tls_build_failure_names_the_option() {
        let mut options = ClientOptions::default();
        assert_eq!(tls_suspect(&options), None);

        options.set("tlsCACert", "/etc/ssl/ca.pem").unwrap();
        assert_eq!(tls_suspect(&options), Some(OptionName::TlsCaCert));

        options.set("tlsVersion", "1.2").unwrap();
        assert_eq!(tls_suspect(&options), Some(OptionName::TlsVersion));
    }

    #[test]
    fn test_proxy_url_port_handling() {
        let mut options = ClientOptions::default();
        assert_eq!(proxy_url(&options).unwrap(), None);

        options.set("proxyHost", "proxy.local").unwrap();
        options.set("proxyPort", 3128).unwrap();
        assert_eq!(proxy_url(&options).unwrap().unwrap().as_str(), "http://proxy.local:3128/");

        options.set("proxyHost", "proxy.local:8080").unwrap();
        assert_eq!(proxy_url(&options).unwrap().unwrap().as_str(), "http://proxy.local:8080/");

        options.set("proxyHost", "https://secure.proxy").unwrap();
        options.set("proxyPort", Option::<i64>::None).unwrap();
        assert_eq!(proxy_url(&options).unwrap().unwrap().as_str(), "https://secure.proxy/");
    }

    #[test]
    fn test_proxy_credentials_accepted() {
        let mut options = ClientOptions::default();
        options.set("proxyHost", "proxy.local:3128").unwrap();
        options.set("proxyUsername", "user").unwrap();
        options.set("proxyPassword", "secret").unwrap();
        assert!(ReqwestTransport::from_options(&options).is_ok());
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("http_rpc-{}-{}", std::process::id(), name))
    }

    fn rejected_option(options: &ClientOptions) -> String {
        match ReqwestTransport::from_options(options).unwrap_err() {
            RpcError::InvalidOption { option, .. } => option,
            other => panic!("expected an option error, got {:?}", other),
        }
    }

    #[test]
    fn test_tls_key_pass_rejected() {
        let mut options = ClientOptions::default();
        options.set("tlsCert", "/nonexistent/http_rpc/client.pem").unwrap();
        options.set("tlsKey", "/nonexistent/http_rpc/client.key").unwrap();
        options.set("tlsKeyPass", "hunter2").unwrap();
        assert_eq!(rejected_option(&options), "tlsKeyPass");
    }

    #[test]
    fn test_unreadable_client_identity_files() {
        let mut options = ClientOptions::default();
        options.set("tlsCert", "/nonexistent/http_rpc/client.pem").unwrap();
        options.set("tlsKey", "/nonexistent/http_rpc/client.key").unwrap();
        assert_eq!(rejected_option(&options), "tlsCert");

        let cert = scratch_path("client.pem");
        std::fs::write(&cert, "-----BEGIN CERTIFICATE-----\n").unwrap();
        options.set("tlsCert", cert.to_string_lossy().into_owned()).unwrap();
        assert_eq!(rejected_option(&options), "tlsKey");

        // a PKCS#12 bundle that is not one
        options.set("tlsKey", Option::<String>::None).unwrap();
        options.set("tlsCertPass", "pass").unwrap();
        assert_eq!(rejected_option(&options), "tlsCert");

        std::fs::remove_file(&cert).unwrap();
    }

    #[test]
    fn test_ca_cert_dir() {
        let mut options = ClientOptions::default();
        options.set("tlsCACertDir", "/nonexistent/http_rpc/certs").unwrap();
        assert_eq!(rejected_option(&options), "tlsCACertDir");

        let dir = scratch_path("empty-certs");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("README"), "not a certificate").unwrap();
        options.set("tlsCACertDir", dir.to_string_lossy().into_owned()).unwrap();
        assert!(ReqwestTransport::from_options(&options).is_ok());

        std::fs::write(dir.join("broken.pem"), "garbage").unwrap();
        assert_eq!(rejected_option(&options), "tlsCACertDir");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_from_options_missing_ca_file() {
        let mut options = ClientOptions::default();
        options
            .set("tlsCACert", "/nonexistent/http_rpc/ca.pem")
            .unwrap();
        let err = ReqwestTransport::from_options(&options).unwrap_err();
        assert!(matches!(err, RpcError::InvalidOption { ref option, .. } if option == "tlsCACert"));
    }
}
