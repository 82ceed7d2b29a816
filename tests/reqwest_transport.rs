//! The built-in reqwest transport against a mock HTTP server.

use async_trait::async_trait;
use http_rpc::charset::EntityFormat;
use http_rpc::client::{
    ExceptionPolicy, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError,
};
use http_rpc::fault::Fault;
use http_rpc::protocol::{RequestFactory, ResponseDecoder, WireFormat};
use http_rpc::types::{DecodeOptions, RequestOptions};
use http_rpc::{FaultKind, Request, Response, RpcClient, RpcError, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

struct ResultDecoder;

impl ResponseDecoder for ResultDecoder {
    fn decode(
        &self,
        _request: &Request,
        body: &[u8],
        _headers: &BTreeMap<String, String>,
        _options: &DecodeOptions,
    ) -> Result<Response, Fault> {
        let doc: Value = serde_json::from_slice(body)
            .map_err(|e| Fault::with_detail(FaultKind::InvalidReturn, e.to_string()))?;
        Ok(Response::from_value(doc["result"].clone()))
    }
}

struct PlainJson;

impl RequestFactory for PlainJson {
    fn create_request(
        &self,
        method_name: &str,
        params: Vec<Value>,
        _options: &RequestOptions,
    ) -> http_rpc::Result<Request> {
        let body = serde_json::json!({ "method": method_name, "params": params }).to_string();
        Ok(Request::new(method_name, params, body, Arc::new(ResultDecoder))
            .with_header("Content-Type", "application/json"))
    }
}

impl WireFormat for PlainJson {
    fn name(&self) -> &str {
        "plain-json"
    }

    fn entity_format(&self) -> EntityFormat {
        EntityFormat::Json
    }
}

struct Unreachable;

#[async_trait]
impl HttpTransport for Unreachable {
    async fn send_request(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Unavailable)
    }
}

#[tokio::test]
async fn test_send_request_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rpc")
        .match_header("x-trace", "1")
        .match_body(r#"{"ping":true}"#)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result":"pong"}"#)
        .create_async()
        .await;

    let mut headers = BTreeMap::new();
    headers.insert("x-trace".to_string(), "1".to_string());
    let request = HttpRequest {
        method: http::Method::POST,
        uri: Url::parse(&format!("{}/rpc", server.url())).unwrap(),
        headers,
        body: bytes::Bytes::from_static(br#"{"ping":true}"#),
        protocol_version: "1.1".to_string(),
    };

    let response = ReqwestTransport::new().send_request(request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(&response.body[..], br#"{"result":"pong"}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_call_over_builtin_transport() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/RPC2")
        .match_header("content-type", "application/json")
        .match_header("user-agent", "integration/1")
        .with_status(200)
        .with_body(r#"{"result":"hello"}"#)
        .create_async()
        .await;

    let client = RpcClient::builder(format!("{}/RPC2", server.url()), Arc::new(PlainJson))
        .option("userAgent", "integration/1")
        .option("timeout", 5)
        .build()
        .unwrap();

    let value = client.call("echo", vec![Value::from("hello")]).await.unwrap();
    assert_eq!(value, Value::from("hello"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_status_raised() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/RPC2")
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let client = RpcClient::new(format!("{}/RPC2", server.url()), Arc::new(PlainJson)).unwrap();
    let err = client.call("echo", vec![]).await.unwrap_err();

    match err {
        RpcError::Transport(fault) => {
            assert_eq!(fault.kind(), Some(FaultKind::HttpError));
            assert!(fault.message.ends_with("(HTTP 404)"));
        }
        other => panic!("expected a transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gzip_request_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/RPC2")
        .match_header("content-encoding", "gzip")
        .with_status(200)
        .with_body(r#"{"result":1}"#)
        .create_async()
        .await;

    let client = RpcClient::builder(format!("{}/RPC2", server.url()), Arc::new(PlainJson))
        .option("requestCompression", "gzip")
        .build()
        .unwrap();

    assert_eq!(client.call("one", vec![]).await.unwrap(), Value::from(1));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_always_mode_ignores_injected_transport() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/RPC2")
        .with_status(200)
        .with_body(r#"{"result":"builtin"}"#)
        .create_async()
        .await;

    let client = RpcClient::builder(format!("{}/RPC2", server.url()), Arc::new(PlainJson))
        .transport(Arc::new(Unreachable))
        .option("transportMode", "always")
        .build()
        .unwrap();

    assert_eq!(client.call("who", vec![]).await.unwrap(), Value::from("builtin"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_captured() {
    let client = RpcClient::builder("http://127.0.0.1:1/RPC2", Arc::new(PlainJson))
        .option("exceptionPolicy", ExceptionPolicy::NEVER)
        .option("timeout", 5)
        .build()
        .unwrap();

    let request = client
        .create_request("echo", vec![], RequestOptions::default())
        .unwrap();
    let response = client.send(&request).await.unwrap();
    assert_eq!(response.fault().map(|f| f.code), Some(8));
}

#[tokio::test]
async fn test_tls_words_in_url_stay_transport_failures() {
    let client = RpcClient::builder("http://127.0.0.1:1/ssl/tls/certificate/RPC2", Arc::new(PlainJson))
        .option("exceptionPolicy", ExceptionPolicy::NEVER)
        .option("timeout", 5)
        .build()
        .unwrap();

    let request = client
        .create_request("echo", vec![], RequestOptions::default())
        .unwrap();
    let fault = client.send(&request).await.unwrap().fault().cloned().unwrap();
    assert_eq!(fault.kind(), Some(FaultKind::TransportFailure));
    assert!(!fault.message.contains("/ssl/"));
}
