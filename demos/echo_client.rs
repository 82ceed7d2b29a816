//! JSON-RPC 2.0 client calling a remote `echo` method.
//!
//! Run with:
//! ```sh
//! cargo run --example echo_client -- http://localhost:8080/rpc hello
//! ```

use http_rpc::charset::EntityFormat;
use http_rpc::client::ExceptionPolicy;
use http_rpc::fault::Fault;
use http_rpc::protocol::{format_content_type, RequestFactory, ResponseDecoder, WireFormat};
use http_rpc::types::{DecodeOptions, RequestOptions};
use http_rpc::{FaultKind, Request, Response, ReturnType, RpcClient, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

struct JsonRpcDecoder;

impl ResponseDecoder for JsonRpcDecoder {
    fn decode(
        &self,
        _request: &Request,
        body: &[u8],
        _headers: &BTreeMap<String, String>,
        options: &DecodeOptions,
    ) -> Result<Response, Fault> {
        if options.return_type == ReturnType::Raw {
            return Ok(Response::from_value(Value::from(
                String::from_utf8_lossy(body).into_owned(),
            )));
        }

        let doc: Value = serde_json::from_slice(body)
            .map_err(|e| Fault::with_detail(FaultKind::InvalidReturn, e.to_string()))?;

        if let Some(error) = doc.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error.get("message").and_then(Value::as_str).unwrap_or("");
            return Ok(Response::from_fault(Fault::new(code as i32, message)));
        }

        match doc.get("result") {
            Some(result) => Ok(Response::from_value(result.clone())),
            None => Err(Fault::with_detail(FaultKind::InvalidReturn, "(no result member)")),
        }
    }
}

struct JsonRpc;

impl JsonRpc {
    /// Serialize `value`, running string contents through the charset converter.
    fn write_value(&self, value: &Value, charset: &str, out: &mut Vec<u8>) -> http_rpc::Result<()> {
        match value {
            Value::String(s) => {
                out.push(b'"');
                out.extend(self.charset_converter().encode_entities(s.as_bytes(), "UTF-8", charset)?);
                out.push(b'"');
            }
            Value::Array(items) => {
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.write_value(item, charset, out)?;
                }
                out.push(b']');
            }
            Value::Object(members) => {
                out.push(b'{');
                for (i, (key, item)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.write_value(&Value::from(key.as_str()), charset, out)?;
                    out.push(b':');
                    self.write_value(item, charset, out)?;
                }
                out.push(b'}');
            }
            other => out.extend(other.to_string().into_bytes()),
        }
        Ok(())
    }
}

impl RequestFactory for JsonRpc {
    fn create_request(
        &self,
        method_name: &str,
        params: Vec<Value>,
        options: &RequestOptions,
    ) -> http_rpc::Result<Request> {
        let charset = options.charset_encoding.as_deref().unwrap_or("UTF-8");
        let envelope = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method_name,
            "params": &params,
            "id": 1,
        });

        let mut body = Vec::new();
        self.write_value(&envelope, charset, &mut body)?;

        Ok(Request::new(method_name, params, body, Arc::new(JsonRpcDecoder))
            .with_header("Content-Type", format_content_type("application/json", Some(charset)))
            .with_charset_encoding(charset))
    }
}

impl WireFormat for JsonRpc {
    fn name(&self) -> &str {
        "jsonrpc"
    }

    fn entity_format(&self) -> EntityFormat {
        EntityFormat::Json
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let uri = args
        .next()
        .unwrap_or_else(|| "http://localhost:8080/rpc".to_string());
    let message = args.next().unwrap_or_else(|| "hello".to_string());

    let client = RpcClient::builder(uri, Arc::new(JsonRpc))
        .option("exceptionPolicy", ExceptionPolicy::TRANSPORT)
        .option("acceptedCompression", "gzip, deflate")
        .option("timeout", 10)
        .option("requestCharsetEncoding", "US-ASCII")
        .option("debug", 1)
        .build()?;

    let request = client.create_request("echo", vec![Value::from(message)], RequestOptions::new())?;
    let response = client.send(&request).await?;

    match response.fault() {
        Some(fault) => println!("fault {}: {}", fault.code, fault.message),
        None => println!("result: {}", response.value().unwrap_or(&Value::Null)),
    }

    Ok(())
}
