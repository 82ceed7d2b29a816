//! Client configuration options.
//!
//! Options form a map with a fixed key set. Every key has a default, unknown keys are
//! rejected, and each value is type-checked (and normalized) before it is stored.
//!
//! # Options
//!
//! | Key | Default | Accepted values |
//! |-----|---------|-----------------|
//! | `httpVersion` | null | `"1.0"`, `"1.1"`, `"2"`, `"2.0"` |
//! | `keepAlive` | true | bool |
//! | `userAgent` | null | string |
//! | `acceptedCharsetEncodings` | null | list or comma-separated string |
//! | `requestCharsetEncoding` | null | charset label |
//! | `timeout` | null | seconds, integer ≥ 0 |
//! | `transportMode` | 2 (auto) | 0 never, 1 always, 2 auto |
//! | `requestCompression` | null | `"gzip"`, `"deflate"` |
//! | `acceptedCompression` | null | list of `"gzip"`, `"deflate"` |
//! | `username`, `password` | null | string |
//! | `authType`, `proxyAuthType` | null | `"basic"` |
//! | `proxyHost`, `proxyUsername`, `proxyPassword` | null | string |
//! | `proxyPort` | null | 1–65535 |
//! | `tlsVersion` | null | `"1.0"` to `"1.2"` (minimum version) |
//! | `tlsVerifyHost`, `tlsVerifyPeer` | null | bool |
//! | `tlsCert`, `tlsCertPass`, `tlsKey`, `tlsKeyPass`, `tlsCACert`, `tlsCACertDir` | null | path or secret |
//! | `exceptionPolicy` | 7 (always) | bitmask 0–7 |
//! | `returnType` | `"native"` | `"native"`, `"wire"`, `"raw"` |
//! | `debug` | 0 | integer ≥ 0 |
//!
//! # Examples
//!
//! ```
//! use http_rpc::client::{ClientOptions, ExceptionPolicy, OptionValue};
//!
//! let mut options = ClientOptions::default();
//! options.set("timeout", 30).unwrap();
//! options.set("exceptionPolicy", ExceptionPolicy::TRANSPORT).unwrap();
//! assert_eq!(options.get("timeout").unwrap(), &OptionValue::Int(30));
//! assert!(options.set("bogus", true).is_err());
//! ```

use crate::charset::Charset;
use crate::error::{Result, RpcError};
use crate::protocol::{parse_charset_list, parse_token_list};
use crate::types::ReturnType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use std::time::Duration;

/// Which failure classes `send` returns as errors instead of fault responses.
///
/// Bits combine freely:
///
/// ```
/// use http_rpc::client::ExceptionPolicy;
///
/// let policy = ExceptionPolicy::TRANSPORT | ExceptionPolicy::PROTOCOL;
/// assert!(policy.contains(ExceptionPolicy::TRANSPORT));
/// assert!(!policy.contains(ExceptionPolicy::RESPONSE_FORMAT));
/// assert_eq!(ExceptionPolicy::ALWAYS.bits(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionPolicy(u8);

impl ExceptionPolicy {
    /// Never return errors, always a Response
    pub const NEVER: Self = Self(0);
    /// Return HTTP/connection failures as errors
    pub const TRANSPORT: Self = Self(1);
    /// Return body decoding failures as errors
    pub const RESPONSE_FORMAT: Self = Self(2);
    /// Return faults declared by the remote peer as errors
    pub const PROTOCOL: Self = Self(4);
    /// All of the above
    pub const ALWAYS: Self = Self(7);

    /// Build from raw bits; `None` if unknown bits are set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALWAYS.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ExceptionPolicy {
    fn default() -> Self {
        Self::ALWAYS
    }
}

impl BitOr for ExceptionPolicy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExceptionPolicy {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Whether the built-in HTTP transport may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Only an injected transport is used
    Never = 0,
    /// The built-in transport is used even when one was injected
    Always = 1,
    /// The injected transport if present, else the built-in one
    #[default]
    Auto = 2,
}

impl TransportMode {
    fn from_int(value: i64) -> Option<Self> {
        match value {
            0 => Some(TransportMode::Never),
            1 => Some(TransportMode::Always),
            2 => Some(TransportMode::Auto),
            _ => None,
        }
    }
}

/// HTTP body compression schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// `gzip`
    Gzip,
    /// `deflate` (zlib-wrapped)
    Deflate,
}

impl Compression {
    /// Content-Encoding token
    pub fn as_str(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Deflate => "deflate",
        }
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" => Ok(Compression::Gzip),
            "deflate" => Ok(Compression::Deflate),
            other => Err(format!("unsupported compression: {}", other)),
        }
    }
}

/// Recognized option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum OptionName {
    HttpVersion,
    KeepAlive,
    UserAgent,
    AcceptedCharsetEncodings,
    RequestCharsetEncoding,
    Timeout,
    TransportMode,
    RequestCompression,
    AcceptedCompression,
    Username,
    Password,
    AuthType,
    ProxyHost,
    ProxyPort,
    ProxyUsername,
    ProxyPassword,
    ProxyAuthType,
    TlsVersion,
    TlsVerifyHost,
    TlsVerifyPeer,
    TlsCert,
    TlsCertPass,
    TlsCaCert,
    TlsCaCertDir,
    TlsKey,
    TlsKeyPass,
    ExceptionPolicy,
    ReturnType,
    Debug,
}

impl OptionName {
    /// Every key, in listing order.
    pub const ALL: [OptionName; 29] = [
        OptionName::HttpVersion,
        OptionName::KeepAlive,
        OptionName::UserAgent,
        OptionName::AcceptedCharsetEncodings,
        OptionName::RequestCharsetEncoding,
        OptionName::Timeout,
        OptionName::TransportMode,
        OptionName::RequestCompression,
        OptionName::AcceptedCompression,
        OptionName::Username,
        OptionName::Password,
        OptionName::AuthType,
        OptionName::ProxyHost,
        OptionName::ProxyPort,
        OptionName::ProxyUsername,
        OptionName::ProxyPassword,
        OptionName::ProxyAuthType,
        OptionName::TlsVersion,
        OptionName::TlsVerifyHost,
        OptionName::TlsVerifyPeer,
        OptionName::TlsCert,
        OptionName::TlsCertPass,
        OptionName::TlsCaCert,
        OptionName::TlsCaCertDir,
        OptionName::TlsKey,
        OptionName::TlsKeyPass,
        OptionName::ExceptionPolicy,
        OptionName::ReturnType,
        OptionName::Debug,
    ];

    /// Option key as used by `get_option`/`set_option`
    pub const fn as_str(self) -> &'static str {
        match self {
            OptionName::HttpVersion => "httpVersion",
            OptionName::KeepAlive => "keepAlive",
            OptionName::UserAgent => "userAgent",
            OptionName::AcceptedCharsetEncodings => "acceptedCharsetEncodings",
            OptionName::RequestCharsetEncoding => "requestCharsetEncoding",
            OptionName::Timeout => "timeout",
            OptionName::TransportMode => "transportMode",
            OptionName::RequestCompression => "requestCompression",
            OptionName::AcceptedCompression => "acceptedCompression",
            OptionName::Username => "username",
            OptionName::Password => "password",
            OptionName::AuthType => "authType",
            OptionName::ProxyHost => "proxyHost",
            OptionName::ProxyPort => "proxyPort",
            OptionName::ProxyUsername => "proxyUsername",
            OptionName::ProxyPassword => "proxyPassword",
            OptionName::ProxyAuthType => "proxyAuthType",
            OptionName::TlsVersion => "tlsVersion",
            OptionName::TlsVerifyHost => "tlsVerifyHost",
            OptionName::TlsVerifyPeer => "tlsVerifyPeer",
            OptionName::TlsCert => "tlsCert",
            OptionName::TlsCertPass => "tlsCertPass",
            OptionName::TlsCaCert => "tlsCACert",
            OptionName::TlsCaCertDir => "tlsCACertDir",
            OptionName::TlsKey => "tlsKey",
            OptionName::TlsKeyPass => "tlsKeyPass",
            OptionName::ExceptionPolicy => "exceptionPolicy",
            OptionName::ReturnType => "returnType",
            OptionName::Debug => "debug",
        }
    }

    /// Default value of this option
    pub fn default_value(self) -> OptionValue {
        match self {
            OptionName::KeepAlive => OptionValue::Bool(true),
            OptionName::TransportMode => OptionValue::Int(TransportMode::Auto as i64),
            OptionName::ExceptionPolicy => OptionValue::Int(ExceptionPolicy::ALWAYS.bits() as i64),
            OptionName::ReturnType => OptionValue::Text(ReturnType::Native.as_str().to_string()),
            OptionName::Debug => OptionValue::Int(0),
            _ => OptionValue::Null,
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionName {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RpcError::UnsupportedOption(s.to_string()))
    }
}

/// Value of a client option.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Unset
    #[default]
    Null,
    /// Flag
    Bool(bool),
    /// Number
    Int(i64),
    /// String
    Text(String),
    /// List of strings
    List(Vec<String>),
}

impl OptionValue {
    /// Whether the value is unset
    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Null)
    }

    /// Flag value, if this is a flag
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Number value, if this is a number
    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// String value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List value; empty unless this is a list
    pub fn as_list(&self) -> &[String] {
        match self {
            OptionValue::List(items) => items,
            _ => &[],
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<u16> for OptionValue {
    fn from(value: u16) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

impl From<Vec<&str>> for OptionValue {
    fn from(value: Vec<&str>) -> Self {
        OptionValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<ExceptionPolicy> for OptionValue {
    fn from(value: ExceptionPolicy) -> Self {
        OptionValue::Int(value.bits() as i64)
    }
}

impl From<TransportMode> for OptionValue {
    fn from(value: TransportMode) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<ReturnType> for OptionValue {
    fn from(value: ReturnType) -> Self {
        OptionValue::Text(value.as_str().to_string())
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(OptionValue::Null)
    }
}

/// Validated option map.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    values: BTreeMap<OptionName, OptionValue>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            values: OptionName::ALL
                .iter()
                .map(|name| (*name, name.default_value()))
                .collect(),
        }
    }
}

impl ClientOptions {
    /// Option keys, in listing order
    pub fn names() -> Vec<&'static str> {
        OptionName::ALL.iter().map(|name| name.as_str()).collect()
    }

    /// Load options from a JSON object of key → value.
    ///
    /// # Errors
    ///
    /// [`RpcError::UnsupportedOption`] for an unknown key, [`RpcError::InvalidOption`]
    /// for a rejected value or when `config` is not an object.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_rpc::client::{ClientOptions, ExceptionPolicy};
    /// use serde_json::json;
    ///
    /// let options = ClientOptions::from_json(&json!({
    ///     "timeout": 10,
    ///     "exceptionPolicy": 0,
    ///     "acceptedCharsetEncodings": "UTF-8, ISO-8859-1",
    /// })).unwrap();
    /// assert_eq!(options.exception_policy(), ExceptionPolicy::NEVER);
    /// assert_eq!(options.accepted_charset_encodings(), ["UTF-8", "ISO-8859-1"]);
    /// ```
    pub fn from_json(config: &serde_json::Value) -> Result<Self> {
        let entries = config
            .as_object()
            .ok_or_else(|| RpcError::invalid_option("<config>", "expected a JSON object"))?;

        let mut options = Self::default();
        for (name, raw) in entries {
            let value: OptionValue = serde_json::from_value(raw.clone())
                .map_err(|e| RpcError::invalid_option(name.as_str(), e.to_string()))?;
            options.set(name, value)?;
        }
        Ok(options)
    }

    /// Current value of `name`.
    ///
    /// # Errors
    ///
    /// [`RpcError::UnsupportedOption`] if `name` is not a recognized key.
    pub fn get(&self, name: &str) -> Result<&OptionValue> {
        let key: OptionName = name.parse()?;
        Ok(self.value(key))
    }

    /// Current value of a known key
    pub fn value(&self, name: OptionName) -> &OptionValue {
        static NULL: OptionValue = OptionValue::Null;
        self.values.get(&name).unwrap_or(&NULL)
    }

    /// Validate and store a value.
    ///
    /// # Errors
    ///
    /// [`RpcError::UnsupportedOption`] for an unknown key, [`RpcError::InvalidOption`]
    /// when the value has the wrong type or is out of range.
    pub fn set(&mut self, name: &str, value: impl Into<OptionValue>) -> Result<()> {
        let key: OptionName = name.parse()?;
        let value = Self::validate(key, value.into())?;
        self.values.insert(key, value);
        Ok(())
    }

    /// Store a value that already went through [`validate`](Self::validate).
    pub(crate) fn insert_validated(&mut self, name: OptionName, value: OptionValue) {
        self.values.insert(name, value);
    }

    /// Values that differ from their defaults
    pub fn overrides(&self) -> impl Iterator<Item = (OptionName, &OptionValue)> {
        self.values
            .iter()
            .filter(|(name, value)| **value != name.default_value())
            .map(|(name, value)| (*name, value))
    }

    /// Type-check `value` for `name`, returning its normalized form.
    ///
    /// # Errors
    ///
    /// [`RpcError::InvalidOption`] describing the rejected value.
    pub fn validate(name: OptionName, value: OptionValue) -> Result<OptionValue> {
        use OptionValue::*;
        let invalid = |reason: &str| RpcError::invalid_option(name.as_str(), reason);

        match name {
            OptionName::KeepAlive => match value {
                Bool(_) => Ok(value),
                _ => Err(invalid("expected a boolean")),
            },

            OptionName::TlsVerifyHost | OptionName::TlsVerifyPeer => match value {
                Null | Bool(_) => Ok(value),
                _ => Err(invalid("expected a boolean or null")),
            },

            OptionName::HttpVersion => one_of(value, &["1.0", "1.1", "2", "2.0"], invalid),

            OptionName::TlsVersion => one_of(value, &["1.0", "1.1", "1.2"], invalid),

            OptionName::AuthType | OptionName::ProxyAuthType => match value {
                Null => Ok(Null),
                Text(ref s) if s.eq_ignore_ascii_case("basic") => Ok(Text("basic".to_string())),
                Text(_) => Err(invalid("only basic authentication is supported")),
                _ => Err(invalid("expected a string or null")),
            },

            OptionName::RequestCharsetEncoding => match value {
                Null => Ok(Null),
                Text(ref s) if Charset::from_label(s).is_some() => Ok(Text(s.trim().to_ascii_uppercase())),
                Text(_) => Err(invalid("unknown charset")),
                _ => Err(invalid("expected a charset label or null")),
            },

            OptionName::AcceptedCharsetEncodings => match value {
                Null => Ok(Null),
                Text(s) => Ok(List(parse_charset_list(&s))),
                List(items) => Ok(List(
                    items.iter().map(|s| s.trim().to_ascii_uppercase()).collect(),
                )),
                _ => Err(invalid("expected a list of charsets or null")),
            },

            OptionName::AcceptedCompression => {
                let tokens = match value {
                    Null => return Ok(Null),
                    Text(s) => parse_token_list(&s),
                    List(items) => items,
                    _ => return Err(invalid("expected a list of encodings or null")),
                };
                tokens
                    .iter()
                    .map(|t| t.parse::<Compression>().map(|c| c.as_str().to_string()))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(List)
                    .map_err(|e| invalid(&e))
            }

            OptionName::RequestCompression => match value {
                Null => Ok(Null),
                Text(s) => s
                    .parse::<Compression>()
                    .map(|c| Text(c.as_str().to_string()))
                    .map_err(|e| invalid(&e)),
                _ => Err(invalid("expected \"gzip\", \"deflate\" or null")),
            },

            OptionName::Timeout | OptionName::Debug => match value {
                Null if name == OptionName::Timeout => Ok(Null),
                Int(n) if n >= 0 => Ok(value),
                _ => Err(invalid("expected a non-negative integer")),
            },

            OptionName::ProxyPort => match value {
                Null => Ok(Null),
                Int(n) if (1..=65535).contains(&n) => Ok(value),
                _ => Err(invalid("expected a port number between 1 and 65535")),
            },

            OptionName::TransportMode => match value {
                Int(n) if TransportMode::from_int(n).is_some() => Ok(value),
                Text(ref s) => match s.to_ascii_lowercase().as_str() {
                    "never" => Ok(TransportMode::Never.into()),
                    "always" => Ok(TransportMode::Always.into()),
                    "auto" => Ok(TransportMode::Auto.into()),
                    _ => Err(invalid("expected never, always or auto")),
                },
                _ => Err(invalid("expected 0 (never), 1 (always) or 2 (auto)")),
            },

            OptionName::ExceptionPolicy => match value {
                Int(n) if (0..=7).contains(&n) => Ok(value),
                _ => Err(invalid("expected a bitmask between 0 and 7")),
            },

            OptionName::ReturnType => match value {
                Text(s) => s
                    .parse::<ReturnType>()
                    .map(ReturnType::into)
                    .map_err(|e| invalid(&e)),
                _ => Err(invalid("expected native, wire or raw")),
            },

            OptionName::UserAgent
            | OptionName::Username
            | OptionName::Password
            | OptionName::ProxyHost
            | OptionName::ProxyUsername
            | OptionName::ProxyPassword
            | OptionName::TlsCert
            | OptionName::TlsCertPass
            | OptionName::TlsCaCert
            | OptionName::TlsCaCertDir
            | OptionName::TlsKey
            | OptionName::TlsKeyPass => match value {
                Null | Text(_) => Ok(value),
                _ => Err(invalid("expected a string or null")),
            },
        }
    }

    // ========== Typed accessors ==========

    /// Exception policy bitmask
    pub fn exception_policy(&self) -> ExceptionPolicy {
        self.value(OptionName::ExceptionPolicy)
            .as_int()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(ExceptionPolicy::from_bits)
            .unwrap_or_default()
    }

    /// Requested value shape
    pub fn return_type(&self) -> ReturnType {
        self.text(OptionName::ReturnType)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Debug level
    pub fn debug(&self) -> u32 {
        self.value(OptionName::Debug)
            .as_int()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.value(OptionName::Timeout)
            .as_int()
            .map(|secs| Duration::from_secs(secs as u64))
    }

    /// Whether connections may be reused
    pub fn keep_alive(&self) -> bool {
        self.value(OptionName::KeepAlive).as_bool().unwrap_or(true)
    }

    /// HTTP protocol version, if pinned
    pub fn http_version(&self) -> Option<&str> {
        self.text(OptionName::HttpVersion)
    }

    /// Built-in transport selection
    pub fn transport_mode(&self) -> TransportMode {
        self.value(OptionName::TransportMode)
            .as_int()
            .and_then(TransportMode::from_int)
            .unwrap_or_default()
    }

    /// Compression applied to request bodies
    pub fn request_compression(&self) -> Option<Compression> {
        self.text(OptionName::RequestCompression)
            .and_then(|s| s.parse().ok())
    }

    /// Compression schemes accepted in responses
    pub fn accepted_compression(&self) -> Vec<Compression> {
        self.value(OptionName::AcceptedCompression)
            .as_list()
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    /// Charsets accepted in responses
    pub fn accepted_charset_encodings(&self) -> &[String] {
        self.value(OptionName::AcceptedCharsetEncodings).as_list()
    }

    /// Proxy port
    pub fn proxy_port(&self) -> Option<u16> {
        self.value(OptionName::ProxyPort)
            .as_int()
            .and_then(|n| u16::try_from(n).ok())
    }

    /// String value of `name`, if set
    pub fn text(&self, name: OptionName) -> Option<&str> {
        self.value(name).as_str()
    }

    /// Flag value of `name`, if set
    pub fn flag(&self, name: OptionName) -> Option<bool> {
        self.value(name).as_bool()
    }
}

fn one_of<F>(value: OptionValue, allowed: &[&str], invalid: F) -> Result<OptionValue>
where
    F: Fn(&str) -> RpcError,
{
    match value {
        OptionValue::Null => Ok(OptionValue::Null),
        OptionValue::Text(ref s) if allowed.contains(&s.as_str()) => Ok(value),
        _ => Err(invalid(&format!("expected one of {}", allowed.join(", ")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.get("keepAlive").unwrap(), &OptionValue::Bool(true));
        assert_eq!(options.get("httpVersion").unwrap(), &OptionValue::Null);
        assert_eq!(options.exception_policy(), ExceptionPolicy::ALWAYS);
        assert_eq!(options.transport_mode(), TransportMode::Auto);
        assert_eq!(options.return_type(), ReturnType::Native);
        assert_eq!(options.debug(), 0);
        assert!(options.timeout().is_none());
        assert_eq!(options.overrides().count(), 0);
    }

    #[test]
    fn test_names_are_the_fixed_key_set() {
        let names = ClientOptions::names();
        assert_eq!(names.len(), 29);
        assert!(names.contains(&"exceptionPolicy"));
        assert!(names.contains(&"tlsCACertDir"));
        for name in names {
            assert!(ClientOptions::default().get(name).is_ok());
        }
    }

    #[test]
    fn test_unknown_option() {
        let mut options = ClientOptions::default();
        assert_eq!(
            options.get("bogus").unwrap_err(),
            RpcError::UnsupportedOption("bogus".into())
        );
        assert!(matches!(
            options.set("bogus", 1),
            Err(RpcError::UnsupportedOption(_))
        ));
    }

    #[test]
    fn test_type_validation() {
        let mut options = ClientOptions::default();
        assert!(options.set("keepAlive", "yes").is_err());
        assert!(options.set("timeout", -1).is_err());
        assert!(options.set("proxyPort", 70000).is_err());
        assert!(options.set("exceptionPolicy", 8).is_err());
        assert!(options.set("httpVersion", "3").is_err());
        assert!(options.set("authType", "ntlm").is_err());
        assert!(options.set("requestCompression", "br").is_err());
        assert!(options.set("requestCharsetEncoding", "KOI8-R").is_err());

        let err = options.set("debug", "loud").unwrap_err();
        assert!(matches!(err, RpcError::InvalidOption { ref option, .. } if option == "debug"));
        // rejected values leave the old one in place
        assert_eq!(options.debug(), 0);
    }

    #[test]
    fn test_normalization() {
        let mut options = ClientOptions::default();
        options.set("acceptedCharsetEncodings", "utf-8, iso-8859-1").unwrap();
        options.set("acceptedCompression", vec!["GZIP", "deflate"]).unwrap();
        options.set("requestCompression", "Deflate").unwrap();
        options.set("transportMode", "never").unwrap();
        options.set("authType", "Basic").unwrap();
        options.set("returnType", "RAW").unwrap();

        assert_eq!(options.accepted_charset_encodings(), ["UTF-8", "ISO-8859-1"]);
        assert_eq!(
            options.accepted_compression(),
            vec![Compression::Gzip, Compression::Deflate]
        );
        assert_eq!(options.request_compression(), Some(Compression::Deflate));
        assert_eq!(options.transport_mode(), TransportMode::Never);
        assert_eq!(options.text(OptionName::AuthType), Some("basic"));
        assert_eq!(options.return_type(), ReturnType::Raw);
    }

    #[test]
    fn test_typed_setters() {
        let mut options = ClientOptions::default();
        options
            .set("exceptionPolicy", ExceptionPolicy::TRANSPORT | ExceptionPolicy::PROTOCOL)
            .unwrap();
        options.set("timeout", 5).unwrap();
        options.set("proxyPort", 8080u16).unwrap();
        options.set("userAgent", None::<String>).unwrap();

        assert_eq!(options.exception_policy().bits(), 5);
        assert_eq!(options.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(options.proxy_port(), Some(8080));
        assert_eq!(options.overrides().count(), 3);
    }

    #[test]
    fn test_from_json() {
        let options = ClientOptions::from_json(&json!({
            "keepAlive": false,
            "debug": 2,
            "proxyHost": "proxy.local",
            "tlsVerifyPeer": null,
        }))
        .unwrap();
        assert!(!options.keep_alive());
        assert_eq!(options.debug(), 2);
        assert_eq!(options.text(OptionName::ProxyHost), Some("proxy.local"));
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(ClientOptions::from_json(&json!([1, 2])).is_err());
        assert!(matches!(
            ClientOptions::from_json(&json!({"nope": 1})),
            Err(RpcError::UnsupportedOption(_))
        ));
        assert!(matches!(
            ClientOptions::from_json(&json!({"timeout": 1.5})),
            Err(RpcError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_tls_version_limited_to_backend() {
        let mut options = ClientOptions::default();
        options.set("tlsVersion", "1.2").unwrap();
        let err = options.set("tlsVersion", "1.3").unwrap_err();
        assert!(matches!(err, RpcError::InvalidOption { ref option, .. } if option == "tlsVersion"));
        assert_eq!(options.text(OptionName::TlsVersion), Some("1.2"));
    }

    #[test]
    fn test_exception_policy_bits() {
        assert_eq!(ExceptionPolicy::from_bits(3), Some(ExceptionPolicy::TRANSPORT | ExceptionPolicy::RESPONSE_FORMAT));
        assert_eq!(ExceptionPolicy::from_bits(8), None);
        assert!(ExceptionPolicy::ALWAYS.contains(ExceptionPolicy::PROTOCOL));
        assert!(!ExceptionPolicy::NEVER.contains(ExceptionPolicy::TRANSPORT));
        assert!(ExceptionPolicy::NEVER.contains(ExceptionPolicy::NEVER));

        let mut policy = ExceptionPolicy::NEVER;
        policy |= ExceptionPolicy::RESPONSE_FORMAT;
        assert_eq!(policy.bits(), 2);
    }
}
