//! Charset conversion with entity escaping.
//!
//! Characters that cannot travel in the destination charset are replaced by the
//! wire format's entities, which every conforming parser understands no matter
//! which charset the message was transmitted in. When a message goes out without
//! a declared charset the output must be plain US-ASCII.

use super::tables::{EntityFormat, EntityTable, SubstitutionTable};
use crate::error::{Result, RpcError};
use std::fmt;

/// Charsets the converter can read from or write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    /// No charset declared; treated as strict US-ASCII on output
    Unspecified,
    /// US-ASCII
    UsAscii,
    /// ISO-8859-1 (latin-1)
    Iso88591,
    /// UTF-8
    Utf8,
    /// Windows-1252
    Cp1252,
}

impl Charset {
    /// Parse a charset label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "" => Some(Charset::Unspecified),
            "US-ASCII" | "ASCII" => Some(Charset::UsAscii),
            "ISO-8859-1" | "LATIN1" => Some(Charset::Iso88591),
            "UTF-8" | "UTF8" => Some(Charset::Utf8),
            "CP1252" | "WINDOWS-1252" => Some(Charset::Cp1252),
            _ => None,
        }
    }

    /// Canonical label; empty for [`Charset::Unspecified`].
    pub fn as_str(self) -> &'static str {
        match self {
            Charset::Unspecified => "",
            Charset::UsAscii => "US-ASCII",
            Charset::Iso88591 => "ISO-8859-1",
            Charset::Utf8 => "UTF-8",
            Charset::Cp1252 => "CP1252",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charsets whose repertoire contains the key charset.
const CHARSET_SUPERSETS: &[(&str, &[&str])] = &[(
    "US-ASCII",
    &[
        "ISO-8859-1", "ISO-8859-2", "ISO-8859-3", "ISO-8859-4", "ISO-8859-5", "ISO-8859-6",
        "ISO-8859-7", "ISO-8859-8", "ISO-8859-9", "ISO-8859-10", "ISO-8859-11", "ISO-8859-12",
        "ISO-8859-13", "ISO-8859-14", "ISO-8859-15", "UTF-8", "EUC-JP", "EUC-", "EUC-KR",
        "EUC-CN",
    ],
)];

/// Check whether `encoding` is acceptable given a list of accepted charsets.
///
/// True when `encoding` appears in `valid_list`, or when some entry of `valid_list`
/// is a registered superset of `encoding`. Comparison ignores case.
///
/// # Examples
///
/// ```
/// use http_rpc::charset::is_valid_charset;
///
/// assert!(is_valid_charset("utf-8", ["UTF-8"]));
/// assert!(is_valid_charset("US-ASCII", ["ISO-8859-1"]));
/// assert!(!is_valid_charset("US-ASCII", ["SHIFT-JIS"]));
/// ```
pub fn is_valid_charset<I, S>(encoding: &str, valid_list: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let encoding = encoding.trim().to_ascii_uppercase();
    let valid: Vec<String> = valid_list
        .into_iter()
        .map(|s| s.as_ref().trim().to_ascii_uppercase())
        .collect();

    if valid.iter().any(|v| *v == encoding) {
        return true;
    }

    CHARSET_SUPERSETS
        .iter()
        .find(|(subset, _)| *subset == encoding)
        .map(|(_, supersets)| valid.iter().any(|v| supersets.contains(&v.as_str())))
        .unwrap_or(false)
}

/// Converts text between charsets, escaping with one wire format's entities.
///
/// A converter is immutable once shared; the only mutation,
/// [`enable_extended_conversion`](Self::enable_extended_conversion), takes `&mut self`
/// and so must happen before the converter is published. See
/// [`ConverterRegistry`](super::ConverterRegistry) for shared instances.
///
/// # Examples
///
/// ```
/// use http_rpc::charset::{CharsetConverter, EntityFormat};
///
/// let xml = CharsetConverter::new(EntityFormat::Xml);
/// let out = xml.encode_entities("café & co".as_bytes(), "UTF-8", "US-ASCII").unwrap();
/// assert_eq!(out, b"caf&#233; &amp; co");
///
/// let json = CharsetConverter::new(EntityFormat::Json);
/// let out = json.encode_entities("a/é".as_bytes(), "UTF-8", "").unwrap();
/// assert_eq!(out, br"a\/\u00e9");
/// ```
#[derive(Debug, Clone)]
pub struct CharsetConverter {
    table: EntityTable,
}

impl CharsetConverter {
    /// Create a converter with the default tables for `format`
    pub fn new(format: EntityFormat) -> Self {
        CharsetConverter {
            table: EntityTable::new(format),
        }
    }

    /// Converter for XML numeric character references
    pub fn xml() -> Self {
        Self::new(EntityFormat::Xml)
    }

    /// Converter for JSON `\uXXXX` escapes
    pub fn json() -> Self {
        Self::new(EntityFormat::Json)
    }

    /// Enable conversions from windows-1252.
    ///
    /// Kept separate from construction since most users never need the extra table.
    pub fn enable_extended_conversion(&mut self) {
        self.table.enable_extended_range();
    }

    /// Builder-style variant of [`enable_extended_conversion`](Self::enable_extended_conversion)
    pub fn with_extended_conversion(mut self) -> Self {
        self.enable_extended_conversion();
        self
    }

    /// Whether windows-1252 conversions are enabled
    pub fn has_extended_conversion(&self) -> bool {
        self.table.extended_range().is_some()
    }

    /// Wire format of this converter
    pub fn format(&self) -> EntityFormat {
        self.table.format()
    }

    /// Underlying tables
    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    /// Convert `data` from `src_encoding` to `dest_encoding`, escaping what the
    /// destination cannot carry.
    ///
    /// # Errors
    ///
    /// - [`RpcError::UnsupportedConversion`] for an unknown label, a pair outside the
    ///   supported matrix, or a windows-1252 source without extended conversion enabled.
    /// - [`RpcError::MalformedUtf8`] when UTF-8 input is truncated or invalid.
    pub fn encode_entities(
        &self,
        data: &[u8],
        src_encoding: &str,
        dest_encoding: &str,
    ) -> Result<Vec<u8>> {
        let unsupported = |reason| RpcError::UnsupportedConversion {
            src: src_encoding.to_string(),
            dest: dest_encoding.to_string(),
            reason,
        };
        let src = Charset::from_label(src_encoding).ok_or_else(|| unsupported("not supported"))?;
        let dest = Charset::from_label(dest_encoding).ok_or_else(|| unsupported("not supported"))?;

        let always = self.table.always_encode();
        let latin1 = self.table.latin1_range();

        use Charset::*;
        let escaped = match (src, dest) {
            (Iso88591, Iso88591)
            | (UsAscii, UsAscii | Utf8 | Unspecified | Iso88591)
            | (Utf8, Utf8)
            | (Cp1252, Cp1252) => always.apply(data),

            (Iso88591, Unspecified | UsAscii) => latin1.apply(&always.apply(data)),

            (Iso88591, Utf8) => latin1_to_utf8(&always.apply(data)),

            (Utf8, Unspecified | UsAscii) => self.decode_utf8(data, false)?,

            (Utf8, Iso88591) => self.decode_utf8(data, true)?,

            (Cp1252, Unspecified | UsAscii) => {
                let extended = self.extended().ok_or_else(|| unsupported("not enabled"))?;
                extended.apply(&latin1.apply(&always.apply(data)))
            }

            (Cp1252, Utf8) => {
                let extended = self.extended().ok_or_else(|| unsupported("not enabled"))?;
                latin1_to_utf8(&extended.apply(&always.apply(data)))
            }

            (Cp1252, Iso88591) => {
                let extended = self.extended().ok_or_else(|| unsupported("not enabled"))?;
                extended.apply(&always.apply(data))
            }

            _ => return Err(unsupported("not supported")),
        };

        Ok(escaped)
    }

    /// Check whether `encoding` is acceptable given `valid_list`; see [`is_valid_charset`].
    pub fn is_valid_charset<I, S>(&self, encoding: &str, valid_list: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        is_valid_charset(encoding, valid_list)
    }

    fn extended(&self) -> Option<&SubstitutionTable> {
        self.table.extended_range()
    }

    /// Decode UTF-8, escaping ASCII with the always-encode table and everything
    /// else with entities. With `latin1_passthrough`, code points 160–255 are
    /// written as their latin-1 byte.
    fn decode_utf8(&self, data: &[u8], latin1_passthrough: bool) -> Result<Vec<u8>> {
        let always = self.table.always_encode();
        let format = self.table.format();
        let mut out = Vec::with_capacity(data.len() + data.len() / 4);
        let mut pos = 0;

        while pos < data.len() {
            let lead = data[pos];
            let (len, bits) = match lead {
                0x00..=0x7F => {
                    always.write(lead, &mut out);
                    pos += 1;
                    continue;
                }
                b if b >> 5 == 0b110 => (2, (b & 0x1F) as u32),
                b if b >> 4 == 0b1110 => (3, (b & 0x0F) as u32),
                b if b >> 3 == 0b11110 => (4, (b & 0x07) as u32),
                _ => {
                    return Err(RpcError::MalformedUtf8 {
                        offset: pos,
                        reason: "invalid lead byte",
                    })
                }
            };

            let tail = data.get(pos + 1..pos + len).ok_or(RpcError::MalformedUtf8 {
                offset: pos,
                reason: "truncated sequence",
            })?;

            let mut code_point = bits;
            for &byte in tail {
                if byte & 0xC0 != 0x80 {
                    return Err(RpcError::MalformedUtf8 {
                        offset: pos,
                        reason: "invalid continuation byte",
                    });
                }
                code_point = (code_point << 6) | (byte & 0x3F) as u32;
            }
            if code_point > 0x10_FFFF {
                return Err(RpcError::MalformedUtf8 {
                    offset: pos,
                    reason: "code point out of range",
                });
            }

            // overlong forms and UTF-16 surrogates have no valid entity
            let shortest = match len {
                2 => 0x80,
                3 => 0x800,
                _ => 0x1_0000,
            };
            if code_point < shortest || (0xD800..=0xDFFF).contains(&code_point) {
                return Err(RpcError::MalformedUtf8 {
                    offset: pos,
                    reason: "invalid code point",
                });
            }

            if latin1_passthrough && (160..=255).contains(&code_point) {
                out.push(code_point as u8);
            } else {
                format.write_entity(code_point, &mut out);
            }
            pos += len;
        }

        Ok(out)
    }
}

/// Re-encode latin-1 bytes as UTF-8.
fn latin1_to_utf8(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 4);
    for &byte in data {
        if byte < 0x80 {
            out.push(byte);
        } else {
            out.push(0xC0 | (byte >> 6));
            out.push(0x80 | (byte & 0x3F));
        }
    }
    out
}
