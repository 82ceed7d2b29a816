//! Per-format entity tables.
//!
//! A [`SubstitutionTable`] maps single bytes to their escaped form, keeping the
//! insertion order of its `in`/`out` pairs. An [`EntityTable`] groups the three
//! categories a converter needs:
//!
//! | Category | Bytes | Present |
//! |----------|-------|---------|
//! | `always_encode` | wire-format reserved characters | always |
//! | `latin1_range` | 0–31 and 160–255 | always |
//! | `extended_range` | 128–159 (windows-1252) | only once enabled |

/// Wire format whose escaping conventions drive the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityFormat {
    /// Numeric character references: `&#233;`
    Xml,
    /// Unicode escapes: `\u00e9`
    Json,
}

const XML_ALWAYS_ENCODE: &[(u8, &str)] = &[
    (b'&', "&amp;"),
    (b'"', "&quot;"),
    (b'\'', "&apos;"),
    (b'<', "&lt;"),
    (b'>', "&gt;"),
];

const JSON_ALWAYS_ENCODE: &[(u8, &str)] = &[
    (b'\\', "\\\\"),
    (b'"', "\\\""),
    (b'/', "\\/"),
    (b'\n', "\\n"),
    (b'\r', "\\r"),
    (b'\t', "\\t"),
];

/// Windows-1252 code points for bytes 0x80..=0x9F. `None` marks unassigned slots.
#[rustfmt::skip]
const CP1252_HIGH: [Option<u16>; 32] = [
    Some(0x20AC), None,         Some(0x201A), Some(0x0192),
    Some(0x201E), Some(0x2026), Some(0x2020), Some(0x2021),
    Some(0x02C6), Some(0x2030), Some(0x0160), Some(0x2039),
    Some(0x0152), None,         Some(0x017D), None,
    None,         Some(0x2018), Some(0x2019), Some(0x201C),
    Some(0x201D), Some(0x2022), Some(0x2013), Some(0x2014),
    Some(0x02DC), Some(0x2122), Some(0x0161), Some(0x203A),
    Some(0x0153), None,         Some(0x017E), Some(0x0178),
];

impl EntityFormat {
    /// Characters this format escapes regardless of charset.
    pub fn always_encoded(self) -> &'static [(u8, &'static str)] {
        match self {
            EntityFormat::Xml => XML_ALWAYS_ENCODE,
            EntityFormat::Json => JSON_ALWAYS_ENCODE,
        }
    }

    /// Append the entity for `code_point` to `out`.
    ///
    /// JSON escapes are always four hex digits; code points above U+FFFF are
    /// written as a UTF-16 surrogate pair.
    pub fn write_entity(self, code_point: u32, out: &mut Vec<u8>) {
        match self {
            EntityFormat::Xml => out.extend_from_slice(format!("&#{};", code_point).as_bytes()),
            EntityFormat::Json if code_point > 0xFFFF => {
                let v = code_point - 0x1_0000;
                let high = 0xD800 + (v >> 10);
                let low = 0xDC00 + (v & 0x3FF);
                out.extend_from_slice(format!("\\u{:04x}\\u{:04x}", high, low).as_bytes());
            }
            EntityFormat::Json => out.extend_from_slice(format!("\\u{:04x}", code_point).as_bytes()),
        }
    }

    /// The entity for `code_point` as a string.
    pub fn entity(self, code_point: u32) -> String {
        let mut out = Vec::with_capacity(12);
        self.write_entity(code_point, &mut out);
        // entities are pure ASCII
        String::from_utf8_lossy(&out).into_owned()
    }

    fn extended_entity(self, code_point: u16) -> String {
        match self {
            EntityFormat::Xml => format!("&#x{:04X};", code_point),
            EntityFormat::Json => format!("\\u{:04X}", code_point),
        }
    }
}

/// Ordered single-byte substitution table.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    inputs: Vec<u8>,
    outputs: Vec<String>,
    /// 1-based index into `inputs`/`outputs`; 0 means no entry
    lookup: [u16; 256],
}

impl SubstitutionTable {
    /// Create an empty table
    pub fn new() -> Self {
        SubstitutionTable {
            inputs: Vec::new(),
            outputs: Vec::new(),
            lookup: [0; 256],
        }
    }

    /// Add a substitution. A later entry for the same byte replaces the earlier one.
    pub fn insert(&mut self, byte: u8, replacement: impl Into<String>) {
        let replacement = replacement.into();
        match self.lookup[byte as usize] {
            0 => {
                self.inputs.push(byte);
                self.outputs.push(replacement);
                self.lookup[byte as usize] = self.inputs.len() as u16;
            }
            slot => self.outputs[slot as usize - 1] = replacement,
        }
    }

    /// Replacement for `byte`, if it has one.
    #[inline]
    pub fn get(&self, byte: u8) -> Option<&str> {
        match self.lookup[byte as usize] {
            0 => None,
            slot => Some(self.outputs[slot as usize - 1].as_str()),
        }
    }

    /// The `in` sequence, in insertion order.
    pub fn inputs(&self) -> &[u8] {
        &self.inputs
    }

    /// The `out` sequence, parallel to [`inputs`](Self::inputs).
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Append `byte` to `out`, substituted if the table has an entry for it.
    #[inline]
    pub fn write(&self, byte: u8, out: &mut Vec<u8>) {
        match self.get(byte) {
            Some(replacement) => out.extend_from_slice(replacement.as_bytes()),
            None => out.push(byte),
        }
    }

    /// Substitute every byte of `data` in a single pass.
    pub fn apply(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + data.len() / 8);
        for &byte in data {
            self.write(byte, &mut out);
        }
        out
    }
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The lookup tables backing one [`CharsetConverter`](super::CharsetConverter).
#[derive(Debug, Clone)]
pub struct EntityTable {
    format: EntityFormat,
    always_encode: SubstitutionTable,
    latin1_range: SubstitutionTable,
    extended_range: Option<SubstitutionTable>,
}

impl EntityTable {
    /// Build the default tables for `format`. The extended range starts disabled.
    pub fn new(format: EntityFormat) -> Self {
        let mut always_encode = SubstitutionTable::new();
        for &(byte, replacement) in format.always_encoded() {
            always_encode.insert(byte, replacement);
        }

        let mut latin1_range = SubstitutionTable::new();
        for byte in (0u8..32).chain(160u8..=255) {
            latin1_range.insert(byte, format.entity(byte as u32));
        }

        EntityTable {
            format,
            always_encode,
            latin1_range,
            extended_range: None,
        }
    }

    /// Populate the windows-1252 table for bytes 128–159.
    pub fn enable_extended_range(&mut self) {
        if self.extended_range.is_some() {
            return;
        }
        let mut table = SubstitutionTable::new();
        for (offset, code_point) in CP1252_HIGH.iter().enumerate() {
            let replacement = match code_point {
                Some(cp) => self.format.extended_entity(*cp),
                None => "?".to_string(),
            };
            table.insert(128 + offset as u8, replacement);
        }
        self.extended_range = Some(table);
    }

    /// Format these tables were built for
    pub fn format(&self) -> EntityFormat {
        self.format
    }

    /// Reserved characters of the wire format
    pub fn always_encode(&self) -> &SubstitutionTable {
        &self.always_encode
    }

    /// Control characters and the latin-1 high range
    pub fn latin1_range(&self) -> &SubstitutionTable {
        &self.latin1_range
    }

    /// Windows-1252 control range, if enabled
    pub fn extended_range(&self) -> Option<&SubstitutionTable> {
        self.extended_range.as_ref()
    }
}
