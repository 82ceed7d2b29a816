//! Charset-aware entity encoding.
//!
//! Converts text between charsets for a given wire format, replacing characters the
//! destination charset cannot carry with that format's entities.
//!
//! # Module Organization
//!
//! ```text
//! charset/
//! ├── tables    - EntityFormat and the per-format substitution tables
//! ├── converter - CharsetConverter and charset negotiation
//! └── registry  - shared per-format converter instances
//! ```
//!
//! # Supported Conversions
//!
//! | Source | Destination | Action |
//! |--------|-------------|--------|
//! | any | same charset | reserved characters only |
//! | US-ASCII | `""`, UTF-8, ISO-8859-1 | reserved characters only |
//! | ISO-8859-1 | `""`, US-ASCII | reserved, then latin-1 entities |
//! | ISO-8859-1 | UTF-8 | reserved, then UTF-8 re-encoding |
//! | UTF-8 | `""`, US-ASCII, ISO-8859-1 | UTF-8 decoding, entities above 127 |
//! | CP1252 | `""`, US-ASCII, UTF-8, ISO-8859-1 | needs extended conversion enabled |
//!
//! # Examples
//!
//! ```
//! use http_rpc::charset::{ConverterRegistry, EntityFormat};
//!
//! let json = ConverterRegistry::global().get(EntityFormat::Json);
//! let out = json.encode_entities("naïve\n".as_bytes(), "UTF-8", "US-ASCII").unwrap();
//! assert_eq!(out, br"na\u00efve\n");
//! ```

mod converter;
mod registry;
mod tables;

pub use converter::{is_valid_charset, Charset, CharsetConverter};
pub use registry::ConverterRegistry;
pub use tables::{EntityFormat, EntityTable, SubstitutionTable};
