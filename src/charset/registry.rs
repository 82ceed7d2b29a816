//! Shared converter instances, one per wire format.
//!
//! Converters are built completely (including any extended tables) before they are
//! published here. Once published, an instance is only ever handed out behind an
//! [`Arc`] and never mutated, so any number of threads may read it.

use super::converter::CharsetConverter;
use super::tables::EntityFormat;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Registry of shared, immutable [`CharsetConverter`]s keyed by [`EntityFormat`].
///
/// # Examples
///
/// ```
/// use http_rpc::charset::{CharsetConverter, ConverterRegistry, EntityFormat};
///
/// let registry = ConverterRegistry::new();
/// let a = registry.get(EntityFormat::Xml);
/// let b = registry.get(EntityFormat::Xml);
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
///
/// // Publish a converter with windows-1252 support
/// registry.register(CharsetConverter::xml().with_extended_conversion());
/// assert!(registry.get(EntityFormat::Xml).has_extended_conversion());
/// ```
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    converters: RwLock<HashMap<EntityFormat, Arc<CharsetConverter>>>,
}

impl ConverterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static ConverterRegistry {
        static GLOBAL: OnceLock<ConverterRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ConverterRegistry::new)
    }

    /// Shared converter for `format`, built with default tables on first use.
    pub fn get(&self, format: EntityFormat) -> Arc<CharsetConverter> {
        if let Some(converter) = self.converters.read().get(&format) {
            return Arc::clone(converter);
        }

        let mut converters = self.converters.write();
        Arc::clone(
            converters
                .entry(format)
                .or_insert_with(|| Arc::new(CharsetConverter::new(format))),
        )
    }

    /// Publish a fully built converter, replacing the current one for its format.
    ///
    /// Instances handed out earlier stay valid and unchanged.
    pub fn register(&self, converter: CharsetConverter) -> Arc<CharsetConverter> {
        let converter = Arc::new(converter);
        self.converters
            .write()
            .insert(converter.format(), Arc::clone(&converter));
        tracing::debug!(
            format = ?converter.format(),
            extended = converter.has_extended_conversion(),
            "registered charset converter"
        );
        converter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_shares_instances() {
        let registry = ConverterRegistry::new();
        let xml = registry.get(EntityFormat::Xml);
        let json = registry.get(EntityFormat::Json);
        assert!(Arc::ptr_eq(&xml, &registry.get(EntityFormat::Xml)));
        assert_eq!(xml.format(), EntityFormat::Xml);
        assert_eq!(json.format(), EntityFormat::Json);
        assert!(!xml.has_extended_conversion());
    }

    #[test]
    fn test_register_replaces_without_touching_old_instances() {
        let registry = ConverterRegistry::new();
        let before = registry.get(EntityFormat::Json);

        let after = registry.register(CharsetConverter::json().with_extended_conversion());
        assert!(Arc::ptr_eq(&after, &registry.get(EntityFormat::Json)));
        assert!(after.has_extended_conversion());
        assert!(!before.has_extended_conversion());
    }

    #[test]
    fn test_concurrent_reads() {
        let registry = Arc::new(ConverterRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let converter = registry.get(EntityFormat::Xml);
                    converter.encode_entities(b"<a>", "UTF-8", "UTF-8").unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), b"&lt;a&gt;");
        }
    }
}
