//! Grammar registry and handle tagging.
//!
//! The registry resolves every grammar variant once, at load time, and can
//! then publish them into any number of host export containers. Publishing
//! stamps each handle with [`LANGUAGE_TYPE_TAG`]; the tag says "this is a
//! grammar handle", so it is the same for every variant.

use std::sync::OnceLock;

use crate::config::GrammarConfig;
use crate::host::{ExportTarget, HostError, HostObject};
use crate::language::{GrammarVariant, LanguageHandle, NamedGrammarEntry};
use crate::linkage::{default_linkage, GrammarLinkage, LinkError};
use crate::type_tag::LANGUAGE_TYPE_TAG;

static GLOBAL: OnceLock<Result<GrammarRegistry, LinkError>> = OnceLock::new();

/// The resolved phpx grammars.
pub struct GrammarRegistry {
    entries: Vec<NamedGrammarEntry>,
    // Reported by describe(); loaded libraries are never unloaded
    linkage: Box<dyn GrammarLinkage>,
}

impl GrammarRegistry {
    /// Resolve every grammar variant through `linkage`.
    ///
    /// Fails if a symbol cannot be resolved or an entry point returns a
    /// null language; a registry never holds a null handle.
    pub fn load(linkage: Box<dyn GrammarLinkage>) -> Result<Self, LinkError> {
        let mut entries = Vec::with_capacity(GrammarVariant::ALL.len());
        for variant in GrammarVariant::ALL {
            let entry = linkage.resolve(variant)?;
            // SAFETY: `GrammarLinkage` implementations only return grammar
            // entry points, which take no arguments.
            let raw = unsafe { entry() };
            let handle =
                LanguageHandle::from_raw(raw).ok_or(LinkError::NullLanguage(variant.symbol()))?;
            tracing::debug!("Resolved grammar {} at {:?}", variant, handle);
            entries.push(NamedGrammarEntry::new(variant, handle, entry));
        }

        tracing::info!(
            "Loaded {} phpx grammars from {}",
            entries.len(),
            linkage.describe()
        );
        Ok(Self { entries, linkage })
    }

    /// Load with the default linkage for `config`.
    pub fn from_config(config: &GrammarConfig) -> Result<Self, LinkError> {
        Self::load(default_linkage(config)?)
    }

    /// The process-wide registry, loaded on first use from the default
    /// configuration. A failed load is remembered and returned to every
    /// caller.
    pub fn global() -> Result<&'static Self, LinkError> {
        Self::init_global_with(|| {
            let config = GrammarConfig::load(None).unwrap_or_else(|e| {
                tracing::warn!("Ignoring grammar config: {}", e);
                GrammarConfig::default()
            });
            Self::from_config(&config)
        })
    }

    /// Initialize the process-wide registry from `config`.
    ///
    /// Has no effect on the outcome if the registry was already initialized.
    pub fn init_global(config: &GrammarConfig) -> Result<&'static Self, LinkError> {
        Self::init_global_with(|| Self::from_config(config))
    }

    fn init_global_with(
        load: impl FnOnce() -> Result<Self, LinkError>,
    ) -> Result<&'static Self, LinkError> {
        GLOBAL.get_or_init(load).as_ref().map_err(Clone::clone)
    }

    pub fn entries(&self) -> &[NamedGrammarEntry] {
        &self.entries
    }

    pub fn get(&self, variant: GrammarVariant) -> &NamedGrammarEntry {
        // load() resolves every variant in ALL order
        &self.entries[variant as usize]
    }

    /// A tree-sitter language for `variant`, ready for `Parser::set_language`.
    pub fn language(&self, variant: GrammarVariant) -> tree_sitter::Language {
        self.get(variant).language()
    }

    pub fn describe(&self) -> String {
        self.linkage.describe()
    }

    /// Publish every grammar into `exports`.
    ///
    /// Each variant becomes `exports[name] = { name, language }` with
    /// `language` stamped with [`LANGUAGE_TYPE_TAG`]. Errors come from the
    /// host only.
    pub fn initialize<T: ExportTarget + ?Sized>(&self, exports: &mut T) -> Result<(), T::Error> {
        for entry in &self.entries {
            exports.export_language(entry.name(), entry.handle, &LANGUAGE_TYPE_TAG)?;
        }
        Ok(())
    }

    /// A fresh in-process export object.
    pub fn exports(&self) -> Result<HostObject, HostError> {
        let mut exports = HostObject::new();
        self.initialize(&mut exports)?;
        Ok(exports)
    }
}

impl std::fmt::Debug for GrammarRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarRegistry")
            .field("entries", &self.entries)
            .field("linkage", &self.linkage.describe())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::GrammarFn;
    use crate::linkage::EntryPointLinkage;
    use crate::type_tag::TypeTag;

    static PHPX: u64 = 1;
    static PHPX_ONLY: u64 = 2;

    unsafe extern "C" fn fake_phpx() -> *const () {
        &PHPX as *const u64 as *const ()
    }

    unsafe extern "C" fn fake_phpx_only() -> *const () {
        &PHPX_ONLY as *const u64 as *const ()
    }

    unsafe extern "C" fn null_language() -> *const () {
        std::ptr::null()
    }

    struct MissingSymbolLinkage;

    // SAFETY: resolves nothing.
    unsafe impl GrammarLinkage for MissingSymbolLinkage {
        fn resolve(&self, variant: GrammarVariant) -> Result<GrammarFn, LinkError> {
            Err(LinkError::MissingSymbol {
                symbol: variant.symbol(),
                message: "undefined symbol".to_string(),
            })
        }

        fn describe(&self) -> String {
            "missing".to_string()
        }
    }

    fn fake_registry() -> GrammarRegistry {
        // SAFETY: the stand-ins return static addresses and their handles are
        // only exported, never handed to tree-sitter.
        let linkage = unsafe { EntryPointLinkage::new(fake_phpx, fake_phpx_only) };
        GrammarRegistry::load(Box::new(linkage)).unwrap()
    }

    #[test]
    fn test_load_resolves_every_variant() {
        let registry = fake_registry();
        let names: Vec<_> = registry.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["phpx", "phpx_only"]);

        assert_eq!(
            registry.get(GrammarVariant::Phpx).handle.as_ptr(),
            &PHPX as *const u64 as *const ()
        );
        assert_eq!(
            registry.get(GrammarVariant::PhpxOnly).handle.as_ptr(),
            &PHPX_ONLY as *const u64 as *const ()
        );
        assert_eq!(registry.describe(), "embedder-provided entry points");
    }

    #[test]
    fn test_null_language_fails_load() {
        // SAFETY: a null result is rejected before any use.
        let linkage = unsafe { EntryPointLinkage::new(fake_phpx, null_language) };
        let err = GrammarRegistry::load(Box::new(linkage)).unwrap_err();
        assert_eq!(err, LinkError::NullLanguage("tree_sitter_phpx_only"));
    }

    #[test]
    fn test_missing_symbol_fails_load() {
        let err = GrammarRegistry::load(Box::new(MissingSymbolLinkage)).unwrap_err();
        assert!(matches!(
            err,
            LinkError::MissingSymbol {
                symbol: "tree_sitter_phpx",
                ..
            }
        ));
    }

    #[test]
    fn test_initialize_exports_tagged_entries() {
        let registry = fake_registry();
        let exports = registry.exports().unwrap();

        let keys: Vec<_> = exports.keys().collect();
        assert_eq!(keys, vec!["phpx", "phpx_only"]);

        for variant in GrammarVariant::ALL {
            let entry = exports.get_object(variant.name()).unwrap();
            assert_eq!(entry.get_str("name").unwrap(), variant.name());

            let language = entry.get_external("language").unwrap();
            assert!(language.check_type_tag(&LANGUAGE_TYPE_TAG));
            assert_eq!(language.tag(), Some(LANGUAGE_TYPE_TAG));
            assert_eq!(
                exports.language(variant.name()).unwrap(),
                registry.get(variant).handle
            );
        }
    }

    #[test]
    fn test_initialize_keeps_existing_fields() {
        let registry = fake_registry();
        let mut exports = HostObject::new();
        exports.set(
            "version",
            crate::host::HostValue::String("1.0".to_string()),
        );

        registry.initialize(&mut exports).unwrap();
        assert_eq!(exports.len(), 3);
        assert_eq!(exports.get_str("version").unwrap(), "1.0");
    }

    #[test]
    fn test_reinitialize_yields_independently_tagged_handles() {
        let registry = fake_registry();
        let first = registry.exports().unwrap();
        let second = registry.exports().unwrap();

        for variant in GrammarVariant::ALL {
            assert!(first.language(variant.name()).is_ok());
            assert!(second.language(variant.name()).is_ok());
        }
    }

    #[test]
    fn test_initialize_propagates_host_errors() {
        struct FailingHost;

        impl ExportTarget for FailingHost {
            type Error = HostError;

            fn export_language(
                &mut self,
                _name: &str,
                _language: LanguageHandle,
                _tag: &TypeTag,
            ) -> Result<(), HostError> {
                Err(HostError::Runtime("out of memory".to_string()))
            }
        }

        let registry = fake_registry();
        assert_eq!(
            registry.initialize(&mut FailingHost),
            Err(HostError::Runtime("out of memory".to_string()))
        );
    }

    #[test]
    fn test_every_variant_gets_the_same_tag() {
        struct RecordingHost(Vec<(String, TypeTag)>);

        impl ExportTarget for RecordingHost {
            type Error = HostError;

            fn export_language(
                &mut self,
                name: &str,
                _language: LanguageHandle,
                tag: &TypeTag,
            ) -> Result<(), HostError> {
                self.0.push((name.to_string(), *tag));
                Ok(())
            }
        }

        let mut host = RecordingHost(Vec::new());
        fake_registry().initialize(&mut host).unwrap();

        assert_eq!(host.0.len(), 2);
        assert!(host.0.iter().all(|(_, tag)| *tag == LANGUAGE_TYPE_TAG));
    }
}
