//! Registry of binding sources
//!
//! Provides [`BindingSourceRegistry`], the name-to-source table the editor
//! consults when a block attribute declares a binding.

use crate::config::SyncConfig;
use crate::error::{BindingsResult, RegistryError};
use crate::source::{BindingSource, PostMetaSource};
use crate::synchronizer::MetaSynchronizer;
use indexmap::IndexMap;
use parish_meta::EditorHost;
use std::fmt;
use std::sync::Arc;

/// Check a source name is `namespace/name` in lowercase kebab case
#[must_use]
pub fn is_valid_source_name(name: &str) -> bool {
    let valid_part = |part: &str| {
        part.starts_with(|c: char| c.is_ascii_lowercase())
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    };

    match name.split_once('/') {
        Some((namespace, rest)) => valid_part(namespace) && valid_part(rest),
        None => false,
    }
}

/// Binding sources keyed by name, in registration order
#[derive(Default, Clone)]
pub struct BindingSourceRegistry {
    sources: IndexMap<String, Arc<dyn BindingSource>>,
}

impl BindingSourceRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own name
    ///
    /// # Errors
    /// - `RegistryError::InvalidName` if the name is not `namespace/name`
    /// - `RegistryError::AlreadyRegistered` if the name is taken
    pub fn register(&mut self, source: Arc<dyn BindingSource>) -> Result<(), RegistryError> {
        let name = source.name().to_owned();
        if !is_valid_source_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.sources.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }

        tracing::info!(source = %name, "binding source registered");
        self.sources.insert(name, source);
        Ok(())
    }

    /// Build a synchronizer for `host` and register it as the post-meta source
    ///
    /// Returns the synchronizer so the caller can flush it when the editing
    /// session ends.
    ///
    /// # Errors
    /// - `BindingsError::Config` if `config` fails validation
    /// - `BindingsError::Registry` if the source name is taken
    pub fn register_post_meta(
        &mut self,
        host: Arc<dyn EditorHost>,
        config: SyncConfig,
    ) -> BindingsResult<Arc<MetaSynchronizer>> {
        config.validate()?;
        let sync = Arc::new(MetaSynchronizer::with_config(host, config));
        self.register(Arc::new(PostMetaSource::new(Arc::clone(&sync))))?;
        Ok(sync)
    }

    /// Source registered under `name`
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn BindingSource>> {
        self.sources.get(name).cloned()
    }

    /// Check if a source is registered under `name`
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Remove a source, returning it
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn BindingSource>> {
        self.sources.shift_remove(name)
    }

    /// Registered names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Number of registered sources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for BindingSourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingSourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingsError;
    use parish_test_utils::MemoryHost;

    #[test]
    fn source_name_validation() {
        assert!(is_valid_source_name("parish/post-meta"));
        assert!(is_valid_source_name("core/pattern-overrides"));
        assert!(!is_valid_source_name("post-meta"));
        assert!(!is_valid_source_name("parish/"));
        assert!(!is_valid_source_name("/meta"));
        assert!(!is_valid_source_name("Parish/meta"));
        assert!(!is_valid_source_name("parish/post/meta"));
        assert!(!is_valid_source_name("parish/post_meta"));
    }

    #[test]
    fn register_post_meta() {
        let mut registry = BindingSourceRegistry::new();
        let sync = registry
            .register_post_meta(Arc::new(MemoryHost::new()), SyncConfig::default())
            .unwrap();

        assert!(registry.contains("parish/post-meta"));
        assert_eq!(registry.names(), ["parish/post-meta"]);
        assert_eq!(sync.config().source_name, "parish/post-meta");

        let source = registry.get("parish/post-meta").unwrap();
        assert_eq!(source.uses_context(), &["postType", "postId"]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = BindingSourceRegistry::new();
        let host: Arc<dyn EditorHost> = Arc::new(MemoryHost::new());

        registry
            .register_post_meta(Arc::clone(&host), SyncConfig::default())
            .unwrap();
        let err = registry
            .register_post_meta(host, SyncConfig::default())
            .unwrap_err();

        assert!(matches!(
            err,
            BindingsError::Registry(RegistryError::AlreadyRegistered(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut registry = BindingSourceRegistry::new();
        let err = registry
            .register_post_meta(
                Arc::new(MemoryHost::new()),
                SyncConfig::default().with_source_name("meta"),
            )
            .unwrap_err();

        assert!(matches!(err, BindingsError::Config(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_source() {
        let mut registry = BindingSourceRegistry::new();
        registry
            .register_post_meta(Arc::new(MemoryHost::new()), SyncConfig::default())
            .unwrap();

        assert!(registry.remove("parish/post-meta").is_some());
        assert!(registry.remove("parish/post-meta").is_none());
        assert!(registry.is_empty());
    }
}
