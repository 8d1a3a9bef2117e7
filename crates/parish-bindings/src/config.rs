//! Synchronizer configuration
//!
//! Defaults match the editor plugin: a 50 ms metadata cache, a 150 ms write
//! debounce and the `parish_` namespace for both meta keys and record types.

use crate::error::ConfigError;
use crate::registry::is_valid_source_name;
use parish_meta::{Namespace, META_KEY_PREFIX, RECORD_TYPE_PREFIX};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cache time-to-live in milliseconds
pub const DEFAULT_CACHE_TTL_MS: u64 = 50;

/// Default write debounce in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

/// Name the binding source is registered under
pub const POST_META_SOURCE: &str = "parish/post-meta";

/// Configuration for [`crate::MetaSynchronizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Time after which every cached snapshot is dropped
    pub cache_ttl_ms: u64,
    /// Quiet period before pending writes are flushed
    pub debounce_ms: u64,
    /// Prefix required on bindable meta keys
    pub meta_key_prefix: String,
    /// Prefix required on editable record types
    pub record_type_prefix: String,
    /// Binding source name
    pub source_name: String,
    /// Binding source label shown by the editor
    pub source_label: String,
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache time-to-live
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = duration_ms(ttl);
        self
    }

    /// With write debounce delay
    #[must_use]
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_ms = duration_ms(delay);
        self
    }

    /// With namespace prefixes
    #[must_use]
    pub fn with_prefixes(
        mut self,
        meta_key_prefix: impl Into<String>,
        record_type_prefix: impl Into<String>,
    ) -> Self {
        self.meta_key_prefix = meta_key_prefix.into();
        self.record_type_prefix = record_type_prefix.into();
        self
    }

    /// With binding source name
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Cache time-to-live
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Write debounce delay
    #[inline]
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Namespace policy built from the prefixes
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.meta_key_prefix, &self.record_type_prefix)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for a zero debounce, empty prefixes or a
    ///   malformed source name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::invalid("debounce_ms", "must be greater than zero"));
        }
        if self.meta_key_prefix.is_empty() {
            return Err(ConfigError::invalid("meta_key_prefix", "must not be empty"));
        }
        if self.record_type_prefix.is_empty() {
            return Err(ConfigError::invalid("record_type_prefix", "must not be empty"));
        }
        if !is_valid_source_name(&self.source_name) {
            return Err(ConfigError::invalid(
                "source_name",
                format!("'{}' is not of the form namespace/name", self.source_name),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document; missing fields take defaults
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML or unknown fields
    /// - `ConfigError::Invalid` if validation fails
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            meta_key_prefix: META_KEY_PREFIX.to_string(),
            record_type_prefix: RECORD_TYPE_PREFIX.to_string(),
            source_name: POST_META_SOURCE.to_string(),
            source_label: "Parish post meta".to_string(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_millis(50));
        assert_eq!(config.debounce_delay(), Duration::from_millis(150));
        assert_eq!(config.source_name, "parish/post-meta");
        assert!(config.validate().is_ok());
        assert!(config.namespace().is_meta_key("parish_news_summary"));
    }

    #[test]
    fn builder_methods() {
        let config = SyncConfig::new()
            .with_cache_ttl(Duration::from_millis(10))
            .with_debounce(Duration::from_secs(1))
            .with_prefixes("acme_", "acme_")
            .with_source_name("acme/meta");
        assert_eq!(config.cache_ttl_ms, 10);
        assert_eq!(config.debounce_ms, 1000);
        assert!(config.namespace().is_meta_key("acme_title"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = SyncConfig::from_toml_str("debounce_ms = 300\ncache_ttl_ms = 0\n").unwrap();
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.cache_ttl_ms, 0);
        assert_eq!(config.meta_key_prefix, "parish_");
    }

    #[test]
    fn toml_rejects_unknown_fields() {
        let err = SyncConfig::from_toml_str("debounce = 300\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_debounce_rejected() {
        let err = SyncConfig::from_toml_str("debounce_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "debounce_ms", .. }));
    }

    #[test]
    fn empty_prefix_rejected() {
        let config = SyncConfig::new().with_prefixes("", "parish_");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "meta_key_prefix", .. })
        ));
    }

    #[test]
    fn malformed_source_name_rejected() {
        let config = SyncConfig::new().with_source_name("post-meta");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "source_name", .. })
        ));
    }
}
