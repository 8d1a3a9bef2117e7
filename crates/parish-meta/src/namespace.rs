//! Namespace policy for meta keys and record types
//!
//! Only keys of the form `parish_<rest>` may be bound, and only records whose
//! type carries the plugin prefix may be edited through a binding.

use crate::error::{MetaError, MetaResult};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

/// Default prefix for bindable meta keys
pub const META_KEY_PREFIX: &str = "parish_";

/// Default prefix for the plugin's record types
pub const RECORD_TYPE_PREFIX: &str = "parish_";

/// Prefix policy shared by reads, writes and edit checks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    meta_key_prefix: String,
    record_type_prefix: String,
}

impl Namespace {
    /// Create namespace with custom prefixes
    #[inline]
    #[must_use]
    pub fn new(meta_key_prefix: impl Into<String>, record_type_prefix: impl Into<String>) -> Self {
        Self {
            meta_key_prefix: meta_key_prefix.into(),
            record_type_prefix: record_type_prefix.into(),
        }
    }

    /// Prefix required on meta keys
    #[inline]
    #[must_use]
    pub fn meta_key_prefix(&self) -> &str {
        &self.meta_key_prefix
    }

    /// Prefix required on record types
    #[inline]
    #[must_use]
    pub fn record_type_prefix(&self) -> &str {
        &self.record_type_prefix
    }

    /// Check if `key` is `<prefix><rest>` with a non-empty rest
    #[inline]
    #[must_use]
    pub fn is_meta_key(&self, key: &str) -> bool {
        key.len() > self.meta_key_prefix.len() && key.starts_with(&self.meta_key_prefix)
    }

    /// Check if `record_type` belongs to the plugin
    #[inline]
    #[must_use]
    pub fn is_record_type(&self, record_type: &str) -> bool {
        record_type.starts_with(&self.record_type_prefix)
    }

    /// Validate a raw key into a [`MetaKey`]
    ///
    /// # Errors
    /// - `MetaError::InvalidMetaKey` if the key is outside the namespace
    pub fn meta_key(&self, key: &str) -> MetaResult<MetaKey> {
        if self.is_meta_key(key) {
            Ok(MetaKey(key.to_owned()))
        } else {
            Err(MetaError::invalid_meta_key(key, &self.meta_key_prefix))
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(META_KEY_PREFIX, RECORD_TYPE_PREFIX)
    }
}

/// Meta key that passed the namespace check
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetaKey(String);

impl MetaKey {
    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned key
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for MetaKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetaKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for MetaKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_prefixed_keys() {
        let ns = Namespace::default();
        assert!(ns.is_meta_key("parish_news_summary"));
        assert!(ns.is_meta_key("parish_x"));
    }

    #[test]
    fn rejects_foreign_keys() {
        let ns = Namespace::default();
        assert!(!ns.is_meta_key("title"));
        assert!(!ns.is_meta_key("_parish_hidden"));
        assert!(!ns.is_meta_key("Parish_news"));
        assert!(!ns.is_meta_key(""));
    }

    #[test]
    fn bare_prefix_is_not_a_key() {
        assert!(!Namespace::default().is_meta_key("parish_"));
    }

    #[test]
    fn record_type_prefix() {
        let ns = Namespace::default();
        assert!(ns.is_record_type("parish_news"));
        assert!(!ns.is_record_type("post"));
        assert!(!ns.is_record_type("page"));
    }

    #[test]
    fn meta_key_validation() {
        let ns = Namespace::default();
        let key = ns.meta_key("parish_event_date").unwrap();
        assert_eq!(key.as_str(), "parish_event_date");

        let err = ns.meta_key("event_date").unwrap_err();
        assert!(matches!(err, MetaError::InvalidMetaKey { .. }));
    }

    #[test]
    fn custom_prefixes() {
        let ns = Namespace::new("acme_", "acme-");
        assert!(ns.is_meta_key("acme_field"));
        assert!(!ns.is_meta_key("parish_field"));
        assert!(ns.is_record_type("acme-book"));
    }

    proptest! {
        #[test]
        fn prefixed_keys_always_valid(rest in "[a-z0-9_]{1,24}") {
            let key = format!("parish_{rest}");
            prop_assert!(Namespace::default().is_meta_key(&key));
        }

        #[test]
        fn unprefixed_keys_never_valid(key in "[a-oq-z][a-z0-9_]{0,24}") {
            prop_assert!(!Namespace::default().is_meta_key(&key));
        }
    }
}
