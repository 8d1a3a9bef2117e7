//! Block attribute bindings
//!
//! A [`BindingSet`] maps block attribute names to [`Binding`]s. Hosts send
//! bindings either as a bare key string or as an object:
//!
//! ```text
//! { "content": { "source": "parish/post-meta", "args": { "key": "parish_news_summary" }, "newValue": "..." } }
//! ```

use crate::error::{MetaError, MetaResult};
use crate::namespace::{MetaKey, Namespace};
use crate::value::BindingValue;
use indexmap::IndexMap;
use serde_json::Value;

/// Link between one block attribute and one meta key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    key: Option<String>,
    new_value: BindingValue,
}

impl Binding {
    /// Binding for `key` with no proposed value
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            new_value: BindingValue::Undefined,
        }
    }

    /// With a proposed value for writes
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<BindingValue>) -> Self {
        self.new_value = value.into();
        self
    }

    /// Raw key as given, unvalidated
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Proposed value
    #[inline]
    #[must_use]
    pub fn new_value(&self) -> &BindingValue {
        &self.new_value
    }

    /// Validated meta key
    ///
    /// # Errors
    /// - `MetaError::MissingMetaKey` if the binding names no key
    /// - `MetaError::InvalidMetaKey` if the key is outside the namespace
    pub fn meta_key(&self, namespace: &Namespace) -> MetaResult<MetaKey> {
        let key = self.key.as_deref().ok_or(MetaError::MissingMetaKey)?;
        namespace.meta_key(key)
    }

    /// Parse a host binding
    ///
    /// The key comes from `args.key`, falling back to a top-level `key`.
    /// Shapes that carry neither produce a binding without a key.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(key) => Self::new(key.clone()),
            Value::Object(map) => {
                let key = map
                    .get("args")
                    .and_then(|args| args.get("key"))
                    .and_then(Value::as_str)
                    .or_else(|| map.get("key").and_then(Value::as_str))
                    .map(str::to_owned);

                Self {
                    key,
                    new_value: BindingValue::from_json(map.get("newValue")),
                }
            }
            _ => Self::default(),
        }
    }
}

/// Ordered bindings keyed by attribute name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingSet {
    entries: IndexMap<String, Binding>,
}

impl BindingSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, returning the set
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, binding: Binding) -> Self {
        self.entries.insert(attribute.into(), binding);
        self
    }

    /// Insert a binding, returning the one it replaced
    pub fn insert(&mut self, attribute: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.entries.insert(attribute.into(), binding)
    }

    /// Binding for an attribute
    #[inline]
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Binding> {
        self.entries.get(attribute)
    }

    /// Iterate `(attribute, binding)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bindings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a host bindings object; `None` unless `value` is an object
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(
            map.iter()
                .map(|(attribute, binding)| (attribute.clone(), Binding::from_json(binding)))
                .collect(),
        )
    }
}

impl FromIterator<(String, Binding)> for BindingSet {
    fn from_iter<I: IntoIterator<Item = (String, Binding)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Arguments of an edit-permission check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingArgs {
    key: Option<String>,
}

impl BindingArgs {
    /// Arguments naming `key`
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    /// Requested key, unvalidated
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Parse `{ "key": ... }`, also accepting a full binding with `args.key`
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let key = value
            .get("key")
            .or_else(|| value.get("args").and_then(|args| args.get("key")))
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self { key }
    }
}
