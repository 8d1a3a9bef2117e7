//! Binding sources exposed to the host editor
//!
//! A [`BindingSource`] is what the editor calls with raw JSON when a block
//! attribute is bound. [`PostMetaSource`] parses that JSON and delegates to
//! a [`MetaSynchronizer`].

use crate::synchronizer::{BoundValues, MetaSynchronizer};
use parish_meta::{BindingArgs, BindingSet, EditingContext};
use serde_json::Value;
use std::sync::Arc;

/// Block context entries the post-meta source needs from the editor
pub const POST_META_CONTEXT: [&str; 2] = ["postType", "postId"];

/// Named source of bindable values
///
/// Hooks never fail; malformed input degrades to an empty result, a no-op
/// or `false`.
pub trait BindingSource: Send + Sync {
    /// Registered name, `namespace/name`
    fn name(&self) -> &str;

    /// Label shown by the editor
    fn label(&self) -> &str;

    /// Block context entries the source reads
    fn uses_context(&self) -> &[&'static str];

    /// Current values for a bindings object
    fn get_values(&self, context: &Value, bindings: &Value) -> BoundValues;

    /// Apply the `newValue`s of a bindings object
    fn set_values(&self, context: &Value, bindings: &Value);

    /// Check if the user may edit the binding described by `args`
    fn can_user_edit_value(&self, context: &Value, args: &Value) -> bool;
}

/// `parish/post-meta` binding source
#[derive(Debug, Clone)]
pub struct PostMetaSource {
    sync: Arc<MetaSynchronizer>,
}

impl PostMetaSource {
    /// Create source backed by `sync`
    #[inline]
    #[must_use]
    pub fn new(sync: Arc<MetaSynchronizer>) -> Self {
        Self { sync }
    }

    /// Backing synchronizer
    #[inline]
    #[must_use]
    pub fn synchronizer(&self) -> &Arc<MetaSynchronizer> {
        &self.sync
    }
}

impl BindingSource for PostMetaSource {
    fn name(&self) -> &str {
        &self.sync.config().source_name
    }

    fn label(&self) -> &str {
        &self.sync.config().source_label
    }

    fn uses_context(&self) -> &[&'static str] {
        &POST_META_CONTEXT
    }

    fn get_values(&self, context: &Value, bindings: &Value) -> BoundValues {
        let context = EditingContext::from_json(context);
        let bindings = BindingSet::from_json(bindings);
        self.sync.read_values(&context, bindings.as_ref())
    }

    fn set_values(&self, context: &Value, bindings: &Value) {
        let context = EditingContext::from_json(context);
        let bindings = BindingSet::from_json(bindings);
        self.sync.write_values(&context, bindings.as_ref());
    }

    fn can_user_edit_value(&self, context: &Value, args: &Value) -> bool {
        let context = EditingContext::from_json(context);
        self.sync.can_edit(&context, &BindingArgs::from_json(args))
    }
}
