//! Host editor interfaces
//!
//! The synchronizer never owns records. It asks the host which record is
//! open, reads the host's edit-inclusive metadata and hands partial edits back
//! to the host's own save pipeline.

use crate::record::RecordRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Full metadata map of a record
pub type MetaMap = IndexMap<String, Value>;

/// Partial metadata edit, serialized as `{ "meta": { ... } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEdit {
    /// Normalized values keyed by meta key
    pub meta: IndexMap<String, String>,
}

impl MetaEdit {
    /// Create edit from a batch of values
    #[inline]
    #[must_use]
    pub fn new(meta: IndexMap<String, String>) -> Self {
        Self { meta }
    }

    /// Value queued for `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Number of keys in the edit
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    /// Check if edit carries no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }
}

/// Source of the record currently open in the editor
pub trait ActiveRecord: Send + Sync {
    /// Currently open record, if any
    fn active_record(&self) -> Option<RecordRef>;
}

/// Access to a record's metadata through the host's edit buffer
///
/// Both calls must return promptly; the host is responsible for any I/O
/// behind them.
pub trait MetaStore: Send + Sync {
    /// Full metadata map including unsaved edits
    fn edited_meta(&self, record: &RecordRef) -> MetaMap;

    /// Merge a partial edit into the record's tracked edits
    fn edit_meta(&self, record: &RecordRef, edit: MetaEdit);
}

/// Everything the synchronizer needs from the editor
pub trait EditorHost: ActiveRecord + MetaStore {}

impl<T: ActiveRecord + MetaStore + ?Sized> EditorHost for T {}
