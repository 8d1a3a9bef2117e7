//! Record identity and editing context
//!
//! Provides [`RecordRef`] (a resolved `(type, id)` pair) and
//! [`EditingContext`], the partial pair a block carries which falls back to
//! the host's currently open record.

use crate::content_type::ContentType;
use crate::error::{MetaError, MetaResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Positive record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Create record id, `None` for zero
    #[inline]
    #[must_use]
    pub fn new(id: u64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Raw id
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse id from a JSON number or numeric string
    ///
    /// # Errors
    /// - `MetaError::InvalidRecordId` for zero, negatives, fractions and non-numeric values
    pub fn from_json(value: &Value) -> MetaResult<Self> {
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        parsed.and_then(Self::new).ok_or_else(|| {
            MetaError::InvalidRecordId(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully resolved record reference
///
/// Displays as `<type>:<id>`, the key used for cache snapshots and
/// pending batches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordRef {
    record_type: String,
    id: RecordId,
}

impl RecordRef {
    /// Create record reference
    #[inline]
    #[must_use]
    pub fn new(record_type: impl Into<String>, id: RecordId) -> Self {
        Self {
            record_type: record_type.into(),
            id,
        }
    }

    /// Reference to a record of one of the plugin's content types
    #[inline]
    #[must_use]
    pub fn of(content_type: ContentType, id: RecordId) -> Self {
        Self::new(content_type.slug(), id)
    }

    /// Record type slug
    #[inline]
    #[must_use]
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Record id
    #[inline]
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Catalog entry for the record type, if it is one of ours
    #[inline]
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        ContentType::from_slug(&self.record_type)
    }

    /// Cache key string `<type>:<id>`
    #[inline]
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.record_type, self.id)
    }
}

/// Context a block supplies when reading or writing bindings
///
/// Either half may be missing; [`EditingContext::resolve`] fills each
/// missing half from the active record independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditingContext {
    record_type: Option<String>,
    record_id: Option<RecordId>,
}

impl EditingContext {
    /// Empty context, resolved entirely from the active record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit context for a record
    #[must_use]
    pub fn for_record(record: &RecordRef) -> Self {
        Self {
            record_type: Some(record.record_type().to_owned()),
            record_id: Some(record.id()),
        }
    }

    /// With record type (empty strings count as missing)
    #[must_use]
    pub fn with_record_type(mut self, record_type: impl Into<String>) -> Self {
        let record_type = record_type.into();
        self.record_type = (!record_type.is_empty()).then_some(record_type);
        self
    }

    /// With record id
    #[inline]
    #[must_use]
    pub fn with_record_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    /// Explicit record type, if any
    #[inline]
    #[must_use]
    pub fn record_type(&self) -> Option<&str> {
        self.record_type.as_deref()
    }

    /// Explicit record id, if any
    #[inline]
    #[must_use]
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Check if both halves are present without fallback
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.record_type.is_some() && self.record_id.is_some()
    }

    /// Read `postType` / `postId` from a host context object
    ///
    /// Anything that is not an object yields an empty context; an
    /// unparseable id is treated as missing.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let record_type = map
            .get("postType")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let record_id = map
            .get("postId")
            .filter(|v| !v.is_null())
            .and_then(|v| RecordId::from_json(v).ok());

        Self {
            record_type,
            record_id,
        }
    }

    /// Resolve to a full record reference
    ///
    /// `active` is only consulted when a half is missing.
    ///
    /// # Errors
    /// - `MetaError::MissingRecordType` / `MetaError::MissingRecordId` when
    ///   neither source supplies that half
    pub fn resolve<F>(&self, active: F) -> MetaResult<RecordRef>
    where
        F: FnOnce() -> Option<RecordRef>,
    {
        if let (Some(record_type), Some(id)) = (&self.record_type, self.record_id) {
            return Ok(RecordRef::new(record_type.clone(), id));
        }

        let active = active();

        let record_type = self
            .record_type
            .clone()
            .or_else(|| {
                active
                    .as_ref()
                    .map(|r| r.record_type().to_owned())
                    .filter(|t| !t.is_empty())
            })
            .ok_or(MetaError::MissingRecordType)?;

        let id = self
            .record_id
            .or_else(|| active.as_ref().map(RecordRef::id))
            .ok_or(MetaError::MissingRecordId)?;

        Ok(RecordRef::new(record_type, id))
    }
}
