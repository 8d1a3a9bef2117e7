//! Error types for parish metadata
//!
//! These errors never reach the editor directly. The synchronizer logs them
//! and degrades to a no-op or a default value.

/// Errors raised while resolving contexts, keys and bindings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
    /// Meta key does not carry the namespace prefix
    #[error("meta key '{key}' is outside the '{prefix}' namespace")]
    InvalidMetaKey {
        /// Offending key
        key: String,
        /// Expected prefix
        prefix: String,
    },

    /// Binding does not name a meta key at all
    #[error("binding has no meta key")]
    MissingMetaKey,

    /// Neither the explicit context nor the active record names a record type
    #[error("record type could not be resolved")]
    MissingRecordType,

    /// Neither the explicit context nor the active record names a record id
    #[error("record id could not be resolved")]
    MissingRecordId,

    /// Record id is not a positive integer
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    /// Slug is not one of the plugin's content types
    #[error("unknown content type: '{0}'")]
    UnknownContentType(String),
}

impl MetaError {
    /// Create invalid meta key error
    pub fn invalid_meta_key(key: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::InvalidMetaKey {
            key: key.into(),
            prefix: prefix.into(),
        }
    }

    /// Check if error comes from an unresolved editing context
    #[inline]
    #[must_use]
    pub fn is_context_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRecordType | Self::MissingRecordId | Self::InvalidRecordId(_)
        )
    }
}

/// Result type alias for metadata operations
pub type MetaResult<T> = Result<T, MetaError>;
