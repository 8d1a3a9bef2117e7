//! Parish Bindings
//!
//! Synchronizes editor block bindings with the metadata of parish content
//! records.
//!
//! # Core Operations
//!
//! - **Read**: resolve bound attributes to current metadata values (cached)
//! - **Write**: normalize proposed values and flush them as one debounced edit
//! - **Edit check**: allow editing only `parish_` keys on `parish_` records
//!
//! # Architecture
//!
//! ```text
//! Editor → BindingSourceRegistry → PostMetaSource → MetaSynchronizer
//!                                                     ├─ MetaCache (global TTL sweep) ← MetaStore::edited_meta
//!                                                     └─ pending batches → Debouncer → MetaStore::edit_meta
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use parish_bindings::{BindingSourceRegistry, SyncConfig};
//!
//! let mut registry = BindingSourceRegistry::new();
//! let sync = registry.register_post_meta(host, SyncConfig::default())?;
//!
//! let source = registry.get("parish/post-meta").unwrap();
//! let values = source.get_values(&context, &bindings);
//!
//! // When the editing session ends
//! sync.flush_all();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod config;
pub mod debounce;
pub mod error;
pub mod registry;
pub mod source;
pub mod synchronizer;

pub use cache::{CacheStats, MetaCache};
pub use config::{SyncConfig, DEFAULT_CACHE_TTL_MS, DEFAULT_DEBOUNCE_MS, POST_META_SOURCE};
pub use debounce::Debouncer;
pub use error::{BindingsError, BindingsResult, ConfigError, RegistryError};
pub use registry::{is_valid_source_name, BindingSourceRegistry};
pub use source::{BindingSource, PostMetaSource, POST_META_CONTEXT};
pub use synchronizer::{BoundValues, MetaSynchronizer, PendingBatch, SyncStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting the bindings layer
    pub use crate::config::SyncConfig;
    pub use crate::registry::BindingSourceRegistry;
    pub use crate::source::{BindingSource, PostMetaSource};
    pub use crate::synchronizer::MetaSynchronizer;
    pub use parish_meta::{
        ActiveRecord, Binding, BindingArgs, BindingSet, ContentType, EditingContext, EditorHost,
        MetaEdit, MetaMap, MetaStore, RecordId, RecordRef,
    };
}
