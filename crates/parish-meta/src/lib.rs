//! Parish Metadata Types
//!
//! Typed building blocks for binding editor fields to the metadata of parish
//! content records.
//!
//! # Core Concepts
//!
//! - [`Namespace`]: the `parish_` prefix policy for meta keys and record types
//! - [`ContentType`]: catalog of the plugin's content types
//! - [`RecordRef`] / [`EditingContext`]: which record a block edits
//! - [`Binding`] / [`BindingSet`]: block attribute to meta key links
//! - [`BindingValue`]: proposed values and their canonical string form
//! - [`RichText`]: formatted text serialized to markup
//! - [`EditorHost`]: what the host editor provides
//!
//! # Example
//!
//! ```rust
//! use parish_meta::{Binding, BindingSet, ContentType, Namespace};
//!
//! let bindings = BindingSet::new()
//!     .with("content", Binding::new(ContentType::News.meta_key("summary")).with_value(42_i64));
//!
//! let ns = Namespace::default();
//! let binding = bindings.get("content").unwrap();
//! assert_eq!(binding.meta_key(&ns).unwrap().as_str(), "parish_news_summary");
//! assert_eq!(binding.new_value().normalize().as_deref(), Some("42"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod binding;
pub mod content_type;
pub mod error;
pub mod host;
pub mod namespace;
pub mod record;
pub mod rich_text;
pub mod value;

pub use binding::{Binding, BindingArgs, BindingSet};
pub use content_type::ContentType;
pub use error::{MetaError, MetaResult};
pub use host::{ActiveRecord, EditorHost, MetaEdit, MetaMap, MetaStore};
pub use namespace::{MetaKey, Namespace, META_KEY_PREFIX, RECORD_TYPE_PREFIX};
pub use record::{EditingContext, RecordId, RecordRef};
pub use rich_text::{FormatSpan, InlineFormat, RichText};
pub use value::{display_value, BindingValue, Scalar};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
