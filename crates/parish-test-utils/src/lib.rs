//! Testing utilities for the parish bindings workspace
//!
//! Shared host fixture, record helpers and tracing setup.

#![allow(missing_docs)]

use parish_meta::{ActiveRecord, ContentType, MetaEdit, MetaMap, MetaStore, RecordId, RecordRef};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

/// In-memory editor host
///
/// Counts metadata fetches and records every dispatched edit. Dispatched
/// edits are merged into the stored map, like the host's edit buffer.
#[derive(Debug, Default)]
pub struct MemoryHost {
    records: Mutex<HashMap<RecordRef, MetaMap>>,
    active: Mutex<Option<RecordRef>>,
    fetches: AtomicUsize,
    edits: Mutex<Vec<(RecordRef, MetaEdit)>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meta(self, record: &RecordRef, key: &str, value: impl Into<Value>) -> Self {
        self.set_meta(record, key, value);
        self
    }

    pub fn with_active(self, record: &RecordRef) -> Self {
        self.set_active(Some(record.clone()));
        self
    }

    /// Change a stored value behind the synchronizer's back
    pub fn set_meta(&self, record: &RecordRef, key: &str, value: impl Into<Value>) {
        self.records
            .lock()
            .entry(record.clone())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn set_active(&self, record: Option<RecordRef>) {
        *self.active.lock() = record;
    }

    pub fn meta(&self, record: &RecordRef) -> MetaMap {
        self.records.lock().get(record).cloned().unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn edits(&self) -> Vec<(RecordRef, MetaEdit)> {
        self.edits.lock().clone()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.lock().len()
    }
}

impl ActiveRecord for MemoryHost {
    fn active_record(&self) -> Option<RecordRef> {
        self.active.lock().clone()
    }
}

impl MetaStore for MemoryHost {
    fn edited_meta(&self, record: &RecordRef) -> MetaMap {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.meta(record)
    }

    fn edit_meta(&self, record: &RecordRef, edit: MetaEdit) {
        {
            let mut records = self.records.lock();
            let meta = records.entry(record.clone()).or_default();
            for (key, value) in &edit.meta {
                meta.insert(key.clone(), Value::String(value.clone()));
            }
        }
        self.edits.lock().push((record.clone(), edit));
    }
}

pub fn record_id(id: u64) -> RecordId {
    RecordId::new(id).expect("test record ids are positive")
}

pub fn record(content_type: ContentType, id: u64) -> RecordRef {
    RecordRef::of(content_type, record_id(id))
}

pub fn news_record(id: u64) -> RecordRef {
    record(ContentType::News, id)
}

/// Install a test-friendly subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
