//! Bound-field synchronizer
//!
//! Mediates between editor block bindings and a record's metadata map:
//! - Reads go through [`MetaCache`] and never touch pending writes
//! - Writes are normalized, merged into a per-record pending batch and
//!   flushed as one edit once the record has been quiet for the debounce delay
//! - Edit checks apply the same namespace policy as reads and writes
//!
//! None of the three hooks fail. Unresolved contexts and foreign keys are
//! logged and skipped.

use crate::cache::{CacheStats, MetaCache};
use crate::config::SyncConfig;
use crate::debounce::Debouncer;
use dashmap::DashMap;
use indexmap::IndexMap;
use parish_meta::{
    display_value, BindingArgs, BindingSet, EditingContext, EditorHost, MetaEdit, MetaError,
    Namespace, RecordRef,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Normalized values waiting to be flushed, keyed by meta key
pub type PendingBatch = IndexMap<String, String>;

/// Values read for a set of bindings, keyed by attribute name
pub type BoundValues = IndexMap<String, String>;

/// Synchronizer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Metadata cache statistics
    pub cache: CacheStats,
    /// Values merged into pending batches
    pub queued_values: u64,
    /// Bindings skipped for a missing or foreign key
    pub skipped_bindings: u64,
    /// Edits dispatched to the host
    pub flushes: u64,
}

/// Batch for one record plus the generation of the write that last touched it
#[derive(Debug, Default)]
struct PendingWrites {
    generation: u64,
    batch: PendingBatch,
}

#[derive(Debug, Default)]
struct Counters {
    generation: AtomicU64,
    queued_values: AtomicU64,
    skipped_bindings: AtomicU64,
    flushes: AtomicU64,
}

/// Cache plus coalescing write queue for one editing session
pub struct MetaSynchronizer {
    host: Arc<dyn EditorHost>,
    config: SyncConfig,
    namespace: Namespace,
    cache: MetaCache,
    pending: Arc<DashMap<RecordRef, PendingWrites>>,
    debouncer: Debouncer<RecordRef>,
    counters: Arc<Counters>,
}

impl MetaSynchronizer {
    /// Create synchronizer with default configuration
    #[must_use]
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self::with_config(host, SyncConfig::default())
    }

    /// Create synchronizer with custom configuration
    #[must_use]
    pub fn with_config(host: Arc<dyn EditorHost>, config: SyncConfig) -> Self {
        Self {
            host,
            namespace: config.namespace(),
            cache: MetaCache::new(config.cache_ttl()),
            config,
            pending: Arc::new(DashMap::new()),
            debouncer: Debouncer::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Namespace policy in force
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Resolve the record a context refers to, falling back to the active record
    #[must_use]
    pub fn resolve(&self, context: &EditingContext) -> Option<RecordRef> {
        match context.resolve(|| self.host.active_record()) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(error = %err, "editing context unresolved");
                None
            }
        }
    }

    /// Current values for `bindings`, keyed by attribute
    ///
    /// Attributes bound to a missing or foreign key are omitted. Keys absent
    /// from the record read as the empty string.
    #[must_use]
    pub fn read_values(
        &self,
        context: &EditingContext,
        bindings: Option<&BindingSet>,
    ) -> BoundValues {
        let mut values = BoundValues::new();
        let Some(bindings) = bindings else {
            return values;
        };
        let Some(record) = self.resolve(context) else {
            return values;
        };

        let snapshot = self
            .cache
            .get_or_fetch(&record, || self.host.edited_meta(&record));

        for (attribute, binding) in bindings.iter() {
            match binding.meta_key(&self.namespace) {
                Ok(key) => {
                    values.insert(
                        attribute.to_owned(),
                        display_value(snapshot.get(key.as_str())),
                    );
                }
                Err(err) => self.skip(attribute, &err),
            }
        }

        values
    }

    /// Queue the proposed values of `bindings` and restart the record's
    /// debounce timer
    ///
    /// Bindings without a proposed value are not queued. Later values for a
    /// key replace earlier ones until the batch is flushed.
    pub fn write_values(&self, context: &EditingContext, bindings: Option<&BindingSet>) {
        let Some(bindings) = bindings else {
            return;
        };
        let Some(record) = self.resolve(context) else {
            return;
        };

        let mut updates = PendingBatch::new();
        for (attribute, binding) in bindings.iter() {
            let key = match binding.meta_key(&self.namespace) {
                Ok(key) => key,
                Err(err) => {
                    self.skip(attribute, &err);
                    continue;
                }
            };
            match binding.new_value().normalize() {
                Some(value) => {
                    updates.insert(key.into_string(), value);
                }
                None => tracing::trace!(attribute, "binding carries no new value"),
            }
        }

        self.counters
            .queued_values
            .fetch_add(updates.len() as u64, Ordering::Relaxed);

        let armed = {
            // Merge and re-arm under the record's entry lock so the live timer
            // always carries the batch's current generation.
            let mut writes = self.pending.entry(record.clone()).or_default();
            writes.generation = self.counters.generation.fetch_add(1, Ordering::Relaxed) + 1;
            writes.batch.extend(updates);
            self.schedule_flush(record.clone(), writes.generation)
        };

        if !armed {
            tracing::warn!("no async runtime available, metadata flushed without debounce");
            self.flush(&record);
        }
    }

    /// Check if the user may edit the key named in `args`
    #[must_use]
    pub fn can_edit(&self, context: &EditingContext, args: &BindingArgs) -> bool {
        let Some(record) = self.resolve(context) else {
            return false;
        };
        if !self.namespace.is_record_type(record.record_type()) {
            tracing::debug!(record = %record, "record type outside namespace");
            return false;
        }
        args.key().is_some_and(|key| self.namespace.is_meta_key(key))
    }

    /// Flush one record's pending batch now, cancelling its timer
    ///
    /// Returns whether an edit was dispatched.
    pub fn flush(&self, record: &RecordRef) -> bool {
        self.debouncer.cancel(record);
        flush_pending(self.host.as_ref(), &self.pending, &self.counters, record, None)
    }

    /// Flush every pending batch now; returns the number of edits dispatched
    pub fn flush_all(&self) -> usize {
        self.debouncer.cancel_all();
        let records: Vec<RecordRef> = self.pending.iter().map(|e| e.key().clone()).collect();
        records
            .iter()
            .filter(|record| {
                flush_pending(self.host.as_ref(), &self.pending, &self.counters, record, None)
            })
            .count()
    }

    /// Copy of the batch pending for `record`
    #[must_use]
    pub fn pending_batch(&self, record: &RecordRef) -> Option<PendingBatch> {
        self.pending.get(record).map(|writes| writes.batch.clone())
    }

    /// Number of records with a pending batch
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is queued and no timer is armed
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.debouncer.pending() == 0
    }

    /// Drop every cached snapshot so the next read refetches
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }

    /// Get synchronizer statistics
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        SyncStats {
            cache: self.cache.stats(),
            queued_values: self.counters.queued_values.load(Ordering::Relaxed),
            skipped_bindings: self.counters.skipped_bindings.load(Ordering::Relaxed),
            flushes: self.counters.flushes.load(Ordering::Relaxed),
        }
    }

    fn skip(&self, attribute: &str, err: &MetaError) {
        self.counters.skipped_bindings.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(attribute, error = %err, "binding skipped");
    }

    fn schedule_flush(&self, record: RecordRef, generation: u64) -> bool {
        let host = Arc::clone(&self.host);
        let pending = Arc::clone(&self.pending);
        let counters = Arc::clone(&self.counters);
        let target = record.clone();
        let delay = self.config.debounce_delay();

        tracing::debug!(record = %record, generation, delay_ms = self.config.debounce_ms, "metadata flush scheduled");

        self.debouncer.schedule(record, delay, move || {
            flush_pending(host.as_ref(), &pending, &counters, &target, Some(generation));
        })
    }
}

impl fmt::Debug for MetaSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaSynchronizer")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("pending", &self.pending.len())
            .field("timers", &self.debouncer.pending())
            .finish_non_exhaustive()
    }
}

/// Take the record's batch and dispatch it as one edit
///
/// With `generation` set, the batch is only taken if no write has touched it
/// since; the timer armed by that write flushes it instead.
fn flush_pending(
    host: &dyn EditorHost,
    pending: &DashMap<RecordRef, PendingWrites>,
    counters: &Counters,
    record: &RecordRef,
    generation: Option<u64>,
) -> bool {
    let taken = match generation {
        Some(generation) => pending.remove_if(record, |_, writes| writes.generation == generation),
        None => pending.remove(record),
    };
    let Some((_, PendingWrites { batch, .. })) = taken else {
        return false;
    };
    if batch.is_empty() {
        return false;
    }

    tracing::info!(record = %record, keys = batch.len(), "flushing metadata edit");
    counters.flushes.fetch_add(1, Ordering::Relaxed);
    host.edit_meta(record, MetaEdit::new(batch));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use parish_meta::{Binding, ContentType};
    use parish_test_utils::{news_record, record, MemoryHost};
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Arc<MemoryHost>, MetaSynchronizer, RecordRef) {
        let record = news_record(7);
        let host = Arc::new(MemoryHost::new().with_meta(&record, "parish_news_summary", "Hello"));
        let sync = MetaSynchronizer::new(host.clone());
        (host, sync, record)
    }

    fn summary(value: &str) -> BindingSet {
        BindingSet::new().with(
            "content",
            Binding::new("parish_news_summary").with_value(value),
        )
    }

    #[test]
    fn read_resolves_binding() {
        let (_, sync, record) = setup();
        let ctx = EditingContext::for_record(&record);
        let bindings = BindingSet::new().with("content", Binding::new("parish_news_summary"));

        let values = sync.read_values(&ctx, Some(&bindings));
        assert_eq!(values.get("content").map(String::as_str), Some("Hello"));
    }

    #[test]
    fn read_without_bindings_is_empty() {
        let (host, sync, record) = setup();
        let values = sync.read_values(&EditingContext::for_record(&record), None);
        assert!(values.is_empty());
        assert_eq!(host.fetch_count(), 0);
    }

    #[test]
    fn read_unset_key_is_empty_string() {
        let (_, sync, record) = setup();
        let bindings = BindingSet::new().with("date", Binding::new("parish_news_date"));

        let values = sync.read_values(&EditingContext::for_record(&record), Some(&bindings));
        assert_eq!(values.get("date").map(String::as_str), Some(""));
    }

    #[test]
    fn read_renders_stored_scalars() {
        let record = news_record(7);
        let host = Arc::new(
            MemoryHost::new()
                .with_meta(&record, "parish_news_views", json!(12))
                .with_meta(&record, "parish_news_pinned", json!(true))
                .with_meta(&record, "parish_news_note", json!(null)),
        );
        let sync = MetaSynchronizer::new(host);
        let bindings = BindingSet::new()
            .with("views", Binding::new("parish_news_views"))
            .with("pinned", Binding::new("parish_news_pinned"))
            .with("note", Binding::new("parish_news_note"));

        let values = sync.read_values(&EditingContext::for_record(&record), Some(&bindings));
        assert_eq!(values["views"], "12");
        assert_eq!(values["pinned"], "true");
        assert_eq!(values["note"], "");
    }

    #[test]
    fn read_renders_stored_structured_values() {
        let news = news_record(7);
        let gallery = record(ContentType::Gallery, 2);
        let host = Arc::new(
            MemoryHost::new()
                .with_meta(&gallery, "parish_gallery_images", json!([11, 12]))
                .with_meta(&news, "parish_news_meta", json!({ "a": 1 })),
        );
        let sync = MetaSynchronizer::new(host);

        let images = sync.read_values(
            &EditingContext::for_record(&gallery),
            Some(&BindingSet::new().with("images", Binding::new("parish_gallery_images"))),
        );
        let meta = sync.read_values(
            &EditingContext::for_record(&news),
            Some(&BindingSet::new().with("meta", Binding::new("parish_news_meta"))),
        );

        assert_eq!(images["images"], "[11,12]");
        assert_eq!(meta["meta"], r#"{"a":1}"#);
    }

    #[test]
    fn read_falls_back_to_active_record() {
        let (host, sync, record) = setup();
        host.set_active(Some(record));

        let bindings = BindingSet::new().with("content", Binding::new("parish_news_summary"));
        let values = sync.read_values(&EditingContext::new(), Some(&bindings));
        assert_eq!(values["content"], "Hello");
    }

    #[test]
    fn read_unresolved_context_is_empty() {
        let (host, sync, _) = setup();
        let bindings = BindingSet::new().with("content", Binding::new("parish_news_summary"));

        let values = sync.read_values(&EditingContext::new(), Some(&bindings));
        assert!(values.is_empty());
        assert_eq!(host.fetch_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn write_flushes_after_debounce() {
        let (host, sync, record) = setup();
        let ctx = EditingContext::for_record(&record);

        sync.write_values(&ctx, Some(&summary("Updated")));
        assert_eq!(host.edit_count(), 0);
        assert!(!sync.is_idle());

        tokio::time::sleep(Duration::from_millis(151)).await;

        let edits = host.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, record);
        assert_eq!(edits[0].1.get("parish_news_summary"), Some("Updated"));
        assert!(sync.is_idle());
        assert_eq!(sync.stats().flushes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_skips_foreign_and_undefined() {
        let (host, sync, record) = setup();
        let bindings = BindingSet::new()
            .with("title", Binding::new("post_title").with_value("x"))
            .with("content", Binding::new("parish_news_summary"));

        sync.write_values(&EditingContext::for_record(&record), Some(&bindings));
        assert_eq!(sync.pending_batch(&record), Some(PendingBatch::new()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(host.edit_count(), 0);
        assert_eq!(sync.stats().skipped_bindings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_without_context_is_noop() {
        let (host, sync, _) = setup();

        sync.write_values(&EditingContext::new(), Some(&summary("x")));
        sync.write_values(&EditingContext::new().with_record_type("parish_news"), None);

        assert!(sync.is_idle());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(host.edit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_all_dispatches_immediately() {
        let (host, sync, news) = setup();
        let event = record(ContentType::Event, 3);

        sync.write_values(&EditingContext::for_record(&news), Some(&summary("a")));
        sync.write_values(
            &EditingContext::for_record(&event),
            Some(&BindingSet::new().with("place", Binding::new("parish_event_place").with_value("Hall"))),
        );

        assert_eq!(sync.flush_all(), 2);
        assert_eq!(host.edit_count(), 2);
        assert!(sync.is_idle());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(host.edit_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_leaves_newer_writes_queued() {
        let (host, sync, record) = setup();
        let ctx = EditingContext::for_record(&record);

        sync.write_values(&ctx, Some(&summary("first")));
        let stale = sync.pending.get(&record).map(|writes| writes.generation).unwrap();
        sync.write_values(&ctx, Some(&summary("second")));

        // Timer of the first write firing after the second one merged
        assert!(!flush_pending(host.as_ref(), &sync.pending, &sync.counters, &record, Some(stale)));
        assert_eq!(host.edit_count(), 0);
        assert_eq!(sync.pending_batch(&record).unwrap()["parish_news_summary"], "second");

        tokio::time::sleep(Duration::from_millis(151)).await;
        assert_eq!(host.edit_count(), 1);
        assert_eq!(host.edits()[0].1.get("parish_news_summary"), Some("second"));
        assert!(sync.is_idle());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_lose_nothing() {
        let record = news_record(7);
        let host = Arc::new(MemoryHost::new());
        let config = SyncConfig::default().with_debounce(Duration::from_millis(5));
        let sync = Arc::new(MetaSynchronizer::with_config(host.clone(), config));

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let sync = Arc::clone(&sync);
                let record = record.clone();
                tokio::spawn(async move {
                    for round in 0..20 {
                        let key = format!("parish_news_w{writer}_{round}");
                        let bindings =
                            BindingSet::new().with("f", Binding::new(key).with_value("x"));
                        sync.write_values(&EditingContext::for_record(&record), Some(&bindings));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        sync.flush_all();

        let mut flushed = 0;
        for (_, edit) in host.edits() {
            assert!(!edit.is_empty());
            flushed += edit.len();
        }
        assert_eq!(flushed, 8 * 20);
        assert_eq!(host.meta(&record).len(), 8 * 20);
        assert!(sync.is_idle());
    }

    #[test]
    fn write_outside_runtime_flushes_inline() {
        let (host, sync, record) = setup();
        sync.write_values(&EditingContext::for_record(&record), Some(&summary("now")));
        assert_eq!(host.edit_count(), 1);
        assert!(sync.is_idle());
    }

    #[test]
    fn can_edit_policy() {
        let (_, sync, record) = setup();
        let ctx = EditingContext::for_record(&record);

        assert!(sync.can_edit(&ctx, &BindingArgs::new("parish_news_summary")));
        assert!(!sync.can_edit(&ctx, &BindingArgs::new("post_title")));
        assert!(!sync.can_edit(&ctx, &BindingArgs::default()));

        let page = EditingContext::new()
            .with_record_type("page")
            .with_record_id(record.id());
        assert!(!sync.can_edit(&page, &BindingArgs::new("parish_news_summary")));

        let no_id = EditingContext::new().with_record_type("parish_news");
        assert!(!sync.can_edit(&no_id, &BindingArgs::new("parish_news_summary")));
    }

    #[test]
    fn invalidate_cache_forces_refetch() {
        let (host, sync, record) = setup();
        let ctx = EditingContext::for_record(&record);
        let bindings = BindingSet::new().with("content", Binding::new("parish_news_summary"));

        let _ = sync.read_values(&ctx, Some(&bindings));
        host.set_meta(&record, "parish_news_summary", "Changed");
        sync.invalidate_cache();

        let values = sync.read_values(&ctx, Some(&bindings));
        assert_eq!(values["content"], "Changed");
        assert_eq!(host.fetch_count(), 2);
    }
}
