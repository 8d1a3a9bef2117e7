//! End-to-end tests for the `parish/post-meta` binding source.
//!
//! Drives the source the way the editor does: raw JSON contexts and bindings
//! through the registry, with the host's metadata store on the other side.

use parish_bindings::{BindingSourceRegistry, SyncConfig};
use parish_meta::EditorHost;
use parish_test_utils::{init_tracing, news_record, MemoryHost};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn registry_with(host: &Arc<MemoryHost>, config: SyncConfig) -> BindingSourceRegistry {
    init_tracing();
    let mut registry = BindingSourceRegistry::new();
    let host: Arc<dyn EditorHost> = host.clone();
    registry
        .register_post_meta(host, config)
        .expect("post-meta source registers");
    registry
}

/// Tenet: a bound summary reads, edits and flushes as a single meta update.
#[tokio::test(start_paused = true)]
async fn news_summary_roundtrip() {
    let news = news_record(7);
    let host = Arc::new(MemoryHost::new().with_meta(&news, "parish_news_summary", "Hello"));
    let registry = registry_with(&host, SyncConfig::default());
    let source = registry.get("parish/post-meta").unwrap();

    let context = json!({ "postType": "parish_news", "postId": 7 });
    let binding = json!({ "content": { "args": { "key": "parish_news_summary" } } });

    let values = source.get_values(&context, &binding);
    assert_eq!(values["content"], "Hello");
    assert!(source.can_user_edit_value(&context, &json!({ "key": "parish_news_summary" })));

    let update = json!({
        "content": { "args": { "key": "parish_news_summary" }, "newValue": "Updated" }
    });
    source.set_values(&context, &update);
    assert_eq!(host.edit_count(), 0);

    tokio::time::sleep(Duration::from_millis(151)).await;

    let edits = host.edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].0, news);
    assert_eq!(
        serde_json::to_value(&edits[0].1).unwrap(),
        json!({ "meta": { "parish_news_summary": "Updated" } })
    );
}

/// Tenet: blocks without explicit context edit the record open in the editor.
#[tokio::test(start_paused = true)]
async fn missing_context_uses_open_record() {
    let news = news_record(12);
    let host = Arc::new(
        MemoryHost::new()
            .with_meta(&news, "parish_news_summary", "Open")
            .with_active(&news),
    );
    let registry = registry_with(&host, SyncConfig::default());
    let source = registry.get("parish/post-meta").unwrap();
    let binding = json!({ "content": "parish_news_summary" });

    assert_eq!(source.get_values(&json!(null), &binding)["content"], "Open");

    source.set_values(
        &json!({}),
        &json!({ "content": { "key": "parish_news_summary", "newValue": 5 } }),
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(host.edits()[0].0, news);
    assert_eq!(host.edits()[0].1.get("parish_news_summary"), Some("5"));
}

/// Tenet: without any resolvable record every hook degrades quietly.
#[tokio::test(start_paused = true)]
async fn unresolved_context_degrades_quietly() {
    let host = Arc::new(MemoryHost::new());
    let registry = registry_with(&host, SyncConfig::default());
    let source = registry.get("parish/post-meta").unwrap();
    let binding = json!({ "content": { "args": { "key": "parish_news_summary" }, "newValue": "x" } });

    assert!(source.get_values(&json!({}), &binding).is_empty());
    source.set_values(&json!({ "postType": "parish_news" }), &binding);
    assert!(!source.can_user_edit_value(&json!({}), &json!({ "key": "parish_news_summary" })));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(host.edit_count(), 0);
    assert_eq!(host.fetch_count(), 0);
}

/// Tenet: configured timings are honoured.
#[tokio::test(start_paused = true)]
async fn configured_debounce_is_used() {
    let news = news_record(3);
    let host = Arc::new(MemoryHost::new());
    let config = SyncConfig::from_toml_str("debounce_ms = 500\n").unwrap();
    let registry = registry_with(&host, config);
    let source = registry.get("parish/post-meta").unwrap();

    source.set_values(
        &json!({ "postType": "parish_news", "postId": 3 }),
        &json!({ "content": { "args": { "key": "parish_news_summary" }, "newValue": "Late" } }),
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(host.edit_count(), 0);

    tokio::time::sleep(Duration::from_millis(201)).await;
    assert_eq!(host.edit_count(), 1);
    assert_eq!(host.meta(&news)["parish_news_summary"], json!("Late"));
}

/// Tenet: the synchronizer returned at registration can flush on session end.
#[tokio::test(start_paused = true)]
async fn session_end_flushes_pending_edits() {
    let host = Arc::new(MemoryHost::new());
    init_tracing();
    let mut registry = BindingSourceRegistry::new();
    let sync = registry
        .register_post_meta(host.clone(), SyncConfig::default())
        .unwrap();
    let source = registry.get("parish/post-meta").unwrap();

    source.set_values(
        &json!({ "postType": "parish_event", "postId": 4 }),
        &json!({ "place": { "args": { "key": "parish_event_place" }, "newValue": "Crypt" } }),
    );
    assert_eq!(sync.pending_count(), 1);

    assert_eq!(sync.flush_all(), 1);
    assert_eq!(host.edit_count(), 1);
    assert!(sync.is_idle());
}
