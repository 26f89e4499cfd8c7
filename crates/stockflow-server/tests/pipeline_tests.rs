//! Ingestion pipeline property tests
//!
//! Exercises the orchestrator and promotion workflow directly against the
//! in-memory backend, checking the batch-level invariants that hold for any
//! input: counts add up, statuses are finalized exactly once, upserts are
//! idempotent per (sku, store), and promotion is all-or-nothing.

use serde_json::{json, Value};

use stockflow_common::types::{IngestionStatus, RawRow};
use stockflow_server::features::ingestion_errors::commands::{
    promote, PromoteErrorCommand, PromoteErrorError,
};
use stockflow_server::features::ingestions::commands::{start, StartIngestionCommand};
use stockflow_server::store::{IngestionErrorStore, IngestionStore, InventoryStore, MemoryStore};

fn raw(value: Value) -> RawRow {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn good(sku: &str, quantity: i64) -> RawRow {
    raw(json!({
        "sku": sku,
        "store": "KEN",
        "quantity": quantity,
        "description": "widget",
        "last_upload": "2026-01-15T09:30:00Z",
    }))
}

async fn ingest(store: &MemoryStore, rows: Vec<RawRow>) -> start::IngestionSummary {
    start::handle(store, store, store, StartIngestionCommand { rows })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_counts_add_up_for_arbitrary_batches() {
    let batches: Vec<Vec<RawRow>> = vec![
        vec![],
        vec![good("UK-1", 1)],
        vec![good("UK-1", 1), raw(json!({})), raw(json!({ "sku": "UK-2" }))],
        (0..20).map(|i| good(&format!("UK-{i}"), i)).collect(),
    ];

    for rows in batches {
        let store = MemoryStore::new();
        let total = rows.len() as i64;
        let summary = ingest(&store, rows).await;
        assert_eq!(summary.total, total);
        assert_eq!(summary.success + summary.errors.len() as i64, total);
    }
}

#[tokio::test]
async fn test_status_reflects_error_presence() {
    let store = MemoryStore::new();

    let clean = ingest(&store, vec![good("UK-1", 1)]).await;
    let record = IngestionStore::find_by_id(&store, clean.ingestion_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, IngestionStatus::Complete);
    assert_eq!(record.error_count, Some(0));

    let dirty = ingest(&store, vec![good("UK-2", 1), raw(json!({}))]).await;
    let record = IngestionStore::find_by_id(&store, dirty.ingestion_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, IngestionStatus::Error);
    assert_eq!(record.error_count, Some(1));
}

#[tokio::test]
async fn test_accepted_row_round_trips() {
    let store = MemoryStore::new();
    let summary = ingest(&store, vec![good("UK-55", 7)]).await;

    let row = InventoryStore::find_by_sku_and_store(&store, "UK-55", "KEN")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.sku, "UK-55");
    assert_eq!(row.store, "KEN");
    assert_eq!(row.quantity, 7);
    assert_eq!(row.description.as_deref(), Some("widget"));
    assert_eq!(row.ingestion_id, summary.ingestion_id);
    assert_eq!(row.last_upload.to_rfc3339(), "2026-01-15T09:30:00+00:00");
}

#[tokio::test]
async fn test_repeated_ingestion_is_idempotent_per_key() {
    let store = MemoryStore::new();
    ingest(&store, vec![good("UK-1", 5)]).await;
    let second = ingest(&store, vec![good("UK-1", 9)]).await;

    let rows = InventoryStore::find_all(&store).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 9);
    assert_eq!(rows[0].ingestion_id, second.ingestion_id);
}

#[tokio::test]
async fn test_quarantined_rows_carry_position_and_original_data() {
    let store = MemoryStore::new();
    let bad = raw(json!({ "sku": "UK-1", "store": "LDS", "quantity": -2 }));
    let summary = ingest(&store, vec![good("UK-0", 1), bad.clone(), good("UK-2", 2)]).await;

    let errors = store.find_by_ingestion(summary.ingestion_id).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row_number, 2);
    assert_eq!(errors[0].raw_data, bad);
    // One message per violated rule, joined in field order.
    assert!(errors[0].error_msg.contains("store"));
    assert!(errors[0].error_msg.contains("negative"));
    assert!(errors[0].error_msg.contains("; "));
}

#[tokio::test]
async fn test_promotion_is_all_or_nothing() {
    let store = MemoryStore::new();
    let summary = ingest(
        &store,
        vec![raw(json!({ "sku": "UK-7", "store": "HOM", "quantity": 3 }))],
    )
    .await;
    let errors = store.find_by_ingestion(summary.ingestion_id).await.unwrap();
    let error_id = errors[0].id;

    // The row only lacked last_upload; promotion stamps it and succeeds.
    let outcome = promote::handle(&store, &store, PromoteErrorCommand { id: error_id })
        .await
        .unwrap();
    assert_eq!(outcome.sku, "UK-7");

    assert!(IngestionErrorStore::find_by_id(&store, error_id)
        .await
        .unwrap()
        .is_none());
    let row = InventoryStore::find_by_sku_and_store(&store, "UK-7", "HOM")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.quantity, 3);
    assert_eq!(row.ingestion_id, summary.ingestion_id);

    // A second promotion attempt finds nothing to promote.
    let err = promote::handle(&store, &store, PromoteErrorCommand { id: error_id })
        .await
        .unwrap_err();
    assert!(matches!(err, PromoteErrorError::NotFound(_)));
}
