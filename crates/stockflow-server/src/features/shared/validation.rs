//! Row validation
//!
//! Validates raw ingestion rows against the inventory schema and converts
//! them into typed rows ready for persistence. Every check runs even after
//! the first failure so a rejected row reports all of its problems at once.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

use crate::store::InventoryPatch;
use stockflow_common::types::{NewInventoryRow, RawRow};

/// Store codes accepted by the inventory schema.
pub const ALLOWED_STORES: [&str; 3] = ["KEN", "BAT", "HOM"];

fn sku_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^UK-[A-Za-z0-9-]+$").unwrap())
}

/// All validation failures for a single row, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowValidationError {
    pub messages: Vec<String>,
}

impl fmt::Display for RowValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

impl std::error::Error for RowValidationError {}

/// Validate a raw row and produce a typed inventory row.
///
/// `ingestion_id` is attached by the caller; raw rows never carry it.
/// Unrecognized fields are ignored.
pub fn validate_row(raw: &RawRow, ingestion_id: i64) -> Result<NewInventoryRow, RowValidationError> {
    let mut messages = Vec::new();

    let sku = match raw.get("sku") {
        Some(Value::String(s)) if sku_pattern().is_match(s) => Some(s.clone()),
        Some(Value::String(s)) => {
            messages.push(format!(
                "sku '{s}' does not match the required format UK-<alphanumeric>"
            ));
            None
        }
        Some(_) => {
            messages.push("sku must be a string".to_string());
            None
        }
        None => {
            messages.push("sku is required".to_string());
            None
        }
    };

    let description = match raw.get("description") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(_) => {
            messages.push("description must be a string".to_string());
            None
        }
    };

    let store = match raw.get("store") {
        Some(Value::String(s)) if ALLOWED_STORES.contains(&s.as_str()) => Some(s.clone()),
        Some(Value::String(s)) => {
            messages.push(format!(
                "store '{s}' is not one of {}",
                ALLOWED_STORES.join(", ")
            ));
            None
        }
        Some(_) => {
            messages.push("store must be a string".to_string());
            None
        }
        None => {
            messages.push("store is required".to_string());
            None
        }
    };

    let quantity = match raw.get("quantity") {
        Some(value) => match parse_quantity(value) {
            Ok(q) => Some(q),
            Err(msg) => {
                messages.push(msg);
                None
            }
        },
        None => {
            messages.push("quantity is required".to_string());
            None
        }
    };

    let last_upload = match raw.get("last_upload") {
        Some(Value::String(s)) => match parse_timestamp(s) {
            Ok(ts) => Some(ts),
            Err(msg) => {
                messages.push(msg);
                None
            }
        },
        Some(_) => {
            messages.push("last_upload must be a string".to_string());
            None
        }
        None => {
            messages.push("last_upload is required".to_string());
            None
        }
    };

    match (sku, store, quantity, last_upload) {
        (Some(sku), Some(store), Some(quantity), Some(last_upload)) if messages.is_empty() => {
            Ok(NewInventoryRow {
                sku,
                description,
                store,
                quantity,
                last_upload,
                ingestion_id,
            })
        }
        _ => Err(RowValidationError { messages }),
    }
}

/// Relaxed variant for partial updates: the same field rules, applied only
/// to the recognized fields that are present. The caller is responsible for
/// rejecting immutable fields before calling this.
pub fn validate_patch(raw: &RawRow) -> Result<InventoryPatch, RowValidationError> {
    let mut messages = Vec::new();
    let mut patch = InventoryPatch::default();

    match raw.get("description") {
        Some(Value::String(s)) => patch.description = Some(Some(s.clone())),
        Some(Value::Null) => patch.description = Some(None),
        Some(_) => messages.push("description must be a string".to_string()),
        None => {}
    }

    if let Some(value) = raw.get("quantity") {
        match parse_quantity(value) {
            Ok(q) => patch.quantity = Some(q),
            Err(msg) => messages.push(msg),
        }
    }

    if let Some(value) = raw.get("last_upload") {
        match value {
            Value::String(s) => match parse_timestamp(s) {
                Ok(ts) => patch.last_upload = Some(ts),
                Err(msg) => messages.push(msg),
            },
            _ => messages.push("last_upload must be a string".to_string()),
        }
    }

    if let Some(value) = raw.get("ingestion_id") {
        match value.as_i64() {
            Some(id) if id > 0 => patch.ingestion_id = Some(id),
            _ => messages.push("ingestion_id must be a positive integer".to_string()),
        }
    }

    if messages.is_empty() {
        Ok(patch)
    } else {
        Err(RowValidationError { messages })
    }
}

/// Quantity must be a non-negative integer. Floats with a fractional part
/// are rejected rather than truncated.
fn parse_quantity(value: &Value) -> Result<i64, String> {
    let Value::Number(n) = value else {
        return Err("quantity must be a number".to_string());
    };
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let Some(q) = n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    }) else {
        return Err(format!("quantity '{n}' must be an integer"));
    };
    if q < 0 {
        return Err(format!("quantity must not be negative, got {q}"));
    }
    Ok(q)
}

/// Accepts RFC 3339 timestamps or bare YYYY-MM-DD dates (midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!(
        "last_upload '{s}' is not an RFC 3339 timestamp or YYYY-MM-DD date"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn valid_raw() -> RawRow {
        raw(json!({
            "sku": "UK-ABC-123",
            "description": "blue widget",
            "store": "KEN",
            "quantity": 10,
            "last_upload": "2026-01-15T09:30:00Z",
        }))
    }

    #[test]
    fn test_valid_row_passes() {
        let row = validate_row(&valid_raw(), 7).unwrap();
        assert_eq!(row.sku, "UK-ABC-123");
        assert_eq!(row.store, "KEN");
        assert_eq!(row.quantity, 10);
        assert_eq!(row.ingestion_id, 7);
    }

    #[test]
    fn test_missing_description_is_allowed() {
        let mut data = valid_raw();
        data.remove("description");
        let row = validate_row(&data, 1).unwrap();
        assert_eq!(row.description, None);

        data.insert("description".to_string(), Value::Null);
        let row = validate_row(&data, 1).unwrap();
        assert_eq!(row.description, None);
    }

    #[test]
    fn test_bad_sku_prefix_rejected() {
        let mut data = valid_raw();
        data.insert("sku".to_string(), json!("US-ABC"));
        let err = validate_row(&data, 1).unwrap_err();
        assert!(err.messages[0].contains("UK-"));
    }

    #[test]
    fn test_unknown_store_rejected() {
        let mut data = valid_raw();
        data.insert("store".to_string(), json!("LDS"));
        let err = validate_row(&data, 1).unwrap_err();
        assert!(err.to_string().contains("LDS"));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let mut data = valid_raw();
        data.insert("quantity".to_string(), json!(-3));
        let err = validate_row(&data, 1).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let mut data = valid_raw();
        data.insert("quantity".to_string(), json!(2.5));
        let err = validate_row(&data, 1).unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_integral_float_quantity_accepted() {
        let mut data = valid_raw();
        data.insert("quantity".to_string(), json!(4.0));
        let row = validate_row(&data, 1).unwrap();
        assert_eq!(row.quantity, 4);
    }

    #[test]
    fn test_huge_float_quantity_rejected() {
        let mut data = valid_raw();
        data.insert("quantity".to_string(), json!(1e30));
        let err = validate_row(&data, 1).unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_bare_date_accepted() {
        let mut data = valid_raw();
        data.insert("last_upload".to_string(), json!("2026-02-01"));
        let row = validate_row(&data, 1).unwrap();
        assert_eq!(row.last_upload.to_rfc3339(), "2026-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let mut data = valid_raw();
        data.insert("last_upload".to_string(), json!("last tuesday"));
        let err = validate_row(&data, 1).unwrap_err();
        assert!(err.to_string().contains("last_upload"));
    }

    #[test]
    fn test_all_failures_reported_together() {
        let data = raw(json!({ "quantity": "ten" }));
        let err = validate_row(&data, 1).unwrap_err();
        assert_eq!(err.messages.len(), 4);
        let joined = err.to_string();
        assert!(joined.contains("sku is required"));
        assert!(joined.contains("store is required"));
        assert!(joined.contains("quantity must be a number"));
        assert!(joined.contains("last_upload is required"));
    }

    #[test]
    fn test_unrecognized_fields_ignored() {
        let mut data = valid_raw();
        data.insert("colour".to_string(), json!("teal"));
        assert!(validate_row(&data, 1).is_ok());
    }

    #[test]
    fn test_patch_empty_input_yields_empty_patch() {
        let patch = validate_patch(&RawRow::new()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_null_description_clears_field() {
        let data = raw(json!({ "description": null }));
        let patch = validate_patch(&data).unwrap();
        assert_eq!(patch.description, Some(None));
    }

    #[test]
    fn test_patch_rejects_bad_quantity() {
        let data = raw(json!({ "quantity": -1 }));
        assert!(validate_patch(&data).is_err());
    }

    #[test]
    fn test_patch_collects_partial_fields() {
        let data = raw(json!({ "quantity": 12, "last_upload": "2026-03-01" }));
        let patch = validate_patch(&data).unwrap();
        assert_eq!(patch.quantity, Some(12));
        assert!(patch.last_upload.is_some());
        assert_eq!(patch.description, None);
    }
}
