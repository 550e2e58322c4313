// file: src/pipeline/normalizer.rs
// description: strict validation boundary from loose JSON to finding records
// reference: defaulted decoding of inference-service response shapes

use crate::models::{Finding, Severity};
use serde_json::Value;
use tracing::{debug, warn};

pub const UNKNOWN_TITLE: &str = "Unknown Risk";
pub const DEFAULT_CATEGORY: &str = "General";

pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Turn whatever the aggregation stage produced into fully-populated
    /// finding records. Missing fields get defaults, non-object entries are
    /// dropped silently, and a keyed container is unwrapped to its first
    /// list-valued field. Always returns a list, never fails.
    pub fn normalize(&self, payload: Value) -> Vec<Finding> {
        let entries = match Self::unwrap_list(payload) {
            Some(entries) => entries,
            None => {
                warn!("Aggregated payload had no list-valued content");
                return Vec::new();
            }
        };

        let mut findings = Vec::new();
        for (position, entry) in entries.into_iter().enumerate() {
            let Value::Object(record) = entry else {
                debug!("Dropping non-object entry at position {}", position);
                continue;
            };

            let severity = record
                .get("type")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<Severity>().ok())
                .unwrap_or_default();

            findings.push(Finding {
                id: record
                    .get("id")
                    .and_then(Value::as_u64)
                    .map(|id| id as u32)
                    .unwrap_or(position as u32 + 1),
                title: string_field(&record, "title").unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                severity,
                category: string_field(&record, "category")
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                description: string_field(&record, "description").unwrap_or_default(),
                suggestion: string_field(&record, "suggestion").unwrap_or_default(),
                clause: string_field(&record, "clause").unwrap_or_default(),
            });
        }

        findings
    }

    /// A bare list is used directly. A keyed object unwraps to its first
    /// list-valued field in field order. Best-effort: when several fields
    /// hold lists this may pick the wrong one.
    fn unwrap_list(payload: Value) -> Option<Vec<Value>> {
        match payload {
            Value::Array(entries) => Some(entries),
            Value::Object(map) => map.into_iter().find_map(|(_, value)| match value {
                Value::Array(entries) => Some(entries),
                _ => None,
            }),
            _ => None,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn string_field(record: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
