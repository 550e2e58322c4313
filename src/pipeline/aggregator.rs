// file: src/pipeline/aggregator.rs
// description: consolidation of per-segment findings with deterministic fallback (reduce stage)
// reference: one merge call; on failure, pass-through with renumbering

use crate::inference::{ChatMessage, InferenceClient};
use crate::utils::strip_code_fences;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Aggregator {
    client: Arc<dyn InferenceClient>,
}

impl Aggregator {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Merge and deduplicate candidate findings with a single consolidation
    /// call. When the call fails (transport or structure), degrade to the
    /// unmerged candidates renumbered 1..N: worse results beat no results.
    /// Both paths return a JSON list, never null. A keyed object from the
    /// model is passed through as-is; the normalizer unwraps it.
    pub async fn aggregate(&self, candidates: Vec<Value>) -> Value {
        if candidates.is_empty() {
            return Value::Array(Vec::new());
        }

        match self.consolidate(&candidates).await {
            Ok(merged) => {
                info!("Consolidated {} candidate findings", candidates.len());
                merged
            }
            Err(e) => {
                warn!("Consolidation failed ({}), falling back to renumbering", e);
                Value::Array(Self::renumber(candidates))
            }
        }
    }

    async fn consolidate(&self, candidates: &[Value]) -> crate::error::Result<Value> {
        let candidates_json = serde_json::to_string_pretty(candidates)?;

        let prompt = format!(
            "Below is a list of scattered risk findings identified from different parts\n\
             of one contract. As a senior legal expert, consolidate, deduplicate, and\n\
             organize them.\n\
             \n\
             Scattered findings:\n\
             {}\n\
             \n\
             Requirements:\n\
             1. Deduplicate: merge findings whose content is identical or very similar.\n\
             2. Consolidate: when several findings concern the same clause, merge them\n\
                into a single entry where reasonable.\n\
             3. Format: output the final JSON list, each element containing:\n\
                - id: integer, renumbered starting from 1\n\
                - title: risk title\n\
                - type: risk level (\"high\", \"medium\", \"low\")\n\
                - category: risk category\n\
                - description: detailed description\n\
                - suggestion: suggested amendment\n\
                - clause: source excerpt\n\
             \n\
             Output only the raw JSON array.",
            candidates_json
        );

        let messages = [
            ChatMessage::system("You are a helpful legal assistant that outputs raw JSON."),
            ChatMessage::user(prompt),
        ];

        let raw = self
            .client
            .complete(&messages)
            .await
            .map_err(|e| crate::error::AnalysisError::Aggregation(e.to_string()))?;

        let cleaned = strip_code_fences(&raw);
        serde_json::from_str::<Value>(&cleaned).map_err(|e| {
            crate::error::AnalysisError::Aggregation(format!(
                "unparseable consolidation response: {}",
                e
            ))
        })
    }

    /// Fallback path: candidates unchanged except for sequential ids from 1.
    /// Idempotent: renumbering a renumbered list yields identical ids.
    fn renumber(candidates: Vec<Value>) -> Vec<Value> {
        candidates
            .into_iter()
            .enumerate()
            .map(|(i, mut value)| {
                if let Value::Object(ref mut map) = value {
                    map.insert("id".to_string(), Value::from(i as u64 + 1));
                }
                value
            })
            .collect()
    }
}
