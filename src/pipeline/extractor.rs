// file: src/pipeline/extractor.rs
// description: concurrent per-segment finding extraction (map stage)
// reference: fan-out across all segments, join-all, partial-failure tolerant

use crate::error::AnalysisError;
use crate::inference::{ChatMessage, InferenceClient};
use crate::models::Segment;
use crate::utils::strip_code_fences;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FindingExtractor {
    client: Arc<dyn InferenceClient>,
}

impl FindingExtractor {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Analyze every segment concurrently and return the candidate findings
    /// concatenated in segment order. One concurrent call per segment; a
    /// segment whose call fails or returns an unparseable payload contributes
    /// zero findings and never fails the stage.
    ///
    /// `join_all` resolves in input order regardless of completion order,
    /// which is what preserves segment order in the output.
    pub async fn extract_all(&self, segments: &[Segment]) -> Vec<Value> {
        if segments.is_empty() {
            return Vec::new();
        }

        let total = segments.len();
        info!("Analyzing {} segments concurrently", total);

        let calls = segments.iter().map(|segment| {
            let messages = self.build_messages(segment, total);
            async move {
                let result = self.client.complete(&messages).await;
                (segment.index, result)
            }
        });

        let responses = join_all(calls).await;

        let mut candidates = Vec::new();
        for (index, result) in responses {
            match result {
                Ok(raw) => {
                    let findings = Self::parse_segment_response(index, &raw);
                    debug!("Segment {} contributed {} findings", index, findings.len());
                    candidates.extend(findings);
                }
                Err(e) => {
                    let dropped = AnalysisError::SegmentAnalysis {
                        index,
                        message: e.to_string(),
                    };
                    warn!("{}, dropping its contribution", dropped);
                }
            }
        }

        info!("Collected {} candidate findings", candidates.len());
        candidates
    }

    fn build_messages(&self, segment: &Segment, total: usize) -> Vec<ChatMessage> {
        let prompt = format!(
            "You are a professional legal contract review agent. Analyze the following\n\
             contract text fragment (part of a larger contract) and identify legal risks.\n\
             \n\
             Contract fragment ({}/{}):\n\
             {}\n\
             \n\
             Output a JSON list where each element has these fields:\n\
             - title: short risk title\n\
             - type: risk level, one of \"high\", \"medium\", \"low\"\n\
             - category: risk category\n\
             - description: detailed risk description\n\
             - suggestion: suggested amendment\n\
             - clause: the relevant source clause excerpt\n\
             \n\
             If the fragment contains no notable legal risk, return an empty list [].\n\
             Output only the raw JSON array, without markdown ```json fences.",
            segment.index + 1,
            total,
            segment.text
        );

        vec![
            ChatMessage::system("You are a helpful legal assistant that outputs raw JSON."),
            ChatMessage::user(prompt),
        ]
    }

    /// Strict structural boundary: anything that is not a JSON array counts
    /// as a malformed response and contributes nothing.
    fn parse_segment_response(index: usize, raw: &str) -> Vec<Value> {
        let cleaned = strip_code_fences(raw);

        match serde_json::from_str::<Value>(&cleaned) {
            Ok(Value::Array(findings)) => findings,
            Ok(_) => {
                warn!(
                    "Segment {}: {}",
                    index,
                    AnalysisError::MalformedResponse("expected a JSON array".to_string())
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Segment {}: {}: {}...",
                    index,
                    AnalysisError::MalformedResponse(e.to_string()),
                    cleaned.chars().take(80).collect::<String>()
                );
                Vec::new()
            }
        }
    }
}
