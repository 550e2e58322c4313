// file: src/pipeline/classifier.rs
// description: single-call document category labeling with degrade-to-fallback
// reference: informational stage, never aborts the pipeline

use crate::config::ClassifierConfig;
use crate::inference::{ChatMessage, InferenceClient};
use crate::utils::clean_label;
use std::sync::Arc;
use tracing::{info, warn};

/// Label used when the response arrives but is not a plausible short label.
pub const GENERAL_CATEGORY: &str = "General Contract";
/// Label used when the inference call itself fails.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

const MAX_LABEL_CHARS: usize = 60;

pub struct Classifier {
    client: Arc<dyn InferenceClient>,
    sample_chars: usize,
}

impl Classifier {
    pub fn new(client: Arc<dyn InferenceClient>, config: &ClassifierConfig) -> Self {
        Self {
            client,
            sample_chars: config.sample_chars,
        }
    }

    /// Classify the document from a bounded leading sample. Any failure or a
    /// malformed (overly long, multi-line) response degrades to a fallback
    /// label rather than an error.
    pub async fn classify(&self, text: &str) -> String {
        let sample: String = text.chars().take(self.sample_chars).collect();

        let prompt = format!(
            "Based on the opening portion of the contract below, determine the contract type.\n\
             \n\
             Text sample:\n\
             {}\n\
             \n\
             Output only the name of the contract type, for example \"Employment Contract\",\n\
             \"Residential Lease\", \"Software Development Agreement\", \"Purchase Agreement\",\n\
             or \"Non-Disclosure Agreement\".\n\
             If the type cannot be determined, output \"{}\".\n\
             Do not output any other explanatory text.",
            sample, GENERAL_CATEGORY
        );

        let messages = [
            ChatMessage::system("You are a helpful legal assistant."),
            ChatMessage::user(prompt),
        ];

        match self.client.complete(&messages).await {
            Ok(response) => {
                let label = clean_label(&response);
                if label.is_empty() || label.chars().count() > MAX_LABEL_CHARS || label.contains('\n')
                {
                    warn!("Classifier returned a malformed label, using fallback");
                    return GENERAL_CATEGORY.to_string();
                }
                info!("Identified contract type: {}", label);
                label
            }
            Err(e) => {
                warn!("Contract type identification failed: {}", e);
                UNKNOWN_CATEGORY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, Result};
    use async_trait::async_trait;

    struct FixedClient(Result<String>);

    #[async_trait]
    impl InferenceClient for FixedClient {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(AnalysisError::Inference("unavailable".to_string())),
            }
        }
    }

    fn classifier(result: Result<String>) -> Classifier {
        Classifier::new(Arc::new(FixedClient(result)), &ClassifierConfig {
            sample_chars: 3000,
        })
    }

    #[tokio::test]
    async fn test_clean_label_passthrough() {
        let label = classifier(Ok("\"Employment Contract\"\n".to_string()))
            .classify("This employment agreement...")
            .await;
        assert_eq!(label, "Employment Contract");
    }

    #[tokio::test]
    async fn test_multiline_response_degrades() {
        let label = classifier(Ok("This looks like\na lease agreement".to_string()))
            .classify("Lease terms...")
            .await;
        assert_eq!(label, GENERAL_CATEGORY);
    }

    #[tokio::test]
    async fn test_overlong_response_degrades() {
        let label = classifier(Ok("x".repeat(200)))
            .classify("Some contract text")
            .await;
        assert_eq!(label, GENERAL_CATEGORY);
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_to_unknown() {
        let label = classifier(Err(AnalysisError::Inference("boom".to_string())))
            .classify("Some contract text")
            .await;
        assert_eq!(label, UNKNOWN_CATEGORY);
    }
}
