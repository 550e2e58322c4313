// file: src/inference/mod.rs
// description: inference capability trait and chat message envelope
// reference: narrow seam over an external, possibly-unavailable service

pub mod chat;

pub use chat::ChatClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Single-turn completion capability. Every call site must treat failure as
/// recoverable at that stage's granularity.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
