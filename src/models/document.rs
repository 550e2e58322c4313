// file: src/models/document.rs
// description: core document model with content hashing
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub file_path: String,
    pub text: String,
    pub content_hash: String,
    pub byte_len: u64,
    /// Set once the classifier has run; None until then.
    pub category: Option<String>,
}

impl Document {
    pub fn new(file_path: String, text: String) -> Self {
        let content_hash = Self::compute_hash(&text);
        let byte_len = text.len() as u64;

        Self {
            id: Uuid::new_v4(),
            file_path,
            text,
            content_hash,
            byte_len,
            category: None,
        }
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn set_category(&mut self, category: String) {
        self.category = Some(category);
    }
}
