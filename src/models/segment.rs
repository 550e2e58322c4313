// file: src/models/segment.rs
// description: bounded text slice of a document, sized for the inference context
// reference: internal data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One bounded slice of document text. Indices are contiguous from 0; adjacent
/// segments may overlap so a clause is never truncated at a boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub text: String,
    pub document_id: Uuid,
}

impl Segment {
    pub fn new(index: usize, text: String, document_id: Uuid) -> Self {
        Self {
            index,
            text,
            document_id,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
