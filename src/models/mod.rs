// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod finding;
pub mod segment;

pub use document::Document;
pub use finding::{Finding, RiskSummary, Severity};
pub use segment::Segment;
