// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod inference;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod utils;

pub use config::{ClassifierConfig, Config, InferenceConfig, ProgressConfig, SegmenterConfig};
pub use error::{AnalysisError, Result};
pub use exporter::{AnalysisReport, JsonExporter};
pub use inference::{ChatClient, ChatMessage, InferenceClient};
pub use models::{Document, Finding, RiskSummary, Segment, Severity};
pub use parser::TextExtractor;
pub use pipeline::{
    AnalysisOutcome, AnalysisStats, CancelFn, MemoryProgressSink, Orchestrator, ProgressFn,
    ProgressSink, RunStatus, Segmenter, Stage,
};
