// file: src/pipeline/mod.rs
// description: analysis pipeline module exports
// reference: internal module structure

pub mod aggregator;
pub mod classifier;
pub mod extractor;
pub mod normalizer;
pub mod orchestrator;
pub mod progress;
pub mod segmenter;

pub use aggregator::Aggregator;
pub use classifier::{Classifier, GENERAL_CATEGORY, UNKNOWN_CATEGORY};
pub use extractor::FindingExtractor;
pub use normalizer::Normalizer;
pub use orchestrator::{
    AnalysisOutcome, CancelFn, Orchestrator, ProgressFn, Stage, PLACEHOLDER_CATEGORY,
};
pub use progress::{
    AnalysisStats, MemoryProgressSink, ProgressSink, ProgressWriter, RunStatus,
};
pub use segmenter::Segmenter;
