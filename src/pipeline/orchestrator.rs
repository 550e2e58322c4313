// file: src/pipeline/orchestrator.rs
// description: analysis state machine with cancellation polling and progress checkpoints
// reference: sequences parse, classify, split, extract, aggregate, validate

use crate::config::Config;
use crate::error::{AnalysisError, Result};
use crate::inference::{ChatClient, InferenceClient};
use crate::models::{Document, Finding, RiskSummary, Severity};
use crate::parser::TextExtractor;
use crate::pipeline::aggregator::Aggregator;
use crate::pipeline::classifier::{Classifier, UNKNOWN_CATEGORY};
use crate::pipeline::extractor::FindingExtractor;
use crate::pipeline::normalizer::Normalizer;
use crate::pipeline::progress::{AnalysisStats, ProgressSink, ProgressWriter, RunStatus};
use crate::pipeline::segmenter::Segmenter;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;
pub type CancelFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Category reported by the placeholder path when no inference capability
/// could be constructed.
pub const PLACEHOLDER_CATEGORY: &str = "Demo Contract";

/// Pipeline stages in execution order. Transitions are strictly forward;
/// `Failed` and `Cancelled` are side terminals reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Parsing,
    Classifying,
    Splitting,
    Extracting,
    Aggregating,
    Validating,
    Done,
}

impl Stage {
    /// Fixed progress checkpoint emitted on stage entry.
    pub fn checkpoint(&self) -> u8 {
        match self {
            Stage::Parsing => 10,
            Stage::Classifying => 20,
            Stage::Splitting => 30,
            Stage::Extracting => 40,
            Stage::Aggregating => 80,
            Stage::Validating => 95,
            Stage::Done => 100,
        }
    }
}

/// Result of one analysis run. Always well-formed: a failed run carries empty
/// findings and `RunStatus::Failed` rather than an error.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub findings: Vec<Finding>,
    pub category: String,
    pub summary: RiskSummary,
    pub status: RunStatus,
    pub stats: AnalysisStats,
}

/// Transient state bag for one invocation. Owned exclusively by the invoking
/// task and destroyed when the run returns.
struct PipelineRun {
    run_id: Uuid,
    stage: Option<Stage>,
    error: Option<AnalysisError>,
    progress: u8,
    started_at: Instant,
    stats: AnalysisStats,
}

impl PipelineRun {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            stage: None,
            error: None,
            progress: 0,
            started_at: Instant::now(),
            stats: AnalysisStats::new(),
        }
    }

    fn record_error(&mut self, error: AnalysisError) {
        warn!("Pipeline error recorded in {:?}: {}", self.stage, error);
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn failed(&self) -> bool {
        self.error.is_some()
    }
}

pub struct Orchestrator {
    config: Config,
    client: Option<Arc<dyn InferenceClient>>,
    text_extractor: TextExtractor,
    segmenter: Segmenter,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl Orchestrator {
    /// Build from configuration. A missing API key does not fail construction:
    /// the capability stays unavailable and `run` takes the documented
    /// placeholder path.
    pub fn from_config(config: Config, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        let client: Option<Arc<dyn InferenceClient>> =
            match ChatClient::from_config(&config.inference) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!("{} - analysis will return placeholder data", e);
                    None
                }
            };

        Self::with_client(config, client, sink)
    }

    /// Explicit capability injection; `None` selects the placeholder path.
    pub fn with_client(
        config: Config,
        client: Option<Arc<dyn InferenceClient>>,
        sink: Option<Arc<dyn ProgressSink>>,
    ) -> Self {
        let segmenter = Segmenter::from_config(&config.segmenter);
        Self {
            config,
            client,
            text_extractor: TextExtractor::new(),
            segmenter,
            sink,
        }
    }

    /// Run the full analysis for one document under a fresh run identifier.
    /// The only error a started run surfaces is `Cancelled`; every other
    /// failure degrades to a well-formed outcome (possibly with empty
    /// findings and `RunStatus::Failed`).
    pub async fn run(
        &self,
        file_path: &Path,
        on_progress: Option<ProgressFn>,
        is_cancelled: Option<CancelFn>,
    ) -> Result<AnalysisOutcome> {
        self.run_with_id(Uuid::new_v4(), file_path, on_progress, is_cancelled)
            .await
    }

    /// Same as `run`, with a caller-chosen run identifier so observers can
    /// follow the `analysis:{run_id}:*` keys in the progress sink while the
    /// run is live.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        file_path: &Path,
        on_progress: Option<ProgressFn>,
        is_cancelled: Option<CancelFn>,
    ) -> Result<AnalysisOutcome> {
        let mut run = PipelineRun::new(run_id);
        let writer = self.progress_writer(run.run_id);

        info!("Starting analysis run {} for {}", run.run_id, file_path.display());

        let Some(client) = self.client.clone() else {
            info!("Inference capability unavailable, returning placeholder findings");
            writer.write_status(RunStatus::Completed).await;
            writer.write_progress(100).await;
            return Ok(Self::placeholder_outcome(run));
        };

        writer.write_status(RunStatus::Analyzing).await;

        // Parsing
        self.enter_stage(&mut run, Stage::Parsing, &writer, &on_progress, &is_cancelled)
            .await?;
        let document = match self.text_extractor.extract(file_path) {
            Ok(text) => Some(Document::new(file_path.display().to_string(), text)),
            Err(e) => {
                run.record_error(e);
                None
            }
        };

        // Classifying - informational, never aborts
        self.enter_stage(&mut run, Stage::Classifying, &writer, &on_progress, &is_cancelled)
            .await?;
        let category = match &document {
            Some(doc) if !run.failed() && !doc.text.trim().is_empty() => {
                Classifier::new(client.clone(), &self.config.classifier)
                    .classify(&doc.text)
                    .await
            }
            _ => UNKNOWN_CATEGORY.to_string(),
        };

        // Splitting
        self.enter_stage(&mut run, Stage::Splitting, &writer, &on_progress, &is_cancelled)
            .await?;
        let segments = match &document {
            Some(doc) if !run.failed() => self.segmenter.segment(doc),
            _ => Vec::new(),
        };
        run.stats.segments = segments.len();
        info!("Split document into {} segments", segments.len());

        // Extracting - concurrent fan-out, one call per segment
        self.enter_stage(&mut run, Stage::Extracting, &writer, &on_progress, &is_cancelled)
            .await?;
        let candidates = if run.failed() || segments.is_empty() {
            Vec::new()
        } else {
            // In-flight calls are never interrupted; cancellation is observed
            // at whole-batch granularity around the fan-out/fan-in boundary.
            self.check_cancelled(&mut run, &writer, &is_cancelled).await?;
            let candidates = FindingExtractor::new(client.clone())
                .extract_all(&segments)
                .await;
            self.check_cancelled(&mut run, &writer, &is_cancelled).await?;
            self.emit_progress(&mut run, 75, &writer, &on_progress).await;
            candidates
        };
        run.stats.candidate_findings = candidates.len();

        // Aggregating
        self.enter_stage(&mut run, Stage::Aggregating, &writer, &on_progress, &is_cancelled)
            .await?;
        let aggregated = if run.failed() || candidates.is_empty() {
            Value::Array(Vec::new())
        } else {
            Aggregator::new(client.clone()).aggregate(candidates).await
        };

        // Validating - runs even on a failed run so callers always get a
        // well-formed (empty) list
        self.enter_stage(&mut run, Stage::Validating, &writer, &on_progress, &is_cancelled)
            .await?;
        let findings = if run.failed() {
            Vec::new()
        } else {
            Normalizer::new().normalize(aggregated)
        };
        run.stats.final_findings = findings.len();
        run.stats.duration_secs = run.started_at.elapsed().as_secs_f64();

        if let Some(error) = &run.error {
            writer.write_status(RunStatus::Failed).await;
            info!("Analysis run {} failed: {}", run.run_id, error);
            return Ok(AnalysisOutcome {
                findings: Vec::new(),
                category: UNKNOWN_CATEGORY.to_string(),
                summary: RiskSummary::default(),
                status: RunStatus::Failed,
                stats: run.stats,
            });
        }

        self.enter_stage(&mut run, Stage::Done, &writer, &on_progress, &is_cancelled)
            .await?;
        writer.write_status(RunStatus::Completed).await;

        let summary = RiskSummary::from_findings(&findings);
        info!(
            "Analysis run {} completed: {} findings ({} high) in {:.1}s",
            run.run_id, findings.len(), summary.high, run.stats.duration_secs
        );

        Ok(AnalysisOutcome {
            findings,
            category,
            summary,
            status: RunStatus::Completed,
            stats: run.stats,
        })
    }

    /// Stage entry: poll cancellation, advance the (strictly forward) stage,
    /// emit the stage's progress checkpoint.
    async fn enter_stage(
        &self,
        run: &mut PipelineRun,
        stage: Stage,
        writer: &ProgressWriter,
        on_progress: &Option<ProgressFn>,
        is_cancelled: &Option<CancelFn>,
    ) -> Result<()> {
        self.check_cancelled(run, writer, is_cancelled).await?;

        debug_assert!(
            run.stage.is_none_or(|current| current < stage),
            "stage transitions must be strictly forward"
        );
        run.stage = Some(stage);

        self.emit_progress(run, stage.checkpoint(), writer, on_progress)
            .await;
        Ok(())
    }

    async fn check_cancelled(
        &self,
        run: &mut PipelineRun,
        writer: &ProgressWriter,
        is_cancelled: &Option<CancelFn>,
    ) -> Result<()> {
        if is_cancelled.as_ref().is_some_and(|check| check()) {
            info!("Analysis run {} cancelled in {:?}", run.run_id, run.stage);
            writer.write_status(RunStatus::Cancelled).await;
            return Err(AnalysisError::Cancelled);
        }
        Ok(())
    }

    /// Progress is monotonically non-decreasing for the life of the run.
    async fn emit_progress(
        &self,
        run: &mut PipelineRun,
        percent: u8,
        writer: &ProgressWriter,
        on_progress: &Option<ProgressFn>,
    ) {
        run.progress = run.progress.max(percent);
        if let Some(callback) = on_progress {
            callback(run.progress);
        }
        writer.write_progress(run.progress).await;
    }

    fn progress_writer(&self, run_id: Uuid) -> ProgressWriter {
        let sink = if self.config.progress.enabled {
            self.sink.clone()
        } else {
            None
        };
        let ttl = Some(Duration::from_secs(self.config.progress.ttl_secs));
        ProgressWriter::new(sink, run_id, ttl)
    }

    /// Deterministic single-finding output for the missing-credential case.
    /// Intentional fallback so the surrounding application keeps working
    /// against demo data instead of erroring out.
    fn placeholder_outcome(run: PipelineRun) -> AnalysisOutcome {
        let findings = vec![Finding {
            id: 1,
            title: "(demo data) Inference API key not configured".to_string(),
            severity: Severity::High,
            category: "Configuration".to_string(),
            description: "No inference API key was found, so the system degraded to demo mode."
                .to_string(),
            suggestion: "Set CONTRACT_AUDIT__INFERENCE__API_KEY (or inference.api_key in the \
                         config file) to enable real analysis."
                .to_string(),
            clause: "System Config Error".to_string(),
        }];

        let summary = RiskSummary::from_findings(&findings);
        let mut stats = run.stats;
        stats.final_findings = findings.len();
        stats.duration_secs = run.started_at.elapsed().as_secs_f64();

        AnalysisOutcome {
            findings,
            category: PLACEHOLDER_CATEGORY.to_string(),
            summary,
            status: RunStatus::Completed,
            stats,
        }
    }
}
