// file: src/pipeline/progress.rs
// description: run status projection into an external progress sink, plus run statistics
// reference: eventually-consistent observer state; the in-memory run is authoritative

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Externally visible run status. Not authoritative while the run is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Analyzing => "analyzing",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Keyed external store the orchestrator projects run state into. Absence of
/// a sink changes observability only, never pipeline behavior.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
}

/// In-process sink honoring per-key time-to-live. Used by tests and the CLI.
pub struct MemoryProgressSink {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for MemoryProgressSink {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|(value, expires_at)| {
            match expires_at {
                Some(deadline) if Instant::now() >= *deadline => None,
                _ => Some(value.clone()),
            }
        }))
    }
}

/// Fire-and-forget writer for one run's `status` and `progress` fields.
/// Sink failures are logged and swallowed; they never affect the run.
pub struct ProgressWriter {
    sink: Option<std::sync::Arc<dyn ProgressSink>>,
    run_id: Uuid,
    ttl: Option<Duration>,
}

impl ProgressWriter {
    pub fn new(
        sink: Option<std::sync::Arc<dyn ProgressSink>>,
        run_id: Uuid,
        ttl: Option<Duration>,
    ) -> Self {
        Self { sink, run_id, ttl }
    }

    pub fn status_key(run_id: Uuid) -> String {
        format!("analysis:{}:status", run_id)
    }

    pub fn progress_key(run_id: Uuid) -> String {
        format!("analysis:{}:progress", run_id)
    }

    pub async fn write_status(&self, status: RunStatus) {
        let Some(sink) = &self.sink else { return };
        let key = Self::status_key(self.run_id);
        if let Err(e) = sink.set(&key, &status.to_string(), self.ttl).await {
            warn!("Progress sink write failed for {}: {}", key, e);
        }
    }

    pub async fn write_progress(&self, percent: u8) {
        let Some(sink) = &self.sink else { return };
        let key = Self::progress_key(self.run_id);
        if let Err(e) = sink.set(&key, &percent.to_string(), self.ttl).await {
            warn!("Progress sink write failed for {}: {}", key, e);
        }
    }
}

/// Counters for one completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    pub segments: usize,
    pub candidate_findings: usize,
    pub final_findings: usize,
    pub duration_secs: f64,
}

impl AnalysisStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments_per_second(&self) -> f64 {
        if self.duration_secs == 0.0 {
            return 0.0;
        }
        self.segments as f64 / self.duration_secs
    }

    /// Fraction of candidates surviving deduplication; 1.0 when nothing was
    /// merged away.
    pub fn dedup_ratio(&self) -> f64 {
        if self.candidate_findings == 0 {
            return 1.0;
        }
        self.final_findings as f64 / self.candidate_findings as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_sink_set_get() {
        let sink = MemoryProgressSink::new();
        sink.set("analysis:run:status", "analyzing", None)
            .await
            .unwrap();

        let value = sink.get("analysis:run:status").await.unwrap();
        assert_eq!(value.as_deref(), Some("analyzing"));
        assert_eq!(sink.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_sink_ttl_expiry() {
        let sink = MemoryProgressSink::new();
        sink.set("k", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(sink.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writer_without_sink_is_noop() {
        let writer = ProgressWriter::new(None, Uuid::new_v4(), None);
        writer.write_status(RunStatus::Analyzing).await;
        writer.write_progress(50).await;
    }

    #[tokio::test]
    async fn test_writer_projects_status_and_progress() {
        let sink = Arc::new(MemoryProgressSink::new());
        let run_id = Uuid::new_v4();
        let writer = ProgressWriter::new(Some(sink.clone()), run_id, None);

        writer.write_status(RunStatus::Completed).await;
        writer.write_progress(100).await;

        let status = sink.get(&ProgressWriter::status_key(run_id)).await.unwrap();
        assert_eq!(status.as_deref(), Some("completed"));
        let progress = sink
            .get(&ProgressWriter::progress_key(run_id))
            .await
            .unwrap();
        assert_eq!(progress.as_deref(), Some("100"));
    }

    #[test]
    fn test_stats_ratios() {
        let stats = AnalysisStats {
            segments: 4,
            candidate_findings: 10,
            final_findings: 6,
            duration_secs: 2.0,
        };
        assert_eq!(stats.segments_per_second(), 2.0);
        assert_eq!(stats.dedup_ratio(), 0.6);

        let empty = AnalysisStats::new();
        assert_eq!(empty.segments_per_second(), 0.0);
        assert_eq!(empty.dedup_ratio(), 1.0);
    }
}
