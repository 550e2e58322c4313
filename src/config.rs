// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{AnalysisError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub inference: InferenceConfig,
    pub segmenter: SegmenterConfig,
    pub classifier: ClassifierConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    /// Absent key means the capability is unavailable and the pipeline
    /// short-circuits to placeholder output.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Extra attempts after the first failed request, per call.
    pub max_retries: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmenterConfig {
    /// Target segment size in characters.
    pub segment_size: usize,
    /// Characters carried over from the end of one segment into the next.
    pub overlap: usize,
    /// Split preference, tried in order. An empty string means hard cut.
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Number of leading characters sampled for category identification.
    pub sample_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProgressConfig {
    pub enabled: bool,
    /// Time-to-live for status/progress keys in the sink.
    pub ttl_secs: u64,
}

fn default_separators() -> Vec<String> {
    ["\n\n", "\n", "。", "；", ". ", "; ", " ", ""]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CONTRACT_AUDIT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| AnalysisError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| AnalysisError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            inference: InferenceConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.3,
                max_retries: 2,
                timeout_secs: 120,
            },
            segmenter: SegmenterConfig {
                segment_size: 6000,
                overlap: 1000,
                separators: default_separators(),
            },
            classifier: ClassifierConfig { sample_chars: 3000 },
            progress: ProgressConfig {
                enabled: true,
                ttl_secs: 3600,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.segmenter.segment_size == 0 {
            return Err(AnalysisError::Config(
                "segment_size must be greater than 0".to_string(),
            ));
        }

        if self.segmenter.overlap >= self.segmenter.segment_size {
            return Err(AnalysisError::Config(
                "overlap must be smaller than segment_size".to_string(),
            ));
        }

        if self.classifier.sample_chars == 0 {
            return Err(AnalysisError::Config(
                "sample_chars must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err(AnalysisError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        Ok(())
    }
}
