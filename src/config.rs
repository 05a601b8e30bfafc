use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PipelineError, Result};

/// Environment variable holding the Hugging Face API token.
pub const API_TOKEN_ENV: &str = "HF_API_KEY";

/// Configuration for the meeting assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote API access settings
    pub api: ApiConfig,

    /// Audio extraction and chunking settings
    pub audio: AudioConfig,

    /// Transcription endpoint settings
    pub transcription: TranscriptionConfig,

    /// Summarization endpoint settings
    pub summarization: SummarizationConfig,

    /// Agenda generation settings
    pub agenda: AgendaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bearer token for the inference API
    pub token: Option<String>,

    /// Request timeout for a single HTTP call (seconds)
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate for the intermediate WAV (Whisper optimal)
    pub target_sample_rate: u32,

    /// Chunk duration in seconds
    pub chunk_duration_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Speech-to-text endpoint URL
    pub endpoint: String,

    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    /// Summarization endpoint URL
    pub endpoint: String,

    /// Maximum summary length requested from the model
    pub max_length: u32,

    /// Minimum summary length requested from the model
    pub min_length: u32,

    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaConfig {
    /// Agenda endpoint URL (a lighter summarization model)
    pub endpoint: String,

    /// Hard word-count cutoff applied to the combined input
    pub max_input_words: usize,

    /// Maximum generated agenda length
    pub max_length: u32,
}

/// Bounded retry with a fixed inter-attempt delay
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Fixed delay between attempts (seconds)
    pub delay_seconds: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_seconds: u64) -> Self {
        Self {
            max_attempts,
            delay_seconds,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

impl Config {
    /// Load configuration from known file locations, then apply
    /// environment overrides. Falls back to defaults when no file exists.
    pub fn load() -> Self {
        let config_paths = ["meeting-assistant.toml", "config/meeting-assistant.toml"];

        let mut config = Config::default();
        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(parsed) => {
                        tracing::info!("Loaded configuration from: {}", path);
                        config = parsed;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        config.apply_env();
        config
    }

    /// Override settings from environment variables.
    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            self.api.token = Some(token);
        }

        if let Ok(chunk) = std::env::var("MEETING_ASSISTANT_CHUNK_SECONDS") {
            if let Ok(seconds) = chunk.parse() {
                self.audio.chunk_duration_seconds = seconds;
            }
        }
    }

    /// Pre-flight check, run before any pipeline work starts. A missing
    /// or blank token must surface here as a configuration error, not as
    /// a failure deep inside a run.
    pub fn validate(&self) -> Result<()> {
        match &self.api.token {
            None => Err(PipelineError::Configuration(format!(
                "{} is not set; check your environment or .env file",
                API_TOKEN_ENV
            ))),
            Some(token) if token.trim().is_empty() => Err(PipelineError::Configuration(
                format!("{} is set but blank", API_TOKEN_ENV),
            )),
            Some(_) => {
                if self.audio.chunk_duration_seconds == 0 {
                    return Err(PipelineError::Configuration(
                        "chunk_duration_seconds must be greater than 0".into(),
                    ));
                }
                if self.transcription.retry.max_attempts == 0
                    || self.summarization.retry.max_attempts == 0
                {
                    return Err(PipelineError::Configuration(
                        "retry max_attempts must be greater than 0".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Token for the Authorization header. Call after `validate()`.
    pub fn token(&self) -> &str {
        self.api.token.as_deref().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                token: None,
                request_timeout_seconds: 120,
            },
            audio: AudioConfig {
                target_sample_rate: 16000, // Optimal for Whisper
                chunk_duration_seconds: 60,
            },
            transcription: TranscriptionConfig {
                endpoint: "https://api-inference.huggingface.co/models/openai/whisper-large-v3"
                    .to_string(),
                retry: RetryPolicy::new(5, 10),
            },
            summarization: SummarizationConfig {
                endpoint: "https://api-inference.huggingface.co/models/facebook/bart-large-cnn"
                    .to_string(),
                max_length: 150,
                min_length: 50,
                retry: RetryPolicy::new(3, 10),
            },
            agenda: AgendaConfig {
                endpoint:
                    "https://api-inference.huggingface.co/models/sshleifer/distilbart-cnn-12-6"
                        .to_string(),
                max_input_words: 900,
                max_length: 900,
            },
        }
    }
}
