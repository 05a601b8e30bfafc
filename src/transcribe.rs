use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::api::{classify_error_message, error_message, retry_with_policy, InferenceTransport};
use crate::chunker::ChunkFile;
use crate::config::TranscriptionConfig;
use crate::error::{PipelineError, Result};

/// Client for the remote speech-to-text endpoint
pub struct TranscriptionClient {
    config: TranscriptionConfig,
    token: String,
    transport: Arc<dyn InferenceTransport>,
}

impl TranscriptionClient {
    pub fn new(
        config: TranscriptionConfig,
        token: String,
        transport: Arc<dyn InferenceTransport>,
    ) -> Self {
        Self {
            config,
            token,
            transport,
        }
    }

    /// Transcribe one chunk file, retrying transient-busy responses with
    /// the configured fixed delay.
    pub async fn transcribe(&self, chunk: &ChunkFile) -> Result<String> {
        let audio = chunk.read_bytes().await?;
        info!(
            "Transcribing chunk {} ({} bytes)",
            chunk.index,
            audio.len()
        );

        retry_with_policy("transcription", self.config.retry, || {
            let audio = audio.clone();
            async move {
                let response = self
                    .transport
                    .post_audio(&self.config.endpoint, &self.token, audio)
                    .await?;
                parse_transcription(&response)
            }
        })
        .await
    }
}

/// Classify a transcription response body. The endpoint answers with
/// `{"text": ...}`, a list whose first element carries `"text"`, or
/// `{"error": ...}`.
fn parse_transcription(response: &Value) -> Result<String> {
    if let Some(text) = response.get("text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    if let Some(text) = response
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item.get("text"))
        .and_then(Value::as_str)
    {
        return Ok(text.to_string());
    }

    if let Some(message) = error_message(response) {
        return Err(classify_error_message(message));
    }

    Err(PipelineError::Fatal(format!(
        "Unexpected API response format: {}",
        response
    )))
}
