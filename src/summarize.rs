use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::{classify_error_message, error_message, retry_with_policy, InferenceTransport};
use crate::config::SummarizationConfig;
use crate::error::{PipelineError, Result};

/// Client for the remote summarization endpoint
pub struct SummarizationClient {
    config: SummarizationConfig,
    token: String,
    transport: Arc<dyn InferenceTransport>,
}

impl SummarizationClient {
    pub fn new(
        config: SummarizationConfig,
        token: String,
        transport: Arc<dyn InferenceTransport>,
    ) -> Self {
        Self {
            config,
            token,
            transport,
        }
    }

    /// Summarize `text`, retrying transient-busy responses. Empty input is
    /// rejected up front without touching the network.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(PipelineError::Fatal("no text to summarize".into()));
        }

        info!("Summarizing {} characters of transcript", text.len());

        let payload = json!({
            "inputs": text,
            "parameters": {
                "max_length": self.config.max_length,
                "min_length": self.config.min_length,
            },
        });

        retry_with_policy("summarization", self.config.retry, || {
            let payload = payload.clone();
            async move {
                let response = self
                    .transport
                    .post_json(&self.config.endpoint, &self.token, payload)
                    .await?;
                parse_summary(&response)
            }
        })
        .await
    }
}

/// Classify a summarization response body: a list whose first element
/// carries `"summary_text"`, or `{"error": ...}`.
pub(crate) fn parse_summary(response: &Value) -> Result<String> {
    if let Some(summary) = response
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item.get("summary_text"))
        .and_then(Value::as_str)
    {
        return Ok(summary.to_string());
    }

    if let Some(message) = error_message(response) {
        return Err(classify_error_message(message));
    }

    Err(PipelineError::Fatal(format!(
        "Unexpected API response format: {}",
        response
    )))
}

/// Hard word-count cutoff. Not semantic compression: for input with more
/// than `max_words` words the result is exactly the first `max_words`
/// words, space-joined.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InferenceTransport;
    use crate::config::Config;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport that counts calls and always answers with a canned body.
    struct CountingTransport {
        calls: AtomicU32,
        body: Value,
    }

    #[async_trait]
    impl InferenceTransport for CountingTransport {
        async fn post_audio(&self, _: &str, _: &str, _: Vec<u8>) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }

        async fn post_json(&self, _: &str, _: &str, _: Value) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    fn client_with(body: Value) -> (SummarizationClient, Arc<CountingTransport>) {
        let transport = Arc::new(CountingTransport {
            calls: AtomicU32::new(0),
            body,
        });
        let mut config = Config::default().summarization;
        config.retry.delay_seconds = 0;
        let client =
            SummarizationClient::new(config, "hf_test".into(), transport.clone());
        (client, transport)
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_network_call() {
        let (client, transport) = client_with(json!([{"summary_text": "unused"}]));
        let err = client.summarize("   ").await.unwrap_err();

        assert!(matches!(err, PipelineError::Fatal(_)));
        assert!(err.to_string().contains("no text to summarize"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let (client, transport) = client_with(json!([{"summary_text": "short version"}]));
        let summary = client.summarize("long meeting transcript").await.unwrap();

        assert_eq!(summary, "short version");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_summarize_busy_exhausts_configured_retries() {
        let (client, transport) = client_with(json!({"error": "Model too busy"}));
        let err = client.summarize("some transcript").await.unwrap_err();

        // Summarization default policy is 3 attempts
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, PipelineError::RetriesExhausted { attempts: 3, .. }));
    }

    #[test]
    fn test_parse_summary_success() {
        let response = json!([{"summary_text": "the gist"}]);
        assert_eq!(parse_summary(&response).unwrap(), "the gist");
    }

    #[test]
    fn test_parse_summary_malformed() {
        assert!(parse_summary(&json!({"summary": "wrong key"})).is_err());
    }

    #[test]
    fn test_truncate_exact_word_count() {
        let text = "one two three four five six";
        let truncated = truncate_words(text, 4);
        assert_eq!(truncated, "one two three four");
        assert_eq!(truncated.split_whitespace().count(), 4);
    }

    #[test]
    fn test_truncate_is_word_prefix() {
        let text = "alpha beta gamma delta";
        let truncated = truncate_words(text, 2);
        let original: Vec<_> = text.split_whitespace().collect();
        let kept: Vec<_> = truncated.split_whitespace().collect();
        assert_eq!(kept, &original[..2]);
    }

    #[test]
    fn test_truncate_shorter_input_unchanged() {
        assert_eq!(truncate_words("just three words", 10), "just three words");
    }
}
