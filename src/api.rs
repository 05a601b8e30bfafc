use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{PipelineError, Result};

/// Error-message substrings the inference API uses for each failure class.
const AUTH_MARKER: &str = "Authorization";
const BUSY_MARKERS: [&str; 2] = ["Model is currently loading", "Model too busy"];

/// Seam between the remote clients and the wire. Tests script responses
/// through this trait; production uses `HttpTransport`.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// POST raw audio bytes, bearer-token auth, JSON response.
    async fn post_audio(&self, endpoint: &str, token: &str, audio: Vec<u8>) -> Result<Value>;

    /// POST a JSON payload, bearer-token auth, JSON response.
    async fn post_json(&self, endpoint: &str, token: &str, payload: Value) -> Result<Value>;
}

/// reqwest-backed transport for the hosted inference API
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl InferenceTransport for HttpTransport {
    async fn post_audio(&self, endpoint: &str, token: &str, audio: Vec<u8>) -> Result<Value> {
        debug!("POST {} ({} audio bytes)", endpoint, audio.len());
        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", token))
            .body(audio)
            .send()
            .await?;
        Ok(response.json().await?)
    }

    async fn post_json(&self, endpoint: &str, token: &str, payload: Value) -> Result<Value> {
        debug!("POST {}", endpoint);
        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", token))
            .json(&payload)
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

/// Classify an `"error"` message from the inference API.
pub fn classify_error_message(message: &str) -> PipelineError {
    if message.contains(AUTH_MARKER) {
        PipelineError::Auth(message.to_string())
    } else if BUSY_MARKERS.iter().any(|m| message.contains(m)) {
        PipelineError::TransientBusy(message.to_string())
    } else {
        PipelineError::Fatal(format!("Unexpected error: {}", message))
    }
}

/// Pull the error message out of a response body, if it carries one.
pub fn error_message(response: &Value) -> Option<&str> {
    response.get("error").and_then(Value::as_str)
}

/// Run `call` under a bounded fixed-delay retry. Only transient-busy
/// failures are re-attempted; auth and fatal errors surface immediately.
/// The delay is an async sleep, so a caller can cancel or time out the
/// whole operation from outside.
pub async fn retry_with_policy<F, Fut>(
    operation: &'static str,
    policy: RetryPolicy,
    mut call: F,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match call().await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() && attempts < policy.max_attempts => {
                warn!(
                    "{} busy, retrying in {}s (attempt {} of {})",
                    operation,
                    policy.delay_seconds,
                    attempts,
                    policy.max_attempts
                );
                tokio::time::sleep(policy.delay()).await;
            }
            Err(PipelineError::TransientBusy(message)) => {
                return Err(PipelineError::RetriesExhausted {
                    operation,
                    attempts,
                    message,
                })
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn zero_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, 0)
    }

    #[test]
    fn test_classify_auth_error() {
        let err = classify_error_message("Authorization header is correct, but the token seems invalid");
        assert!(matches!(err, PipelineError::Auth(_)));
    }

    #[test]
    fn test_classify_busy_errors() {
        assert!(classify_error_message("Model is currently loading").is_transient());
        assert!(classify_error_message("Model too busy, try again later").is_transient());
    }

    #[test]
    fn test_classify_unknown_error_is_fatal() {
        let err = classify_error_message("Internal server error");
        assert!(matches!(err, PipelineError::Fatal(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = json!({"error": "Model too busy"});
        assert_eq!(error_message(&body), Some("Model too busy"));
        assert_eq!(error_message(&json!({"text": "hi"})), None);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_busy() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy("transcription", zero_delay(5), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(PipelineError::TransientBusy("Model is currently loading".into()))
            } else {
                Ok("hello".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap(), "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_reports_attempt_count() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy("transcription", zero_delay(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(PipelineError::TransientBusy("Model is currently loading".into()))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match result.unwrap_err() {
            PipelineError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 5),
            other => panic!("expected RetriesExhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_auth_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy("transcription", zero_delay(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(PipelineError::Auth("Authorization header invalid".into()))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), PipelineError::Auth(_)));
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy("summarization", zero_delay(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(PipelineError::Fatal("malformed response".into()))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), PipelineError::Fatal(_)));
    }
}
