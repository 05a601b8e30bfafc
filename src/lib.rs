/// Meeting Assistant
///
/// Turns uploaded meeting documents plus free-text points into a structured
/// agenda, and meeting videos into transcripts and summaries, via hosted
/// inference APIs with bounded fixed-delay retries.

pub mod agenda;
pub mod api;
pub mod chunker;
pub mod config;
pub mod documents;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod summarize;
pub mod transcribe;

// Re-export main types for easy access
pub use crate::agenda::AgendaGenerator;
pub use crate::api::{HttpTransport, InferenceTransport};
pub use crate::chunker::{ChunkFile, ChunkPlan, ChunkSpec, Chunker};
pub use crate::config::{Config, RetryPolicy};
pub use crate::documents::{combine_documents, read_document, DocumentKind};
pub use crate::error::{CleanupWarning, PipelineError, Result};
pub use crate::media::{AudioAsset, AudioExtractor, MediaAsset};
pub use crate::pipeline::{PipelineOutcome, PipelineStage, VideoPipeline};
pub use crate::summarize::{truncate_words, SummarizationClient};
pub use crate::transcribe::TranscriptionClient;
