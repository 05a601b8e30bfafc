use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::api::{HttpTransport, InferenceTransport};
use crate::chunker::{ChunkFile, ChunkPlan, ChunkSpec, Chunker};
use crate::config::Config;
use crate::error::{CleanupWarning, Result};
use crate::media::{AudioExtractor, MediaAsset};
use crate::summarize::SummarizationClient;
use crate::transcribe::TranscriptionClient;

/// Stages of one pipeline run, in order. Linear, no branching back. An
/// outcome records the stage the run was working through when it ended,
/// so a caller can tell an extraction failure from a transcription one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Persisted,
    Extracted,
    Converted,
    Transcribing,
    Transcribed,
    Summarizing,
    Done,
    AbortedPartial,
}

/// Result of one pipeline run. Partial success is a valid outcome: a
/// transcript without a summary means summarization terminally failed
/// after transcription succeeded.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub transcript: Option<String>,
    pub summary: Option<String>,
    /// How the run ended: `Done` when every stage succeeded,
    /// `AbortedPartial` otherwise
    pub stage: PipelineStage,
    /// The stage the run was working through when it ended
    pub reached: PipelineStage,
}

impl PipelineOutcome {
    fn aborted_at(reached: PipelineStage) -> Self {
        Self {
            transcript: None,
            summary: None,
            stage: PipelineStage::AbortedPartial,
            reached,
        }
    }
}

/// Sequences extraction, chunked transcription and summarization for one
/// uploaded video, and owns the temporary files the run creates. Each run
/// works inside its own scratch directory, so overlapping runs never
/// collide on temp filenames.
pub struct VideoPipeline {
    config: Config,
    extractor: AudioExtractor,
    transcription: TranscriptionClient,
    summarization: SummarizationClient,
}

impl VideoPipeline {
    pub fn new(config: Config, transport: Arc<dyn InferenceTransport>) -> Self {
        let token = config.token().to_string();
        let extractor = AudioExtractor::new(config.audio.clone());
        let transcription = TranscriptionClient::new(
            config.transcription.clone(),
            token.clone(),
            transport.clone(),
        );
        let summarization =
            SummarizationClient::new(config.summarization.clone(), token, transport);

        Self {
            config,
            extractor,
            transcription,
            summarization,
        }
    }

    /// Build a pipeline backed by the real HTTP transport.
    pub fn with_http(config: Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(Duration::from_secs(
            config.api.request_timeout_seconds,
        ))?);
        Ok(Self::new(config, transport))
    }

    /// Process one uploaded video: persist, extract, convert, transcribe
    /// chunk by chunk, then summarize. Never returns an error: failures
    /// degrade the outcome instead, and the scratch directory is removed
    /// on every exit path.
    pub async fn process(&self, video: &[u8], container: &str) -> PipelineOutcome {
        let scratch = match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("could not create scratch directory: {}", e);
                return PipelineOutcome::aborted_at(PipelineStage::Idle);
            }
        };

        let scratch_path = scratch.path().to_path_buf();
        let outcome = self.run(&scratch_path, video, container).await;

        // Cleanup phase. TempDir::close surfaces removal problems; they are
        // warnings only and never change the run's result.
        if let Err(e) = scratch.close() {
            let warning = CleanupWarning {
                path: scratch_path,
                reason: e.to_string(),
            };
            warn!("{}", warning);
        }

        outcome
    }

    /// Convenience wrapper reading the video from disk first.
    pub async fn process_file(&self, path: &Path) -> PipelineOutcome {
        let container = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mp4".to_string());

        match tokio::fs::read(path).await {
            Ok(bytes) => self.process(&bytes, &container).await,
            Err(e) => {
                warn!("could not read video {}: {}", path.display(), e);
                PipelineOutcome::aborted_at(PipelineStage::Idle)
            }
        }
    }

    async fn run(&self, scratch: &Path, video: &[u8], container: &str) -> PipelineOutcome {
        // Persist the uploaded bytes into the run's scratch directory
        let video_path = scratch.join(format!("upload.{}", container));
        if let Err(e) = tokio::fs::write(&video_path, video).await {
            warn!("could not persist uploaded video: {}", e);
            return PipelineOutcome::aborted_at(PipelineStage::Persisted);
        }
        let asset = MediaAsset::new(video_path, container);
        info!("Persisted upload: {}", asset.path.display());

        let wav = match self.extractor.extract_audio(&asset, scratch).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("extraction failed: {}", e);
                return PipelineOutcome::aborted_at(PipelineStage::Extracted);
            }
        };

        let mp3 = match self.extractor.convert_to_mp3(&wav).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("conversion failed: {}", e);
                return PipelineOutcome::aborted_at(PipelineStage::Converted);
            }
        };

        let chunker = Chunker::new(scratch.to_path_buf());
        let chunk_duration = Duration::from_secs(self.config.audio.chunk_duration_seconds);
        let plan = chunker.plan(&mp3, chunk_duration);

        let transcript = match assemble_transcript(&self.transcription, &plan, |spec| {
            let chunker = chunker.clone();
            let mp3 = mp3.clone();
            async move { chunker.materialize(&mp3, &spec).await }
        })
        .await
        {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                warn!("transcription produced no text");
                return PipelineOutcome::aborted_at(PipelineStage::Transcribed);
            }
            Err(e) => {
                warn!("transcription failed: {}", e);
                return PipelineOutcome::aborted_at(PipelineStage::Transcribing);
            }
        };
        info!("Transcription complete ({} characters)", transcript.len());

        match self.summarization.summarize(&transcript).await {
            Ok(summary) => PipelineOutcome {
                transcript: Some(transcript),
                summary: Some(summary),
                stage: PipelineStage::Done,
                reached: PipelineStage::Done,
            },
            Err(e) => {
                // Partial success: the transcript stands on its own
                warn!("summarization failed, returning transcript only: {}", e);
                PipelineOutcome {
                    transcript: Some(transcript),
                    summary: None,
                    stage: PipelineStage::AbortedPartial,
                    reached: PipelineStage::Summarizing,
                }
            }
        }
    }
}

/// Transcribe chunks one at a time in strictly increasing index order,
/// joining the texts with a single space. Each chunk file is materialized
/// on demand and removed when it drops, on success and failure alike. A
/// terminal failure on any chunk aborts the loop: the transcript gathered
/// so far is logged, then discarded.
pub(crate) async fn assemble_transcript<F, Fut>(
    client: &TranscriptionClient,
    plan: &ChunkPlan,
    materialize: F,
) -> Result<String>
where
    F: Fn(ChunkSpec) -> Fut,
    Fut: Future<Output = Result<ChunkFile>>,
{
    let mut texts: Vec<String> = Vec::with_capacity(plan.len());

    for spec in plan.iter() {
        let chunk = materialize(*spec).await?;
        match client.transcribe(&chunk).await {
            Ok(text) => texts.push(text),
            Err(e) => {
                if !texts.is_empty() {
                    warn!(
                        "discarding partial transcript of {} chunk(s): {}",
                        texts.len(),
                        texts.join(" ")
                    );
                }
                warn!("chunk {} failed: {}", spec.index, e);
                return Err(e);
            }
        }
        // chunk drops here, removing its file before the next one is cut
    }

    Ok(texts.join(" ").trim().to_string())
}
