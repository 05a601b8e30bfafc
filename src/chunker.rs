use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::media::{path_str, AudioAsset};

/// One planned slice of an audio asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// Zero-based position; transcripts are joined in this order
    pub index: usize,
    /// Offset into the source audio
    pub start: Duration,
    /// Slice length; the final chunk may be shorter than the target
    pub duration: Duration,
}

/// Ordered, finite plan of chunk slices for an audio asset
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    specs: Vec<ChunkSpec>,
}

impl ChunkPlan {
    /// Plan fixed-duration slices covering `total`. A 150s asset with 60s
    /// chunks yields three slices of 60s, 60s and 30s. A zero target
    /// duration yields an empty plan.
    pub fn new(total: Duration, chunk_duration: Duration) -> Self {
        if chunk_duration.is_zero() {
            return Self { specs: Vec::new() };
        }

        let mut specs = Vec::new();
        let mut start = Duration::ZERO;
        let mut index = 0;

        while start < total {
            let remaining = total - start;
            let duration = remaining.min(chunk_duration);
            specs.push(ChunkSpec {
                index,
                start,
                duration,
            });
            start += duration;
            index += 1;
        }

        Self { specs }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkSpec> {
        self.specs.iter()
    }
}

/// A materialized chunk file. Removed from disk on drop, so every exit
/// path from a transcription attempt releases the chunk's disk space.
#[derive(Debug)]
pub struct ChunkFile {
    path: PathBuf,
    pub index: usize,
}

impl ChunkFile {
    /// Take ownership of an already-materialized chunk file. The file is
    /// removed when the returned value drops.
    pub fn new(path: PathBuf, index: usize) -> Self {
        Self { path, index }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the chunk's bytes for upload.
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

impl Drop for ChunkFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "could not remove chunk file {}: {}",
                    self.path.display(),
                    e
                );
            }
        } else {
            debug!("Removed chunk file {}", self.path.display());
        }
    }
}

/// Cuts one chunk at a time from an audio asset. Chunks are materialized
/// on demand, not all up front, to bound temporary disk usage.
#[derive(Debug, Clone)]
pub struct Chunker {
    scratch_dir: PathBuf,
}

impl Chunker {
    pub fn new(scratch_dir: PathBuf) -> Self {
        Self { scratch_dir }
    }

    /// Plan the slices for `audio` at the given target duration.
    pub fn plan(&self, audio: &AudioAsset, chunk_duration: Duration) -> ChunkPlan {
        let plan = ChunkPlan::new(audio.duration, chunk_duration);
        info!(
            "Splitting {:.1}s of audio into {} chunks of up to {:.0}s",
            audio.duration.as_secs_f64(),
            plan.len(),
            chunk_duration.as_secs_f64()
        );
        plan
    }

    /// Cut a single chunk to its own file.
    pub async fn materialize(&self, audio: &AudioAsset, spec: &ChunkSpec) -> Result<ChunkFile> {
        let chunk_path = self
            .scratch_dir
            .join(format!("chunk_{:03}.{}", spec.index, audio.format));

        let output = tokio::process::Command::new("ffmpeg")
            .args([
                "-i",
                path_str(&audio.path)?,
                "-ss",
                &spec.start.as_secs_f64().to_string(),
                "-t",
                &spec.duration.as_secs_f64().to_string(),
                "-c",
                "copy", // Cut without re-encoding
                "-y",
                path_str(&chunk_path)?,
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(PipelineError::Extraction(format!(
                "could not cut chunk {} from {}",
                spec.index,
                audio.path.display()
            )));
        }

        debug!("Materialized chunk {} at {}", spec.index, chunk_path.display());

        Ok(ChunkFile {
            path: chunk_path,
            index: spec.index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_exact_multiple() {
        let plan = ChunkPlan::new(Duration::from_secs(120), Duration::from_secs(60));
        assert_eq!(plan.len(), 2);
        let specs: Vec<_> = plan.iter().copied().collect();
        assert_eq!(specs[0].start, Duration::ZERO);
        assert_eq!(specs[1].start, Duration::from_secs(60));
        assert_eq!(specs[1].duration, Duration::from_secs(60));
    }

    #[test]
    fn test_plan_short_final_chunk() {
        // 150s at 60s per chunk: 60, 60, 30
        let plan = ChunkPlan::new(Duration::from_secs(150), Duration::from_secs(60));
        assert_eq!(plan.len(), 3);
        let specs: Vec<_> = plan.iter().copied().collect();
        assert_eq!(specs[0].duration, Duration::from_secs(60));
        assert_eq!(specs[1].duration, Duration::from_secs(60));
        assert_eq!(specs[2].duration, Duration::from_secs(30));
        assert_eq!(specs[2].start, Duration::from_secs(120));
    }

    #[test]
    fn test_plan_indices_are_zero_based_and_increasing() {
        let plan = ChunkPlan::new(Duration::from_secs(150), Duration::from_secs(60));
        for (expected, spec) in plan.iter().enumerate() {
            assert_eq!(spec.index, expected);
        }
    }

    #[test]
    fn test_plan_empty_audio() {
        let plan = ChunkPlan::new(Duration::ZERO, Duration::from_secs(60));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_zero_chunk_duration_is_empty() {
        let plan = ChunkPlan::new(Duration::from_secs(150), Duration::ZERO);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_is_restartable() {
        let plan = ChunkPlan::new(Duration::from_secs(150), Duration::from_secs(60));
        let first: Vec<_> = plan.iter().copied().collect();
        let second: Vec<_> = plan.iter().copied().collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_chunk_file_removed_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chunk_000.mp3");
        tokio::fs::write(&path, b"audio bytes").await.unwrap();

        let chunk = ChunkFile {
            path: path.clone(),
            index: 0,
        };
        assert!(path.exists());
        drop(chunk);
        assert!(!path.exists());
    }
}
