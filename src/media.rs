use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::AudioConfig;
use crate::error::{PipelineError, Result};

/// A media file on disk plus its container/codec tag
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub format: String,
}

impl MediaAsset {
    pub fn new(path: PathBuf, format: impl Into<String>) -> Self {
        Self {
            path,
            format: format.into(),
        }
    }
}

/// An extracted or converted audio track
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub format: String,
    pub duration: Duration,
}

/// Extracts and converts audio using ffmpeg as an external tool
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    config: AudioConfig,
}

impl AudioExtractor {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Extract the audio track from a video container to a mono WAV at the
    /// configured sample rate. Fails with `Extraction` if the container is
    /// unreadable or has no audio stream.
    pub async fn extract_audio(&self, video: &MediaAsset, output_dir: &Path) -> Result<AudioAsset> {
        let audio_path = output_dir.join("audio.wav");

        info!("Extracting audio track: {}", video.path.display());

        let output = tokio::process::Command::new("ffmpeg")
            .args([
                "-i",
                path_str(&video.path)?,
                "-vn", // No video stream
                "-acodec",
                "pcm_s16le",
                "-ar",
                &self.config.target_sample_rate.to_string(),
                "-ac",
                "1",
                "-f",
                "wav",
                "-y",
                path_str(&audio_path)?,
            ])
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.contains("does not contain any stream") {
                format!("{} has no audio track", video.path.display())
            } else {
                format!("ffmpeg could not read {}", video.path.display())
            };
            return Err(PipelineError::Extraction(reason));
        }

        let duration = self.probe_duration(&audio_path).await?;

        info!(
            "Audio extracted: {} ({:.1}s)",
            audio_path.display(),
            duration.as_secs_f64()
        );

        Ok(AudioAsset {
            path: audio_path,
            format: "wav".to_string(),
            duration,
        })
    }

    /// Re-encode the intermediate WAV to MP3, the chunking format the
    /// transcription endpoint prefers.
    pub async fn convert_to_mp3(&self, audio: &AudioAsset) -> Result<AudioAsset> {
        let mp3_path = audio.path.with_extension("mp3");

        let output = tokio::process::Command::new("ffmpeg")
            .args([
                "-i",
                path_str(&audio.path)?,
                "-acodec",
                "libmp3lame",
                "-y",
                path_str(&mp3_path)?,
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(PipelineError::Extraction(format!(
                "mp3 conversion failed for {}",
                audio.path.display()
            )));
        }

        info!("Converted to mp3: {}", mp3_path.display());

        Ok(AudioAsset {
            path: mp3_path,
            format: "mp3".to_string(),
            duration: audio.duration,
        })
    }

    /// Read the stream duration via ffprobe's JSON output.
    pub async fn probe_duration(&self, audio_path: &Path) -> Result<Duration> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                path_str(audio_path)?,
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(PipelineError::Extraction(format!(
                "ffprobe failed for {}",
                audio_path.display()
            )));
        }

        let probe: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let duration_seconds: f64 = probe["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                PipelineError::Extraction(format!(
                    "no duration reported for {}",
                    audio_path.display()
                ))
            })?;

        Ok(Duration::from_secs_f64(duration_seconds))
    }
}

pub(crate) fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        PipelineError::Extraction(format!("non-UTF-8 path: {}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_media_asset_tags_format() {
        let asset = MediaAsset::new(PathBuf::from("/tmp/upload.mp4"), "mp4");
        assert_eq!(asset.format, "mp4");
    }

    #[test]
    fn test_extractor_uses_configured_sample_rate() {
        let extractor = AudioExtractor::new(Config::default().audio);
        assert_eq!(extractor.config.target_sample_rate, 16000);
    }
}
