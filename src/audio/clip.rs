use crate::error::PlaybackError;
use hound::{SampleFormat, WavReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A decoded recording held in memory as mono f32 samples.
///
/// Cloning is cheap; both playback paths share the same sample data.
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioClip {
    /// Decode a WAV file, downmixing to mono.
    pub fn open(path: &Path) -> Result<Self, PlaybackError> {
        let reader = WavReader::open(path).map_err(|e| PlaybackError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let spec = reader.spec();
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(PlaybackError::Unsupported(format!(
                "{} channels at {} Hz",
                spec.channels, spec.sample_rate
            )));
        }

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| PlaybackError::Decode(e.to_string()))?,
            (SampleFormat::Int, bits @ 1..=32) => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| PlaybackError::Decode(e.to_string()))?
            }
            (format, bits) => {
                return Err(PlaybackError::Unsupported(format!(
                    "{:?} samples with {} bits",
                    format, bits
                )));
            }
        };

        let samples = downmix(&interleaved, spec.channels as usize);
        tracing::debug!(
            "Loaded {:?}: {} frames at {} Hz",
            path,
            samples.len(),
            spec.sample_rate
        );

        Ok(Self::from_samples(samples, spec.sample_rate))
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total playing time at normal rate
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
