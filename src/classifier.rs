/// Audio activity classifier module
///
/// Decodes a captured WAV buffer and computes aggregate loudness statistics
/// (RMS, variance, peak amplitude). The activity verdict is gated only by
/// peak amplitude: a stream is inactive when every sample is exactly zero.

use std::io::Cursor;
use thiserror::Error;
use tracing::info;

/// Audio sample format (16-bit PCM)
pub type AudioSample = i16;

/// Sample rate the sampler requests from ffmpeg
pub const SAMPLE_RATE: u32 = 44_100;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to decode WAV container: {0}")]
    Decode(String),
}

/// Aggregate loudness statistics over one sample window
///
/// Values are on the raw 16-bit sample scale, matching the configured
/// RMS/variance thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityStats {
    /// Root-mean-square amplitude, a loudness proxy
    pub rms: f64,

    /// Population variance of sample amplitudes
    pub variance: f64,

    /// Maximum absolute sample value; zero means digital silence
    pub peak_amplitude: f64,
}

/// Classification verdict for one sample window
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// At least one non-zero sample
    Active(ActivityStats),

    /// Non-empty window with zero peak amplitude
    Silent(ActivityStats),

    /// Window decoded to zero samples; no statistics available
    Empty,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        matches!(self, Activity::Active(_))
    }

    /// Statistics for the window, when any were computed.
    pub fn stats(&self) -> Option<&ActivityStats> {
        match self {
            Activity::Active(stats) | Activity::Silent(stats) => Some(stats),
            Activity::Empty => None,
        }
    }
}

/// Classify one captured WAV buffer.
///
/// The buffer is expected to carry mono 16-bit PCM as written by the sampler.
/// RMS and variance are computed for diagnostics and alert text; only
/// `peak_amplitude != 0` decides activity.
pub fn classify(wav_bytes: &[u8]) -> Result<Activity, ClassifierError> {
    let mut reader = hound::WavReader::new(Cursor::new(wav_bytes))
        .map_err(|e| ClassifierError::Decode(e.to_string()))?;

    let samples: Vec<AudioSample> = reader
        .samples::<AudioSample>()
        .collect::<Result<_, _>>()
        .map_err(|e| ClassifierError::Decode(e.to_string()))?;

    if samples.is_empty() {
        return Ok(Activity::Empty);
    }

    let stats = compute_stats(&samples);

    info!(
        "Analyzed sample: rms={:.2}, variance={:.2}, peak={:.0}",
        stats.rms, stats.variance, stats.peak_amplitude
    );

    if stats.peak_amplitude == 0.0 {
        Ok(Activity::Silent(stats))
    } else {
        Ok(Activity::Active(stats))
    }
}

/// Compute RMS, population variance, and peak amplitude in a single pass.
fn compute_stats(samples: &[AudioSample]) -> ActivityStats {
    let count = samples.len() as f64;
    let mut sum = 0.0f64;
    let mut sum_squares = 0.0f64;
    let mut peak = 0.0f64;

    for &s in samples {
        let value = s as f64;
        sum += value;
        sum_squares += value * value;
        peak = peak.max(value.abs());
    }

    let mean = sum / count;
    let mean_square = sum_squares / count;

    ActivityStats {
        rms: mean_square.sqrt(),
        variance: mean_square - mean * mean,
        peak_amplitude: peak,
    }
}
