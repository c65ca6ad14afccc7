/// Stream sampler module
///
/// Captures a short window of a live audio stream as WAV bytes by invoking
/// ffmpeg, with a hard wall-clock timeout. Every failure mode collapses into
/// a single error type; retry policy lives in the monitor loop, not here.

use crate::classifier::SAMPLE_RATE;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::{debug, error};

/// Default capture program
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Maximum stderr bytes kept for diagnostics
const STDERR_KEEP_CHARS: usize = 2000;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Invalid sampler configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn capture process: {0}")]
    Spawn(String),

    #[error("Capture process exited with status {code}")]
    ProcessFailed { code: i32, stderr: String },

    #[error("Capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("Capture produced no audio data")]
    EmptyOutput,
}

impl CaptureError {
    /// Diagnostic text suitable for embedding in an alert message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            CaptureError::ProcessFailed { stderr, .. } if !stderr.trim().is_empty() => {
                Some(stderr)
            }
            _ => None,
        }
    }
}

/// Sampler configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Address of the stream to sample
    pub stream_url: String,

    /// How much audio to capture per check
    pub sample_duration: Duration,

    /// Wall-clock bound on the whole capture, must exceed sample_duration
    pub capture_timeout: Duration,

    /// Capture executable (overridable in tests)
    pub program: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stream_url: String::new(), // Must be provided by user
            sample_duration: Duration::from_secs(10),
            capture_timeout: Duration::from_secs(15),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl SamplerConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.stream_url.is_empty() {
            return Err(CaptureError::InvalidConfig(
                "stream_url must not be empty".to_string(),
            ));
        }

        if self.sample_duration.is_zero() {
            return Err(CaptureError::InvalidConfig(
                "sample_duration must be greater than zero".to_string(),
            ));
        }

        if self.capture_timeout <= self.sample_duration {
            return Err(CaptureError::InvalidConfig(
                "capture_timeout must be strictly greater than sample_duration".to_string(),
            ));
        }

        Ok(())
    }
}

/// Source of raw audio snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamSampler: Send + Sync {
    /// Capture one sample window, returning WAV bytes.
    async fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

/// ffmpeg-backed sampler
///
/// Requests mono 44.1kHz PCM written to stdout rather than a file, so no
/// temporary resources persist across checks.
pub struct FfmpegSampler {
    config: SamplerConfig,
}

impl FfmpegSampler {
    /// Create a new sampler
    pub fn new(config: SamplerConfig) -> Result<Self, CaptureError> {
        config.validate()?;
        Ok(Self { config })
    }

    fn command_args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-t".to_string(),
            self.config.sample_duration.as_secs().to_string(),
            "-i".to_string(),
            self.config.stream_url.clone(),
            "-f".to_string(),
            "wav".to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-ar".to_string(),
            SAMPLE_RATE.to_string(),
            "pipe:1".to_string(),
        ]
    }
}

#[async_trait]
impl StreamSampler for FfmpegSampler {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let args = self.command_args();

        // The stream URL may carry credentials, so the full command line is
        // debug-level only.
        debug!("Running capture command: {} {}", self.config.program, args.join(" "));

        let mut cmd = TokioCommand::new(&self.config.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.config.capture_timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                error!("Failed to spawn capture process: {}", e);
                CaptureError::Spawn(e.to_string())
            })?,
            Err(_) => {
                error!("Capture timed out after {:?}", self.config.capture_timeout);
                return Err(CaptureError::Timeout(self.config.capture_timeout));
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        debug!("Capture process exited with code {}", exit_code);
        debug!("Capture stdout length: {} bytes", output.stdout.len());

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.is_empty() {
            let kept: String = stderr.chars().take(STDERR_KEEP_CHARS).collect();
            debug!("Capture stderr: {}", kept);
        }

        if !output.status.success() {
            return Err(CaptureError::ProcessFailed {
                code: exit_code,
                stderr,
            });
        }

        if output.stdout.is_empty() {
            return Err(CaptureError::EmptyOutput);
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(program: &str) -> SamplerConfig {
        SamplerConfig {
            stream_url: "http://stream.test/live".to_string(),
            sample_duration: Duration::from_secs(1),
            capture_timeout: Duration::from_secs(5),
            program: program.to_string(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = SamplerConfig::default();
        assert_eq!(config.program, DEFAULT_PROGRAM);
        assert!(config.capture_timeout > config.sample_duration);
    }

    #[test]
    fn test_config_validation() {
        let mut config = test_config(DEFAULT_PROGRAM);
        assert!(config.validate().is_ok());

        config.stream_url = String::new();
        assert!(config.validate().is_err());

        config = test_config(DEFAULT_PROGRAM);
        config.sample_duration = Duration::ZERO;
        assert!(config.validate().is_err());

        // Timeout must strictly exceed the sample duration
        config = test_config(DEFAULT_PROGRAM);
        config.capture_timeout = config.sample_duration;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_args_request_mono_wav() {
        let sampler = FfmpegSampler::new(test_config(DEFAULT_PROGRAM)).unwrap();
        let args = sampler.command_args();

        assert!(args.contains(&"wav".to_string()));
        assert!(args.contains(&SAMPLE_RATE.to_string()));
        assert!(args.contains(&"pipe:1".to_string()));
        assert_eq!(args.last().unwrap(), "pipe:1");
    }

    #[tokio::test]
    async fn test_capture_empty_output_is_failure() {
        // `true` exits 0 without writing anything
        let sampler = FfmpegSampler::new(test_config("true")).unwrap();

        let result = sampler.capture().await;
        assert!(matches!(result, Err(CaptureError::EmptyOutput)));
    }

    #[tokio::test]
    async fn test_capture_nonzero_exit_is_failure() {
        let sampler = FfmpegSampler::new(test_config("false")).unwrap();

        match sampler.capture().await {
            Err(CaptureError::ProcessFailed { code, .. }) => assert_ne!(code, 0),
            other => panic!("Expected ProcessFailed, got {:?}", other.map(|b| b.len())),
        }
    }

    #[tokio::test]
    async fn test_capture_returns_process_stdout() {
        // `echo` prints the argument list, standing in for ffmpeg's pipe output
        let sampler = FfmpegSampler::new(test_config("echo")).unwrap();

        let bytes = sampler.capture().await.unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_capture_missing_program_is_spawn_failure() {
        let sampler =
            FfmpegSampler::new(test_config("definitely-not-a-real-binary-xyz")).unwrap();

        let result = sampler.capture().await;
        assert!(matches!(result, Err(CaptureError::Spawn(_))));
    }

    #[test]
    fn test_detail_only_for_process_failures() {
        let failed = CaptureError::ProcessFailed {
            code: 1,
            stderr: "connection refused".to_string(),
        };
        assert_eq!(failed.detail(), Some("connection refused"));

        assert!(CaptureError::EmptyOutput.detail().is_none());
        assert!(CaptureError::Timeout(Duration::from_secs(15)).detail().is_none());
    }
}
