/// Configuration module
///
/// Environment-driven settings for the monitor service. Everything is
/// optional with defaults except the stream and webhook addresses; a missing
/// or unparsable value is fatal at startup and nowhere else.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Full environment configuration surface
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Address of the stream to monitor
    pub stream_url: String,

    /// Discord webhook endpoint
    pub webhook_url: String,

    /// Pause between checks
    pub check_interval: Duration,

    /// Audio captured per check
    pub sample_duration: Duration,

    /// Wall-clock bound on one capture
    pub capture_timeout: Duration,

    /// Minimum gap between delivered alerts
    pub alert_cooldown: Duration,

    /// Role tagged in alerts
    pub staff_role_id: Option<String>,

    /// Advisory loudness threshold; surfaced in configuration but not wired
    /// into the activity verdict (only zero peak amplitude gates activity)
    pub min_rms_threshold: f64,

    /// Advisory variance threshold; same status as min_rms_threshold
    pub min_variance_threshold: f64,

    /// Consecutive failed checks before the streak alert fires
    pub failure_alert_threshold: u32,
}

impl MonitorSettings {
    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = Self {
            stream_url: require("STREAM_URL")?,
            webhook_url: require("DISCORD_WEBHOOK_URL")?,
            check_interval: Duration::from_secs(parse_or("CHECK_INTERVAL", 300)?),
            sample_duration: Duration::from_secs(parse_or("SAMPLE_DURATION", 10)?),
            capture_timeout: Duration::from_secs(parse_or("FFMPEG_TIMEOUT", 15)?),
            alert_cooldown: Duration::from_secs(parse_or("ALERT_COOLDOWN", 600)?),
            staff_role_id: optional("STAFF_ROLE_ID"),
            min_rms_threshold: parse_or("MIN_RMS_THRESHOLD", 500.0)?,
            min_variance_threshold: parse_or("MIN_VARIANCE_THRESHOLD", 1000.0)?,
            failure_alert_threshold: parse_or("FAILURE_ALERT_THRESHOLD", 2)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_duration.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SAMPLE_DURATION",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.capture_timeout <= self.sample_duration {
            return Err(ConfigError::Invalid {
                var: "FFMPEG_TIMEOUT",
                reason: "must be strictly greater than SAMPLE_DURATION".to_string(),
            });
        }

        if self.failure_alert_threshold == 0 {
            return Err(ConfigError::Invalid {
                var: "FAILURE_ALERT_THRESHOLD",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
