/// Stream monitor library
///
/// Periodically samples a live audio stream, classifies whether it is
/// audibly broadcasting, and raises cooldown-gated Discord alerts when it
/// appears dead or silent.

pub mod alert;
pub mod classifier;
pub mod config;
pub mod monitor;
pub mod notifier;
pub mod sampler;

// Re-export main types
pub use alert::{announcement, AlertGate};
pub use classifier::{classify, Activity, ActivityStats, AudioSample, ClassifierError, SAMPLE_RATE};
pub use config::{ConfigError, MonitorSettings};
pub use monitor::{Monitor, MonitorConfig, MonitorStats};
pub use notifier::{DiscordWebhook, Notifier, NotifyError};
pub use sampler::{CaptureError, FfmpegSampler, SamplerConfig, StreamSampler};
