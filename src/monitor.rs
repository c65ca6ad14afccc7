/// Monitor loop module
///
/// The decision engine: on a fixed interval, capture a sample, classify it,
/// track the consecutive-failure streak, and raise a cooldown-gated alert
/// when the streak hits the configured threshold. Fully sequential; the only
/// blocking steps are the bounded capture and the interval sleep.

use crate::alert::{announcement, AlertGate};
use crate::classifier::{classify, Activity};
use crate::notifier::Notifier;
use crate::sampler::StreamSampler;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Monitor loop configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between checks
    pub check_interval: Duration,

    /// Minimum gap between delivered alerts
    pub alert_cooldown: Duration,

    /// Streak length that fires an alert (exact equality, then reset)
    pub failure_alert_threshold: u32,

    /// Role tagged in alert messages
    pub staff_role_id: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(300),
            alert_cooldown: Duration::from_secs(600),
            failure_alert_threshold: 2,
            staff_role_id: None,
        }
    }
}

/// Monitor counters, exposed for tests and diagnostics
#[derive(Debug, Clone, Copy)]
pub struct MonitorStats {
    pub checks_completed: u64,
    pub consecutive_failures: u32,
    pub alerts_triggered: u64,
}

/// Stream monitor state machine
///
/// Owns all mutable monitoring state; there is exactly one writer, the loop
/// itself, so no synchronization is needed.
pub struct Monitor<S, N> {
    config: MonitorConfig,
    sampler: S,
    notifier: N,
    gate: AlertGate,
    consecutive_failures: u32,
    checks_completed: u64,
    alerts_triggered: u64,
    last_failure_detail: Option<String>,
}

impl<S: StreamSampler, N: Notifier> Monitor<S, N> {
    pub fn new(config: MonitorConfig, sampler: S, notifier: N) -> Self {
        let gate = AlertGate::new(config.alert_cooldown, config.staff_role_id.clone());

        Self {
            config,
            sampler,
            notifier,
            gate,
            consecutive_failures: 0,
            checks_completed: 0,
            alerts_triggered: 0,
            last_failure_detail: None,
        }
    }

    /// Run the perpetual check loop until the token is cancelled.
    ///
    /// Announces startup unconditionally; the exit announcement is the
    /// runner's responsibility after this returns.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        let startup = announcement("Stream monitor is active");
        if let Err(e) = self.notifier.send(&startup).await {
            warn!("Failed to deliver startup announcement: {}", e);
        }

        loop {
            self.check_once().await;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping monitor loop");
                    break;
                }
                _ = sleep(self.config.check_interval) => {}
            }
        }
    }

    /// Execute one full check cycle: capture, classify, decide, maybe alert.
    pub async fn check_once(&mut self) {
        info!("Checking stream");

        match self.sampler.capture().await {
            Ok(wav_bytes) => match classify(&wav_bytes) {
                Ok(verdict) => self.apply_verdict(verdict).await,
                Err(e) => {
                    warn!("Could not decode audio sample: {}", e);
                    self.record_failure(Some(e.to_string()));
                }
            },
            Err(e) => {
                error!("Failed to retrieve audio sample: {}", e);
                let detail = e.detail().map(str::to_string).or_else(|| Some(e.to_string()));
                self.record_failure(detail);
            }
        }

        // Exact-equality trigger: one alert per failure episode, then the
        // streak restarts from zero.
        if self.consecutive_failures == self.config.failure_alert_threshold {
            let reason = format!(
                "{} consecutive stream checks failed",
                self.config.failure_alert_threshold
            );
            let detail = self.last_failure_detail.take();

            if self
                .gate
                .maybe_alert(&self.notifier, &reason, None, detail.as_deref())
                .await
            {
                self.alerts_triggered += 1;
            }

            self.consecutive_failures = 0;
        }

        self.checks_completed += 1;
    }

    async fn apply_verdict(&mut self, verdict: Activity) {
        match verdict {
            Activity::Active(_) => {
                info!("Stream is active and broadcasting");
                self.consecutive_failures = 0;
                self.last_failure_detail = None;
            }
            Activity::Silent(stats) => {
                warn!(
                    "Stream appears silent: rms={:.2}, variance={:.2}",
                    stats.rms, stats.variance
                );
                self.record_failure(None);

                if self
                    .gate
                    .maybe_alert(
                        &self.notifier,
                        "Stream is completely silent (zero amplitude)",
                        Some(&stats),
                        None,
                    )
                    .await
                {
                    self.alerts_triggered += 1;
                }
            }
            Activity::Empty => {
                warn!("Audio sample is empty");
                self.record_failure(None);

                if self
                    .gate
                    .maybe_alert(&self.notifier, "Audio sample is empty", None, None)
                    .await
                {
                    self.alerts_triggered += 1;
                }
            }
        }
    }

    fn record_failure(&mut self, detail: Option<String>) {
        self.consecutive_failures += 1;
        if detail.is_some() {
            self.last_failure_detail = detail;
        }
    }

    /// Current counters
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            checks_completed: self.checks_completed,
            consecutive_failures: self.consecutive_failures,
            alerts_triggered: self.alerts_triggered,
        }
    }
}
