/// Alert gate module
///
/// Rate-limits outbound alerts with a cooldown window and builds the alert
/// message text. The gate timestamp is updated before delivery is attempted,
/// so a slow or failed delivery does not reopen the gate.

use crate::classifier::ActivityStats;
use crate::notifier::Notifier;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Maximum diagnostic characters embedded in an alert message
const DETAIL_MAX_CHARS: usize = 500;

/// Format a one-shot announcement (startup, shutdown, test ping).
///
/// Announcements are not alerts: they bypass the gate and carry no role ping.
pub fn announcement(text: &str) -> String {
    format!("\u{1F988} **{}**", text)
}

/// Cooldown-gated alert dispatcher
pub struct AlertGate {
    cooldown: Duration,
    staff_role_id: Option<String>,
    last_alert: Option<Instant>,
}

impl AlertGate {
    pub fn new(cooldown: Duration, staff_role_id: Option<String>) -> Self {
        Self {
            cooldown,
            staff_role_id,
            last_alert: None,
        }
    }

    /// Send an alert unless one was delivered within the cooldown window.
    ///
    /// Returns true when the gate opened and delivery was attempted. Delivery
    /// failure is logged and swallowed; the gate stays stamped either way.
    pub async fn maybe_alert(
        &mut self,
        notifier: &dyn Notifier,
        reason: &str,
        stats: Option<&ActivityStats>,
        detail: Option<&str>,
    ) -> bool {
        if let Some(last) = self.last_alert {
            if last.elapsed() < self.cooldown {
                info!("Suppressing alert due to cooldown: {}", reason);
                return false;
            }
        }

        self.last_alert = Some(Instant::now());

        let message = self.build_message(reason, stats, detail);
        if let Err(e) = notifier.send(&message).await {
            warn!("Alert delivery failed: {}", e);
        }

        true
    }

    fn build_message(
        &self,
        reason: &str,
        stats: Option<&ActivityStats>,
        detail: Option<&str>,
    ) -> String {
        let mut content = String::new();

        if let Some(role) = &self.staff_role_id {
            content.push_str(&format!("<@&{}> ", role));
        }

        content.push_str("\u{1F988} \u{1F6A8} **Stream issue detected**");
        content.push_str(&format!("\n**Reason**: {}", reason));

        if let Some(stats) = stats {
            content.push_str(&format!("\n**RMS**: {:.2}", stats.rms));
            content.push_str(&format!("\n**Variance**: {:.2}", stats.variance));
        }

        if let Some(detail) = detail {
            let trimmed: String = detail.trim().chars().take(DETAIL_MAX_CHARS).collect();
            if !trimmed.is_empty() {
                content.push_str(&format!("\n**FFmpeg Error**:\n```{}```", trimmed));
            }
        }

        content
    }
}
