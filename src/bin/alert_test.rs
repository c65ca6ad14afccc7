/// Alert delivery test binary
///
/// Sends one test alert through a fresh gate and exits. Used to verify the
/// webhook endpoint and staff role mention are wired correctly before
/// leaving the monitor unattended.

use anyhow::Context;
use std::time::Duration;
use stream_monitor::{AlertGate, DiscordWebhook, MonitorSettings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stream_monitor=info".parse().unwrap()),
        )
        .init();

    let settings = MonitorSettings::from_env().context("loading configuration")?;

    let notifier = DiscordWebhook::new(
        settings.webhook_url.clone(),
        settings.staff_role_id.clone(),
    )
    .context("building webhook client")?;

    let mut gate = AlertGate::new(Duration::ZERO, settings.staff_role_id.clone());
    gate.maybe_alert(
        &notifier,
        "testing stream monitor alerting; please ignore",
        None,
        None,
    )
    .await;

    info!("Test alert dispatched");
    Ok(())
}
