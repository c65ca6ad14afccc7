/// Stream monitor service binary
///
/// Samples a live audio stream on a fixed interval and alerts a Discord
/// channel when the stream appears dead or silent.

use stream_monitor::{
    announcement, DiscordWebhook, FfmpegSampler, Monitor, MonitorConfig, MonitorSettings,
    Notifier, SamplerConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stream_monitor=info".parse().unwrap()),
        )
        .init();

    info!("Starting stream monitor");

    // Load configuration
    let settings = match MonitorSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let sampler_config = SamplerConfig {
        stream_url: settings.stream_url.clone(),
        sample_duration: settings.sample_duration,
        capture_timeout: settings.capture_timeout,
        ..Default::default()
    };

    let sampler = match FfmpegSampler::new(sampler_config) {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid sampler configuration: {}", e);
            std::process::exit(1);
        }
    };

    let notifier = match DiscordWebhook::new(
        settings.webhook_url.clone(),
        settings.staff_role_id.clone(),
    ) {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to create webhook client: {}", e);
            std::process::exit(1);
        }
    };

    let monitor_config = MonitorConfig {
        check_interval: settings.check_interval,
        alert_cooldown: settings.alert_cooldown,
        failure_alert_threshold: settings.failure_alert_threshold,
        staff_role_id: settings.staff_role_id.clone(),
    };

    let mut monitor = Monitor::new(monitor_config, sampler, notifier.clone());

    info!(
        "Checking stream every {:?}, alert after {} consecutive failures",
        settings.check_interval, settings.failure_alert_threshold
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Termination signal received");
        signal_token.cancel();
    });

    monitor.run(shutdown).await;

    // Best-effort exit announcement, sent after the loop has returned rather
    // than from signal-handling context.
    let goodbye = announcement("Stream monitor has exited");
    if let Err(e) = notifier.send(&goodbye).await {
        warn!("Failed to deliver exit announcement: {}", e);
    }

    info!("Stream monitor stopped");
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
