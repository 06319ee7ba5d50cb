use tracing::info;

pub fn log_config(config: &crate::config::Config) {
    // Log basic configuration
    info!(
        "Config settings: poll_interval={}s, lag_tolerance={}, seconds_per_block={}, policy={}, display={:?}",
        config.poll_interval.as_secs(),
        config.lag_tolerance,
        config.seconds_per_block,
        config.policy,
        config.display
    );

    for node in &config.nodes {
        info!("Monitoring node {} at {}", node.name, node.endpoint);
    }

    // Log notification channel if set
    match &config.ntfy_topic {
        Some(topic) => info!("Sending synced notifications to {}/{}", config.ntfy_url, topic),
        None => info!("No NTFY_TOPIC set, synced notifications will only be logged"),
    }
}
