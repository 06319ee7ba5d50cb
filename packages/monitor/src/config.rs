use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use reqwest::Url;

use crate::display::DisplayMode;
use crate::models::NodeConfig;
use crate::notify::DEFAULT_NTFY_URL;
use crate::rpc::{DEFAULT_HEALTH_METHOD, DEFAULT_SYNC_METHOD};
use crate::sync::SyncPolicy;

/// Command line arguments; every flag can also come from the environment or `.env`
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sync-monitor",
    about = "Watch Substrate nodes sync and get notified when they catch up"
)]
pub struct Args {
    /// JSON file mapping node names to RPC endpoints
    #[arg(long, env = "NODES_FILE", default_value = "config/nodes.json")]
    pub nodes_file: PathBuf,

    /// Inline node list (`name=url,name2=url2`), takes precedence over the file
    #[arg(long, env = "NODES")]
    pub nodes: Option<String>,

    /// Seconds between poll cycles
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 30)]
    pub poll_interval: u64,

    /// Blocks a node may trail its highest block and still count as synced
    #[arg(long, env = "LAG_TOLERANCE", default_value_t = 1)]
    pub lag_tolerance: u64,

    /// Chain block time, used to express the remaining gap as block age
    #[arg(long, env = "SECONDS_PER_BLOCK", default_value_t = 6.0)]
    pub seconds_per_block: f64,

    /// Rule used to decide when a node is synced
    #[arg(long, env = "SYNC_POLICY", value_enum, default_value_t = SyncPolicy::BlockLag)]
    pub policy: SyncPolicy,

    /// Query node health (peers) even when the policy does not need it
    #[arg(long, env = "FETCH_HEALTH")]
    pub fetch_health: bool,

    /// ntfy topic to publish synced notifications to; log only when unset
    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,

    /// ntfy server
    #[arg(long, env = "NTFY_URL", default_value = DEFAULT_NTFY_URL)]
    pub ntfy_url: String,

    /// RPC request timeout in seconds
    #[arg(long, env = "RPC_TIMEOUT", default_value_t = 5)]
    pub rpc_timeout: u64,

    /// Notification request timeout in seconds
    #[arg(long, env = "NOTIFY_TIMEOUT", default_value_t = 5)]
    pub notify_timeout: u64,

    /// RPC method returning currentBlock/highestBlock
    #[arg(long, env = "SYNC_METHOD", default_value = DEFAULT_SYNC_METHOD)]
    pub sync_method: String,

    /// RPC method returning isSyncing/peers
    #[arg(long, env = "HEALTH_METHOD", default_value = DEFAULT_HEALTH_METHOD)]
    pub health_method: String,

    /// Output mode
    #[arg(long, env = "DISPLAY_MODE", value_enum, default_value_t = DisplayMode::Log)]
    pub display: DisplayMode,

    /// Seconds between table redraws
    #[arg(long, env = "REFRESH_INTERVAL", default_value_t = 5)]
    pub refresh_interval: u64,

    /// Log destination while the table view owns the terminal
    #[arg(long, env = "LOG_FILE", default_value = "sync-monitor.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub nodes: Vec<NodeConfig>,
    pub poll_interval: Duration,
    pub lag_tolerance: u64,
    pub seconds_per_block: f64,
    pub policy: SyncPolicy,
    pub fetch_health: bool,
    pub ntfy_topic: Option<String>,
    pub ntfy_url: String,
    pub rpc_timeout: Duration,
    pub notify_timeout: Duration,
    pub sync_method: String,
    pub health_method: String,
    pub display: DisplayMode,
    pub refresh_interval: Duration,
    pub log_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        let _ = dotenv::dotenv();

        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        ensure!(args.poll_interval > 0, "POLL_INTERVAL must be greater than zero");
        ensure!(args.refresh_interval > 0, "REFRESH_INTERVAL must be greater than zero");
        ensure!(args.rpc_timeout > 0, "RPC_TIMEOUT must be greater than zero");
        ensure!(args.notify_timeout > 0, "NOTIFY_TIMEOUT must be greater than zero");
        ensure!(
            args.seconds_per_block.is_finite() && args.seconds_per_block > 0.0,
            "SECONDS_PER_BLOCK must be a positive number"
        );
        ensure!(
            args.display != DisplayMode::Table || args.refresh_interval < args.poll_interval,
            "REFRESH_INTERVAL ({}s) must be shorter than POLL_INTERVAL ({}s) in table mode",
            args.refresh_interval,
            args.poll_interval
        );

        let nodes = match args.nodes.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(inline) => parse_inline_nodes(inline)?,
            None => load_nodes_file(&args.nodes_file)?,
        };
        validate_nodes(&nodes)?;

        Ok(Config {
            nodes,
            poll_interval: Duration::from_secs(args.poll_interval),
            lag_tolerance: args.lag_tolerance,
            seconds_per_block: args.seconds_per_block,
            policy: args.policy,
            fetch_health: args.fetch_health,
            ntfy_topic: args.ntfy_topic.filter(|topic| !topic.trim().is_empty()),
            ntfy_url: args.ntfy_url,
            rpc_timeout: Duration::from_secs(args.rpc_timeout),
            notify_timeout: Duration::from_secs(args.notify_timeout),
            sync_method: args.sync_method,
            health_method: args.health_method,
            display: args.display,
            refresh_interval: Duration::from_secs(args.refresh_interval),
            log_file: args.log_file,
        })
    }
}

/// Parse `name=url` pairs separated by commas
fn parse_inline_nodes(inline: &str) -> Result<Vec<NodeConfig>> {
    inline
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, endpoint) = pair
                .split_once('=')
                .with_context(|| format!("Node entry '{}' must look like name=url", pair))?;
            Ok(NodeConfig::new(name.trim(), endpoint.trim()))
        })
        .collect()
}

/// Read a `{ "name": "url" }` JSON object
fn load_nodes_file(path: &Path) -> Result<Vec<NodeConfig>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read node registry {}", path.display()))?;
    parse_nodes_json(&raw).with_context(|| format!("Invalid node registry {}", path.display()))
}

fn parse_nodes_json(raw: &str) -> Result<Vec<NodeConfig>> {
    let registry: BTreeMap<String, String> = serde_json::from_str(raw)?;
    Ok(registry
        .into_iter()
        .map(|(name, endpoint)| NodeConfig::new(name, endpoint))
        .collect())
}

fn validate_nodes(nodes: &[NodeConfig]) -> Result<()> {
    if nodes.is_empty() {
        bail!("No nodes configured, set NODES or NODES_FILE");
    }

    let mut seen = HashSet::new();
    for node in nodes {
        ensure!(!node.name.is_empty(), "Node name must not be empty");
        ensure!(seen.insert(node.name.as_str()), "Duplicate node name '{}'", node.name);
        Url::parse(&node.endpoint)
            .with_context(|| format!("Node '{}' has an invalid endpoint '{}'", node.name, node.endpoint))?;
    }

    Ok(())
}
