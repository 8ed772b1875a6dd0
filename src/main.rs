use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use eth_outflow_monitor::blockchain::{BlockMonitor, NodeClient, TransactionFilter};
use eth_outflow_monitor::config::AppConfig;
use eth_outflow_monitor::notification::PushoverNotifier;

/// Watch an Ethereum address for outgoing transactions and push an alert
/// for each one.
#[derive(Parser, Debug)]
#[command(name = "monitor", version)]
struct Cli {
    /// Node provider API token
    #[arg(long = "infura-token")]
    infura_token: Option<String>,

    /// Address to monitor
    #[arg(long)]
    address: Option<String>,

    /// Pushover application token
    #[arg(long = "api-key")]
    api_key: Option<String>,

    /// Pushover user key
    #[arg(long = "user-key")]
    user_key: Option<String>,

    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        std::env::set_var("CONFIG_FILE", path);
    }

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(cli.infura_token, cli.address, cli.api_key, cli.user_key);
    if let Err(e) = config.validate() {
        eprintln!("configuration error: {e}");
        std::process::exit(1);
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .init();

    if let Err(e) = run(config).await {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> eth_outflow_monitor::Result<()> {
    info!("starting outflow monitor");

    let watched = config.monitor.watched_address()?;
    let source = NodeClient::connect(&config.chain).await?;
    let notifier = PushoverNotifier::new(&config.notification)?;
    let mut monitor = BlockMonitor::new(source, TransactionFilter::new(watched), notifier);

    let shutdown = monitor.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                shutdown.request();
            }
            Err(err) => error!("unable to listen for shutdown signal: {}", err),
        }
    });

    monitor.run().await?;
    info!("monitor stopped");
    Ok(())
}
