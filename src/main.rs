use clap::Parser as ClapParser;
use log::{error, info, warn};
use std::sync::Arc;

use tx_parser::api::ApiServer;
use tx_parser::blockchain::{BlockMonitor, BlockMonitorConfig, Parser, RpcClient};
use tx_parser::config::{AppConfig, StorageBackend};
use tx_parser::logging::init_logging;
use tx_parser::notification::{ConsoleNotifier, NotificationService, WebhookNotifier};
use tx_parser::storage::{MemoryStorage, SqliteStorage, Storage};

#[derive(ClapParser)]
#[command(name = "tx-parser")]
#[command(about = "Watches an EVM node for transactions touching subscribed addresses")]
#[command(version)]
struct Args {
    /// Configuration file path (defaults to CONFIG_FILE or ./config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Node JSON-RPC endpoint
    #[arg(long)]
    rpc_endpoint: Option<String>,

    /// Query API port
    #[arg(long)]
    port: Option<u16>,

    /// Address to watch from startup; repeatable
    #[arg(long = "subscribe")]
    subscribe: Vec<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", AppConfig::generate_sample_config()?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => AppConfig::load_with_path(path)?,
        None => AppConfig::load()?,
    };

    if let Some(endpoint) = args.rpc_endpoint {
        config.rpc.endpoint = endpoint;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    config.subscriptions.addresses.extend(args.subscribe);
    config.validate()?;

    init_logging(&config.logging)?;
    info!("Starting tx-parser against {}", config.rpc.endpoint);

    let storage: Arc<dyn Storage> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::Sqlite => match &config.storage.path {
            Some(path) => Arc::new(SqliteStorage::new(path)?),
            None => Arc::new(SqliteStorage::new_in_memory()?),
        },
    };

    let parser = Arc::new(Parser::new(storage));
    for address in &config.subscriptions.addresses {
        if parser.subscribe(address)? {
            info!("Subscribed to {}", address);
        } else {
            warn!("Ignoring malformed address {}", address);
        }
    }

    let mut notifier = NotificationService::new();
    if config.notifications.console {
        notifier.add_sink(Arc::new(ConsoleNotifier::new()));
    }
    if let Some(url) = &config.notifications.webhook_url {
        notifier.add_sink(Arc::new(WebhookNotifier::new(url)?));
    }

    let rpc_client = Arc::new(RpcClient::with_settings(
        config.rpc.endpoint.clone(),
        config.rpc.network_settings(),
    )?);

    let monitor = Arc::new(BlockMonitor::new(
        rpc_client,
        parser.clone(),
        notifier,
        Some(BlockMonitorConfig {
            poll_interval: config.monitor.poll_interval(),
        }),
    ));

    let monitor_task = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.start().await })
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let api_task = if config.api.enabled {
        let server = ApiServer::new(parser.clone(), config.api.server_address());
        let mut shutdown_rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            server
                .start_with_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    monitor.shutdown();
    let _ = shutdown_tx.send(true);

    match monitor_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Block monitor stopped with error: {}", e),
        Err(e) => error!("Block monitor task failed: {}", e),
    }

    if let Some(task) = api_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("API server stopped with error: {}", e),
            Err(e) => error!("API server task failed: {}", e),
        }
    }

    info!("tx-parser stopped");
    Ok(())
}
