//! Neuromem HTTP Server
//!
//! ## Usage
//!
//! ```bash
//! # Start with default settings (port 12000)
//! neuromem-server
//!
//! # Custom port
//! neuromem-server --port 8080
//!
//! # With metrics enabled
//! neuromem-server --metrics --metrics-port 9090
//!
//! # From a configuration file
//! neuromem-server --config neuromem.toml
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use neuromem::DynNeuralMemory;
use neuromem_server::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "neuromem-server")]
#[command(author = "Daemoniorum LLC")]
#[command(version)]
#[command(about = "Neuromem neural memory server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable Prometheus metrics
    #[arg(long)]
    metrics: bool,

    /// Metrics port
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

impl Args {
    /// Load the configuration file (if any) and apply command-line overrides
    fn into_config(self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.metrics {
            config.metrics_enabled = true;
        }
        if let Some(port) = self.metrics_port {
            config.metrics_port = port;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config()?;

    // Initialize logging
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Initialize metrics if enabled
    if config.metrics_enabled {
        let metrics_addr: SocketAddr = format!("0.0.0.0:{}", config.metrics_port).parse()?;
        info!("Starting Prometheus metrics server on {}", metrics_addr);

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
    }

    let memory = DynNeuralMemory::<i64>::from_config_dyn(&config.memory)?;
    let consumer = memory.spawn_consumer()?;

    let addr: SocketAddr = config.bind_addr().parse()?;

    info!("Starting neuromem server...");
    info!("  Address:     {}", addr);
    info!("  Codec:       {:?}", config.memory.codec_kind);
    info!(
        "  Dimensions:  {} -> {}",
        config.memory.codec.input_size, config.memory.codec.encoding_size
    );
    info!("  Capacity:    {}", config.memory.cache.capacity);
    info!("  Queue:       {}", config.memory.queue.capacity);
    info!("  Train steps: {}", config.memory.cache.train_steps);
    info!(
        "  Metrics:     {}",
        if config.metrics_enabled {
            format!("port {}", config.metrics_port)
        } else {
            "disabled".to_string()
        }
    );

    let listener = TcpListener::bind(addr).await?;
    neuromem_server::serve(listener, memory.clone(), shutdown_signal()).await?;

    info!("Draining queued stores...");
    let drain_timeout = Duration::from_secs(config.drain_timeout_secs);
    if let Err(e) = memory.drain_timeout(drain_timeout).await {
        warn!("Shutdown without full drain: {}", e);
    }
    consumer.shutdown().await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
