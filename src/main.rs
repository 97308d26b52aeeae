//! fourup - Connect Four session server over WebSockets

use anyhow::Result;
use clap::Parser;
use fourup::config::Config;
use fourup::server::ServerListener;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "fourup")]
#[command(about = "A real-time Connect Four session server over WebSockets")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Bind address override
    #[arg(short, long)]
    bind: Option<String>,

    /// Port override
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let listener = ServerListener::bind(config.listen_addr()?).await?;

    // Termination signal stops accepting; live games finish on their own.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Termination signal received");
            let _ = shutdown_tx.send(()).await;
        }
    });

    listener.run(shutdown_rx).await
}
