//! fourup-web - static file server for the client UI
//!
//! Runs next to the game server on its own port; knows nothing about
//! sessions or games.

use anyhow::Result;
use clap::Parser;
use fourup::config::Config;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Parser)]
#[command(name = "fourup-web")]
#[command(about = "Static file server for the fourup client UI")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Directory to serve
    #[arg(short, long)]
    root: Option<std::path::PathBuf>,

    /// Port override
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
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
    if let Some(root) = cli.root {
        config.web.root = root;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    let app = axum::Router::new()
        .fallback_service(ServeDir::new(&config.web.root))
        .layer(TraceLayer::new_for_http());

    let addr = config.web_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Serving {} on {}",
        config.web.root.display(),
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
