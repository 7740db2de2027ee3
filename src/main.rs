use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hypr::config::Config;
use hypr::site::Site;
use tracing::info;

/// Serves a blog of flat-file Markdown articles.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Project file, or a directory to search (with its ancestors) for
    /// `hypr.yaml`.
    #[arg(short, long, env = "HYPR_CONFIG", default_value = ".")]
    config: PathBuf,

    /// Address to listen on.
    #[arg(short, long, env = "HYPR_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    hypr::logging::init(&args.log_level)?;

    let config = Config::load(&args.config)?;
    info!(
        site_url = %config.site_url,
        content = %config.content_directory.display(),
        templates = %config.templates_directory.display(),
        "loaded configuration"
    );

    let site = Arc::new(Site::new(config));
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Binding {}", args.listen))?;
    info!(addr = %args.listen, "listening");

    hypr::server::serve(listener, site).await?;
    info!("shut down");
    Ok(())
}
