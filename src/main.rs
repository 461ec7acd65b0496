use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use watched_feed::config::Config;
use watched_feed::server::{self, AppState};

/// Get the config directory path (~/.config/watched-feed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("watched-feed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "watched-feed",
    about = "Serve the watched-galleries listing as an Atom feed"
)]
struct Args {
    /// Config file (default: ~/.config/watched-feed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,

    /// Fetch the listing once, print the feed to stdout and exit
    #[arg(long, conflicts_with = "input")]
    once: bool,

    /// Render a saved listing page instead of fetching, print and exit
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let state = AppState::from_config(&config).context("Invalid configuration")?;

    if let Some(input) = &args.input {
        let html = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let records = state
            .pipeline()
            .parse(&html)
            .with_context(|| format!("Failed to extract galleries from {}", input.display()))?;
        println!("{}", state.builder().build(&records)?);
        return Ok(());
    }

    if args.once {
        println!("{}", state.render().await?);
        return Ok(());
    }

    if config.cookies.is_empty() {
        tracing::warn!(
            path = %config_path.display(),
            "No [cookies] configured; the site will not serve the watched listing"
        );
    }

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    server::serve(listener, Arc::new(state)).await?;
    Ok(())
}
