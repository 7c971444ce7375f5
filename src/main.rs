use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tread::app::AppContext;
use tread::cli::{commands, Cli};
use tread::config::{Config, LoadStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;

    if cli.update {
        // Initialize tracing
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter())
            .init();

        let config = Config::read(&config_path)?;
        let ctx = AppContext::new(config)?;
        let summary = commands::update_feeds(&ctx).await?;
        if summary.failed > 0 {
            anyhow::bail!(
                "{} of {} feeds could not be refreshed",
                summary.failed,
                summary.failed + summary.refreshed
            );
        }
        return Ok(());
    }

    // The terminal belongs to the reader, so logs go to a file
    init_file_logging()?;

    let (config, status) = Config::load_or_create(&config_path)?;
    let mut notices = Vec::new();
    if status == LoadStatus::CreatedSample {
        notices.push(format!(
            "No configuration file found at {}. A sample configuration file has been provided.",
            config_path.display()
        ));
    }

    let ctx = AppContext::new(config)?;
    tread::tui::run(&ctx, notices).await?;

    Ok(())
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn init_file_logging() -> anyhow::Result<()> {
    let dir = dirs::data_dir()
        .context("Could not find data directory")?
        .join("tread");
    fs::create_dir_all(&dir)?;

    let path = dir.join("tread.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(filter())
        .init();

    Ok(())
}
