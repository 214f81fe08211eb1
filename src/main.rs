use anyhow::Context;
use clap::Parser;

use pocket_mirror::app::App;
use pocket_mirror::cli::{Cli, Command};
use pocket_mirror::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // RUST_LOG wins over --log-level, which wins over the config file
    let level = cli
        .log_level
        .map(|l| l.directive().to_string())
        .unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut app = App::new(config, config_path);

    match cli.command {
        Command::Authorize => {
            app.authorize().await.context("authorization failed")?;
        }
        Command::Sync => {
            let report = app.sync().await?;
            println!("{report}");
        }
    }

    Ok(())
}
