use anyhow::Result;
use clap::{Parser, Subcommand};
use shopchat::commands;
use shopchat::config::Config;
use shopchat::render::ProductStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shopchat")]
#[command(version)]
#[command(about = "Chat with a product assistant from the terminal", long_about = None)]
struct Cli {
    /// Backend base url (overrides config and SHOPCHAT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// How product links are labelled: `url` or `title`
    #[arg(long, global = true)]
    strategy: Option<ProductStrategy>,

    /// Config file to use instead of ~/.shopchat/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Ask { message: Vec<String> },
    /// Show the effective configuration, writing defaults if missing
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    shopchat::logging::init();
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(strategy) = cli.strategy {
        config.product_strategy = strategy;
    }

    match cli.command {
        None | Some(Commands::Chat) => commands::run_chat(&config).await,
        Some(Commands::Ask { message }) => commands::ask(&config, &message.join(" ")).await,
        Some(Commands::Config) => commands::show_config(&config, &config_path),
    }
}
