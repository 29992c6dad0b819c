use crate::client::HttpChatClient;
use crate::config::Config;
use crate::controller::{ChatController, SubmitOutcome};
use crate::render::Renderer;
use crate::ui::{SlashCommand, TerminalView, get_help_text, parse_slash_command};
use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn build_controller(config: &Config) -> Result<(ChatController, Arc<TerminalView>)> {
    let client = HttpChatClient::new(&config.endpoint, config.request_timeout())
        .context("Failed to create HTTP client")?;
    tracing::info!(url = client.chat_url(), strategy = config.product_strategy.name(), "chat client ready");

    let view = Arc::new(TerminalView::new(config.ui.show_timestamps));
    let controller = ChatController::new(
        Box::new(client),
        Renderer::new(config.product_strategy),
        view.clone(),
    );
    Ok((controller, view))
}

/// Interactive chat loop on stdin
pub async fn run_chat(config: &Config) -> Result<()> {
    let (controller, view) = build_controller(config)?;

    println!("{}", "🛍️  Shop assistant".bold());
    println!("{}", format!("Connected to {}", config.endpoint).dark_grey());
    println!("{}", "Type a question, /help for commands, /bye to leave.".dark_grey());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".blue().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read user input")? else {
            break;
        };

        if let Some(command) = parse_slash_command(&line) {
            match command {
                SlashCommand::History => view.print_history(&controller.history()),
                SlashCommand::Strategy => {
                    let strategy = controller.renderer().strategy();
                    println!("{}: {}", strategy.name(), strategy.description());
                }
                SlashCommand::Help => println!("{}", get_help_text()),
                SlashCommand::Bye => break,
            }
            continue;
        }

        controller.submit(&line).await;
    }

    println!("👋 Bye!");
    Ok(())
}

/// Send a single message and print the reply.
pub async fn ask(config: &Config, message: &str) -> Result<()> {
    let (controller, _view) = build_controller(config)?;

    match controller.submit(message).await {
        SubmitOutcome::Replied(_) => Ok(()),
        SubmitOutcome::Ignored => bail!("Message cannot be empty"),
        SubmitOutcome::Busy => bail!("A request is already in progress"),
        SubmitOutcome::Failed(reason) => bail!("Chat request failed: {reason}"),
        SubmitOutcome::RenderFailed(reason) => bail!("Could not display reply: {reason}"),
    }
}

/// Write the default config if there is none, then print the effective config.
pub fn show_config(config: &Config, path: &Path) -> Result<()> {
    if !path.exists() {
        Config::default().save_to(path)?;
        println!("📝 Wrote default config to {}", path.display());
    } else {
        println!("📍 Config file: {}", path.display());
    }
    println!();

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{content}");
    Ok(())
}
