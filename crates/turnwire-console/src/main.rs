mod adapter;
mod bot;
mod traced;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use turnwire_context::run_turn;
use turnwire_core::TurnwireConfig;

use crate::adapter::ConsoleAdapter;
use crate::bot::EchoBot;

#[derive(Parser)]
#[command(name = "turnwire-console", version, about = "Talk to an echo bot in the terminal")]
struct Cli {
    /// Config file (default: $TURNWIRE_CONFIG, then ~/.turnwire/turnwire.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Process a single message and exit
    #[arg(long)]
    once: Option<String>,

    /// Upper-case every reply
    #[arg(long)]
    shout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // load config: --config > TURNWIRE_CONFIG env > ~/.turnwire/turnwire.toml
    let config_path = cli.config.or_else(|| std::env::var("TURNWIRE_CONFIG").ok());
    let loaded = TurnwireConfig::load(config_path.as_deref());
    let config = loaded.as_ref().ok().cloned().unwrap_or_default();

    // stdout belongs to the conversation; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = &loaded {
        warn!("Config load failed ({}), using defaults", e);
    }

    let adapter = Arc::new(ConsoleAdapter::new(config.console.clone()));
    let bot = EchoBot::new(cli.shout);

    if let Some(text) = cli.once {
        run_turn(adapter.clone(), adapter.inbound(&text), &bot).await?;
        return Ok(());
    }

    info!(
        bot = %config.console.bot_name,
        conversation = %config.console.conversation_id,
        "console bot ready; type 'quit' to exit"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        adapter.prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        // run_turn logs the failure; keep the session alive for the next line
        let _ = run_turn(adapter.clone(), adapter.inbound(line), &bot).await;
    }

    info!("console bot stopped");
    Ok(())
}
