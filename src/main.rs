use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use selection_explainer::bridge::{MessageBridge, DEFAULT_BRIDGE_PORT};
use selection_explainer::commands::explain::{explain_once, run_chat_session};
use selection_explainer::commands::options::{set_options, show_options, OptionsUpdate};
use selection_explainer::settings::{default_store_path, LogLevel, Provider, SettingsStore};
use selection_explainer::{Dispatcher, Response};

#[derive(Parser, Debug)]
#[command(name = "selection-explainer", version, about)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level; RUST_LOG takes precedence when set
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the message bridge that page scripts connect to
    Serve {
        #[arg(long, default_value_t = DEFAULT_BRIDGE_PORT)]
        port: u16,
    },
    /// Explain a piece of text once and exit
    Explain { text: String },
    /// Explain a piece of text, then keep answering follow-up questions from stdin
    Chat { text: String },
    /// Show or change the stored configuration
    Options {
        #[command(subcommand)]
        action: OptionsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum OptionsCommand {
    Show,
    Set {
        #[arg(long, value_parser = parse_provider)]
        provider: Option<Provider>,
        #[arg(long)]
        gemini_key: Option<String>,
        #[arg(long)]
        openai_key: Option<String>,
        #[arg(long)]
        openai_model: Option<String>,
    },
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    Provider::parse(s).ok_or_else(|| format!("unknown provider '{}' (expected gemini or openai)", s))
}

fn init_logging(level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(level.into())
        .parse_default_env()
        .init();
}

fn print_response(response: Response) -> anyhow::Result<()> {
    match response {
        Response::Result(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Response::Error(message) => Err(anyhow!(message)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let path = match cli.settings {
        Some(path) => path,
        None => default_store_path().context("Could not determine a config directory")?,
    };
    let store = Arc::new(SettingsStore::open(path));

    match cli.command {
        Command::Serve { port } => {
            let dispatcher = Arc::new(Dispatcher::new(store)?);
            let addr = MessageBridge::new(dispatcher, port)
                .start()
                .await
                .map_err(|e| anyhow!(e))?;
            info!("Ready on ws://{}; press Ctrl+C to stop", addr);
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            info!("Shutting down");
        }
        Command::Explain { text } => {
            let dispatcher = Dispatcher::new(store)?;
            print_response(explain_once(&dispatcher, &text).await)?;
        }
        Command::Chat { text } => {
            let dispatcher = Dispatcher::new(store)?;
            run_chat_session(
                &dispatcher,
                &text,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
            .context("Terminal chat failed")?;
        }
        Command::Options { action } => match action {
            OptionsCommand::Show => println!("{}", show_options(&store).await),
            OptionsCommand::Set {
                provider,
                gemini_key,
                openai_key,
                openai_model,
            } => {
                let status = set_options(
                    &store,
                    OptionsUpdate {
                        provider,
                        gemini_key,
                        openai_key,
                        openai_model,
                    },
                )
                .await;
                if status.is_error {
                    return Err(anyhow!(status.text));
                }
                println!("{}", status.text);
            }
        },
    }

    Ok(())
}
