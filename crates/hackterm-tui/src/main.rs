use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hackterm_core::{
    segment, ChatMessage, Config, Conversation, Endpoint, HttpTransport, SegmentKind, TransportError,
};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "hackterm")]
#[command(version, about = "Hacker terminal for chatting with and analyzing code through an AI backend")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "HACKTERM_URL", global = true)]
    url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message to the chat endpoint and print the reply
    Chat {
        /// Message text
        message: String,
    },
    /// Send code or an error message to the analyze endpoint
    Analyze {
        /// Code or error text
        message: String,
    },
    /// Check whether the backend is reachable
    Health,
    /// Show or update the saved configuration
    Config {
        /// Backend base URL to save
        #[arg(long)]
        base_url: Option<String>,
        /// Endpoint used by Enter in the terminal (chat or analyze)
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so it logs to a file instead of stderr
    init_logging(cli.verbose, cli.command.is_none())?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        Config::new()
    });
    let base_url = cli.url.clone().unwrap_or_else(|| config.base_url().to_string());
    let transport = HttpTransport::new(&base_url);

    match cli.command {
        None => run_tui(transport, config.default_endpoint()).await?,
        Some(Commands::Chat { message }) => send_once(&transport, Endpoint::Chat, message).await?,
        Some(Commands::Analyze { message }) => send_once(&transport, Endpoint::Analyze, message).await?,
        Some(Commands::Health) => check_health(&transport).await,
        Some(Commands::Config { base_url, endpoint }) => update_config(config, base_url, endpoint)?,
    }

    Ok(())
}

fn init_logging(verbose: bool, to_file: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let writer = if to_file {
        match dirs::data_local_dir() {
            Some(dir) => {
                let log_dir = dir.join("hackterm");
                std::fs::create_dir_all(&log_dir)?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(log_dir.join("hackterm.log"))?;
                BoxMakeWriter::new(Mutex::new(file))
            }
            None => BoxMakeWriter::new(std::io::sink),
        }
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_ansi(!to_file).with_writer(writer))
        .init();
    Ok(())
}

async fn run_tui(transport: HttpTransport, default_endpoint: Endpoint) -> Result<()> {
    tracing::info!(base_url = transport.base_url(), "starting terminal");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = event_loop(&mut terminal, transport, default_endpoint).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, transport: HttpTransport, default_endpoint: Endpoint) -> Result<()> {
    let mut events = EventHandler::new();
    let mut app = App::new(transport, default_endpoint, events.sender());
    app.probe_health();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event)?,
            None => break,
        }
    }

    Ok(())
}

async fn send_once(transport: &HttpTransport, endpoint: Endpoint, message: String) -> Result<()> {
    let reply = exchange(transport, endpoint, message).await?;
    print_segmented(&reply.content);
    Ok(())
}

/// Run a single-message conversation and return the assistant's answer.
async fn exchange(transport: &HttpTransport, endpoint: Endpoint, message: String) -> Result<ChatMessage> {
    let mut conversation = Conversation::new();
    let mut input = message;
    conversation.submit(&mut input, endpoint, transport).await;

    match conversation.messages() {
        [_, _, reply] => Ok(reply.clone()),
        _ => bail!("nothing to send: message is blank"),
    }
}

fn print_segmented(content: &str) {
    for part in segment(content) {
        match part.kind {
            SegmentKind::Text => println!("{}\n", part.value),
            SegmentKind::Code => {
                println!("--- CODE_BLOCK ---");
                println!("{}", part.value);
                println!("------------------\n");
            }
        }
    }
}

async fn check_health(transport: &HttpTransport) {
    println!("{}", health_report(transport.base_url(), transport.health().await));
}

fn health_report(base_url: &str, outcome: Result<bool, TransportError>) -> String {
    match outcome {
        Ok(true) => format!("STATUS: CONNECTED ({})", base_url),
        Ok(false) => format!("STATUS: OFFLINE ({})", base_url),
        Err(e) => format!("STATUS: OFFLINE ({})", e),
    }
}

fn update_config(mut config: Config, base_url: Option<String>, endpoint: Option<String>) -> Result<()> {
    if apply_config_changes(&mut config, base_url, endpoint)? {
        config.save()?;
    }

    println!("config file: {}", Config::get_config_path()?.display());
    println!("base_url:    {}", config.base_url());
    println!("endpoint:    {}", config.default_endpoint().as_str());
    Ok(())
}

/// Apply CLI overrides to `config`; true when anything changed.
fn apply_config_changes(config: &mut Config, base_url: Option<String>, endpoint: Option<String>) -> Result<bool> {
    let changed = base_url.is_some() || endpoint.is_some();

    if let Some(name) = endpoint {
        let Some(endpoint) = Endpoint::from_str(&name) else {
            bail!("unknown endpoint '{}', expected one of: chat, analyze", name);
        };
        config.default_endpoint = Some(endpoint.as_str().to_string());
    }
    if let Some(url) = base_url {
        config.base_url = Some(url);
    }

    Ok(changed)
}
