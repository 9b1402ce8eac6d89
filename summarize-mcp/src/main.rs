// summarize-mcp - MCP server that turns text summaries into speech and plays them

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use summarize_mcp::config::{self, Config};
use summarize_mcp::mcp::McpServer;
use summarize_mcp::player::{default_players, select_player};
use summarize_mcp::scratch::ScratchDir;
use summarize_mcp::state::PreferenceStore;
use summarize_mcp::tools::SpeechTools;
use summarize_mcp::tts::openai::OpenAISpeechClient;
use summarize_mcp::voice::Voice;

#[derive(Parser, Debug)]
#[command(name = "summarize-mcp")]
#[command(about = "MCP server that speaks text summaries aloud using OpenAI text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug logging (also enabled by DEBUG=true)
    #[arg(short, long, global = true)]
    debug: bool,

    /// Run a maintenance command instead of the server
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the available voices
    Voices,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration and saved preferences
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (model, base_url, cleanup_delay_secs, stale_after_secs, temp_dir)
        key: String,
        /// Value to set
        value: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let debug = args.debug || std::env::var("DEBUG").is_ok_and(|v| v == "true");
    let log_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Some(Commands::Config { action }) => handle_config_command(action).await,
        Some(Commands::Voices) => {
            list_voices();
            Ok(())
        }
        None => run_server().await,
    }
}

async fn run_server() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let api_key = config::api_key_from_env().inspect_err(|e| log::error!("{}", e))?;

    let player = select_player(default_players()).await.context(
        "No audio player available. Please install an audio player (mpg123, sox, ffmpeg, or vlc on Linux)",
    )?;

    let scratch = ScratchDir::create(config.scratch_dir()).await?;
    let removed = scratch.sweep_stale(config.stale_after()).await;
    if removed > 0 {
        log::debug!("Removed {} stale audio file(s)", removed);
    }

    let preferences = PreferenceStore::new(Config::state_path()?);
    preferences.load().await;

    log::info!("Summarize MCP server starting...");
    log::info!(
        "Platform: {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    log::info!("Temp directory: {}", scratch.path().display());
    log::info!("Audio player: {}", player.name());
    let current = preferences.current();
    log::info!("Current voice: {}", current.voice);
    log::info!("Current tone: {}", truncate(&current.tone, 50));

    let synthesizer = OpenAISpeechClient::new(&config.model, &config.base_url, api_key);
    let tools = SpeechTools::new(
        Arc::new(synthesizer),
        Arc::from(player),
        scratch,
        preferences,
        config.cleanup_delay(),
    );

    McpServer::new(Arc::new(tools)).run_stdio().await?;
    log::info!("Client disconnected, shutting down");
    Ok(())
}

async fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("Configuration file: {:?}", Config::config_path()?);
            println!();
            println!("model = \"{}\"", config.model);
            println!("base_url = \"{}\"", config.base_url);
            println!("cleanup_delay_secs = {}", config.cleanup_delay_secs);
            println!("stale_after_secs = {}", config.stale_after_secs);
            println!("temp_dir = {:?}", config.scratch_dir());

            let preferences = PreferenceStore::new(Config::state_path()?);
            preferences.load().await;
            let current = preferences.current();
            println!();
            println!("Preferences file: {:?}", preferences.path());
            println!("voice = \"{}\"", current.voice);
            println!("tone = \"{}\"", current.tone);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{} set to: {}", key, value);
        }
    }
    Ok(())
}

fn list_voices() {
    println!("Available voices:");
    println!();
    for voice in Voice::ALL {
        if voice == Voice::default() {
            println!("  {} (default)", voice);
        } else {
            println!("  {}", voice);
        }
    }
}

/// First `max` characters of `text`, with an ellipsis if anything was cut
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
