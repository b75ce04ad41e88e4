use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use humanizer_lib::api;
use humanizer_lib::init_logging;
use humanizer_lib::models::Mode;
use humanizer_lib::services::config_store::{AppConfig, ConfigStore};
use humanizer_lib::services::humanizer::Humanizer;
use humanizer_lib::services::providers::ProviderGateway;

#[derive(Parser)]
#[command(
    name = "humanize",
    about = "Score text for AI-likeness and rewrite it to read more naturally",
    version
)]
struct Cli {
    /// Config directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Heuristic AI-likelihood detection
    Detect(InputArgs),
    /// Per-sentence flags and improvement hints
    Insights(InputArgs),
    /// Compare an original text with its rewrite
    Compare {
        /// File holding the original text
        original: PathBuf,
        /// File holding the rewritten text
        rewritten: PathBuf,
    },
    /// Rewrite text through the configured generator
    Rewrite {
        #[command(flatten)]
        input: InputArgs,
        /// human, anti-ai, shorten or formal
        #[arg(long, default_value = "human")]
        mode: String,
        /// Provider override, e.g. `deepseek:deepseek-chat`
        #[arg(long)]
        provider: Option<String>,
    },
    /// Manage stored keys and provider URLs
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct InputArgs {
    /// Text to process (reads --file or stdin if omitted)
    text: Option<String>,
    #[arg(long, short)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective config with keys masked
    Show,
    SetKey { provider: String, key: String },
    DeleteKey { provider: String },
    SetUrl { provider: String, url: String },
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading stdin")?;
        Ok(input)
    }
}

fn open_store(dir: Option<PathBuf>) -> Result<ConfigStore> {
    match dir {
        Some(dir) => Ok(ConfigStore::new(dir)),
        None => ConfigStore::open_default().ok_or_else(|| anyhow!("no config directory available")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{}", visible)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let store = open_store(cli.config_dir)?;
    let config: AppConfig = store.load().map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::Detect(input) => {
            let text = input.read()?;
            print_json(&api::detect(&text, &config)?)?;
        }
        Command::Insights(input) => {
            let text = input.read()?;
            print_json(&api::insights(&text, &config))?;
        }
        Command::Compare { original, rewritten } => {
            let before = std::fs::read_to_string(&original)
                .with_context(|| format!("reading {}", original.display()))?;
            let after = std::fs::read_to_string(&rewritten)
                .with_context(|| format!("reading {}", rewritten.display()))?;
            print_json(&api::compare(&before, &after, &config)?)?;
        }
        Command::Rewrite { input, mode, provider } => {
            let text = input.read()?;
            let mode = Mode::parse(&mode);
            let gateway = ProviderGateway::from_config(&config, provider.as_deref())?;
            info!("Using provider {}:{}", gateway.spec().name, gateway.spec().model);
            let humanizer = Humanizer::new(
                Arc::new(gateway),
                config.humanizer.clone(),
                config.detector.clone(),
            );

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let result = humanizer
                .run_cancellable(&text, mode, &cancel)
                .await
                .map_err(api::ApiError::from)?;
            print_json(&result)?;
        }
        Command::Config(cmd) => run_config(&store, config, cmd)?,
    }

    Ok(())
}

fn run_config(store: &ConfigStore, mut config: AppConfig, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            for key in config.api_keys.values_mut() {
                *key = mask(key);
            }
            print_json(&config)?;
        }
        ConfigCommand::SetKey { provider, key } => {
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            store.set_api_key(&provider, key.trim()).map_err(anyhow::Error::msg)?;
            println!("Stored key for {}", provider);
        }
        ConfigCommand::DeleteKey { provider } => {
            store.delete_api_key(&provider).map_err(anyhow::Error::msg)?;
            println!("Deleted key for {}", provider);
        }
        ConfigCommand::SetUrl { provider, url } => {
            store.set_provider_url(&provider, &url).map_err(anyhow::Error::msg)?;
            println!("Base URL for {} set to {}", provider, url);
        }
    }
    Ok(())
}
