//! CLI front-end for the parley chat core.
//!
//! A thin stand-in for the presentation layer: it renders provider and
//! model lists, runs a line-oriented chat loop, and edits the settings
//! file. All state and dispatch rules live in the library crates.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use parley_providers::{Credentials, ProviderRegistry, RECOGNIZED_KEYS};
use parley_session::Session;

#[derive(Parser)]
#[command(name = "parley", version, about = "Multi-provider chat front-end")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file holding provider credentials
    #[arg(short, long, global = true, default_value = "parley-settings.json")]
    settings: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List providers that answer with the configured credentials
    Providers,

    /// List models available from one provider
    Models {
        /// Provider name, e.g. "Ollama" or "OpenAI"
        provider: String,
    },

    /// Chat with one provider/model pair
    Chat {
        /// Provider name, e.g. "Ollama"
        provider: String,

        /// Model identifier, e.g. "llama3"
        model: String,
    },

    /// Store a credential in the settings file
    Set {
        /// Provider key, e.g. "openai" (or "ollama" for the local port)
        key: String,

        /// API key, or port number for ollama
        value: String,
    },

    /// Show the configured credential keys
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let mut credentials = Credentials::load_or_default(&cli.settings)?;
    let registry = ProviderRegistry::new();

    match cli.command {
        Commands::Providers => cmd_providers(&registry, &credentials).await,
        Commands::Models { provider } => cmd_models(&registry, &credentials, &provider).await,
        Commands::Chat { provider, model } => {
            cmd_chat(&registry, &credentials, &provider, &model).await?
        }
        Commands::Set { key, value } => {
            cmd_set(&mut credentials, &cli.settings, &key, &value)?
        }
        Commands::Show => cmd_show(&credentials),
    }

    Ok(())
}

async fn cmd_providers(registry: &ProviderRegistry, credentials: &Credentials) {
    let available = registry.available_providers(credentials).await;
    if available.is_empty() {
        println!("No providers available. Configure credentials with `parley set <key> <value>`.");
        return;
    }
    for name in available {
        println!("{name}");
    }
}

async fn cmd_models(registry: &ProviderRegistry, credentials: &Credentials, provider: &str) {
    let models = registry.available_models(provider, credentials).await;
    if models.is_empty() {
        println!("No models available from {provider}.");
        return;
    }
    for model in models {
        println!("{model}");
    }
}

async fn cmd_chat(
    registry: &ProviderRegistry,
    credentials: &Credentials,
    provider: &str,
    model: &str,
) -> anyhow::Result<()> {
    let mut session = Session::new();
    let id = session.create_conversation();
    let convo = session
        .conversation_mut(id)
        .ok_or_else(|| anyhow::anyhow!("conversation {id} missing"))?;
    convo.start(provider, model);

    println!(
        "{} (type your message, empty line or Ctrl-D to quit)",
        convo.title()
    );

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            break;
        }

        let convo = session.send_message(id, text, registry, credentials).await?;
        if let Some(reply) = convo.messages().last() {
            println!("{}", reply.content);
        }
    }

    Ok(())
}

fn cmd_set(
    credentials: &mut Credentials,
    path: &std::path::Path,
    key: &str,
    value: &str,
) -> anyhow::Result<()> {
    if !RECOGNIZED_KEYS.contains(&key) && key != "google" {
        println!(
            "Note: '{key}' is not a recognized provider key ({})",
            RECOGNIZED_KEYS.join(", ")
        );
    }
    credentials.set(key, value);
    credentials.save(path)?;
    println!("Saved {key} to {}", path.display());
    Ok(())
}

fn cmd_show(credentials: &Credentials) {
    if credentials.is_empty() {
        println!("No credentials configured.");
        return;
    }
    for (key, value) in credentials.iter() {
        // Secrets stay out of the terminal; ollama holds a port, not a key.
        if key == "ollama" {
            println!("{key} = {value}");
        } else {
            println!("{key} = ****");
        }
    }
}
