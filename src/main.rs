use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simsanity_cli::config::Config;
use simsanity_cli::transport::cli as frontend;

#[derive(Parser)]
#[command(name = "simsanity")]
#[command(
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), env!("SIMSANITY_VERSION_SUFFIX")),
    about = "SimSanity - Sims 4 mod troubleshooting assistant",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides config and SIMSANITY_BACKEND_URL)
    #[arg(short, long, global = true)]
    backend: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Print the cheat catalog and exit
    Cheats,

    /// Enter How-To mode once and print the answer
    Howto,

    /// Manage the config file
    Config {
        /// Write a default config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "simsanity_cli=debug,simsanity=debug"
    } else {
        "simsanity_cli=info,simsanity=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(Commands::Config { init }) = cli.command {
        if init {
            frontend::run_config_init()?;
        } else {
            println!("{}", Config::config_path()?.display());
        }
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(url) = cli.backend {
        config.backend.base_url = url;
    }
    tracing::debug!(backend = %config.backend.base_url, "configuration loaded");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => frontend::run_chat(config).await?,
        Commands::Cheats => frontend::run_cheats(config).await?,
        Commands::Howto => frontend::run_howto(config).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
