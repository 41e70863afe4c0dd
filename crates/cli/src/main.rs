use std::path::PathBuf;

use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Book catalogue service")]
struct Cli {
    /// Directory holding base.toml and the per-environment overlays
    #[arg(long, env = "BOOKSHELF_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the book storage schema and exit
    InitDb,
    /// Print the effective configuration as JSON
    Config,
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let settings = match &cli.config_dir {
        Some(dir) => Settings::load_from(dir),
        None => Settings::load(),
    };
    settings.context("failed to load Bookshelf settings")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli)?;

    match cli.command {
        Command::Config => {
            settings.database.url = bookshelf_db::redact(&settings.database.url);
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Command::InitDb => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            runtime()?.block_on(bookshelf_app::app::init_storage(&settings.database))
        }
        Command::Serve { port } => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            tracing::info!(env = ?settings.environment, "bookshelf serve");
            runtime()?.block_on(bookshelf_app::app::run(settings))
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
