//! Mushaf - Quran and Hadith reader
//! Command-line shell over the reader library

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::OpenOptions;
use mushaf_lib::config::{get_data_dir, settings_path, Settings};
use mushaf_lib::shell::Route;
use mushaf_lib::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mushaf", version, about = "Read the Quran and the major Hadith collections")]
struct Cli {
    /// Settings file (defaults to settings.json in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the bundled datasets
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every view and its path
    Menu,
    /// Open the view at a path such as /ruku or hudsi
    Open {
        route: String,

        /// Unit number (surah, juz, ruku, page, hizb quarter or manzil)
        #[arg(long)]
        locator: Option<u32>,

        /// Translation edition, e.g. en.asad
        #[arg(long)]
        edition: Option<String>,

        /// Search text, surah name filter or reciter
        #[arg(long)]
        query: Option<String>,

        /// Ayah reference, e.g. 2:255 or 262
        #[arg(long)]
        reference: Option<String>,

        /// Regional translation key, e.g. tamil_baqavi
        #[arg(long)]
        translation: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mushaf=debug,mushaf_lib=debug" } else { "mushaf=info,mushaf_lib=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = match cli.command {
        Command::Menu => {
            commands::print_menu();
            return Ok(());
        }
        command => command,
    };

    let base_dir = cli.data_dir.clone().unwrap_or_else(get_data_dir);
    let config_path = cli.config.clone().unwrap_or_else(|| settings_path(&base_dir));
    let settings = Settings::load(&config_path)?;

    // An explicit --data-dir wins over the settings file
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => settings.resolve_data_dir(),
    };
    tracing::debug!(data_dir = ?data_dir, config = ?config_path, "Resolved paths");

    let state = AppState::new(settings, data_dir).context("Failed to initialize application state")?;

    if let Command::Open {
        route,
        locator,
        edition,
        query,
        reference,
        translation,
    } = command
    {
        let route = Route::from_path(&route)?;
        let options = OpenOptions {
            locator,
            edition,
            query,
            reference,
            translation,
        };
        commands::open(&state, route, &options).await?;
    }

    Ok(())
}
