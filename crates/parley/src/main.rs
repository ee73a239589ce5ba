// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a group-chat companion bot with a searchable conversation memory.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod history;
mod import;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_config::ParleyConfig;

/// Parley - a group-chat companion bot with a searchable conversation memory.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook server and answer addressed messages.
    Serve,
    /// Import a Telegram Desktop JSON chat export into the store.
    Import {
        /// Path to the export's result.json.
        #[arg(long)]
        file: PathBuf,
        /// Parse and count without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// Log every skipped, duplicate or failed message.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the latest stored messages of a chat.
    History {
        /// Chat id.
        #[arg(long, allow_negative_numbers = true)]
        chat: i64,
        /// How many messages to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Import {
            file,
            dry_run,
            verbose,
        }) => import::run_import(&config, &file, dry_run, verbose)
            .await
            .map(|stats| {
                println!("{stats}");
                if dry_run {
                    println!("dry run: nothing was written");
                }
            }),
        Some(Commands::History { chat, limit }) => {
            history::run_history(&config, chat, limit).await
        }
        None => {
            println!("parley: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `parley` crates log at `bot.log_level` and
/// everything else at warn.
fn init_tracing(config: &ParleyConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={},warn", config.bot.log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
