//! Runs one of the bundled bots against a chat server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package parley-bots -- helloworld --config-file parley.toml
//! ```
//!
//! `parley.toml` carries the server credentials:
//!
//! ```toml
//! [server]
//! site = "https://chat.example.com"
//! email = "helloworld-bot@chat.example.com"
//! api_key = "..."
//! ```

mod bots;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use parley::prelude::*;

/// Run a Parley bot.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Name of the bot to run.
    #[arg(value_parser = clap::builder::PossibleValuesParser::new(
        bots::BOTS.iter().map(|bot| bot.name)
    ))]
    bot: String,

    /// Process configuration (server credentials, logging, rate limit).
    #[arg(short, long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// The bot's own `.conf` file.
    #[arg(short, long, value_name = "FILE")]
    bot_config_file: Option<PathBuf>,

    /// Directory the bot may read files from.
    #[arg(long, value_name = "DIR")]
    root_dir: Option<PathBuf>,

    /// Suppress the startup banner and informational logs.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let descriptor = bots::find(&args.bot).with_context(|| format!("unknown bot `{}`", args.bot))?;

    let mut builder = BotRuntime::builder(*descriptor).quiet(args.quiet);
    if let Some(path) = &args.config_file {
        builder = builder.config_file(path);
    }
    if let Some(path) = args.bot_config_file {
        builder = builder.bot_config_file(path);
    }
    if let Some(dir) = args.root_dir {
        builder = builder.root_dir(dir);
    }

    let runtime = builder
        .build()
        .context("failed to load configuration")?;
    runtime
        .run()
        .await
        .with_context(|| format!("{} bot stopped", descriptor.resolved_display_name()))
}
