// ABOUTME: glucose-follower CLI - configure, inspect, verify and run the LibreView follower
// ABOUTME: Settings live in a JSON file; readings are printed as they are delivered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Store account and server
//! glucose-follower configure --url api-eu.libreview.io --username me@example.com --password secret
//!
//! # Turn smoothing on
//! glucose-follower configure --smoothing true
//!
//! # Show stored settings (secrets obscured)
//! glucose-follower show
//!
//! # Verify the stored credentials
//! glucose-follower check
//!
//! # Run a single poll cycle, or poll until Ctrl-C
//! glucose-follower poll --once
//! glucose-follower poll
//! ```

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use follower_providers::initialize_shared_client;
use glucose_follower::config::FollowerConfig;
use glucose_follower::logging::LoggingConfig;
use glucose_follower::settings::JsonFileSettingsStore;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "glucose-follower",
    about = "LibreView glucose follower",
    long_about = "Follows a LibreView (LibreLinkUp) account and prints a gap-free, optionally smoothed per-minute glucose series."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file override
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Store server address, account and switches
    Configure {
        /// Server address, e.g. api-eu.libreview.io
        #[arg(long)]
        url: Option<String>,

        /// Account e-mail (empty string clears it)
        #[arg(long)]
        username: Option<String>,

        /// Account password (empty string clears it)
        #[arg(long)]
        password: Option<String>,

        /// Smooth readings before delivery
        #[arg(long)]
        smoothing: Option<bool>,

        /// Run poll cycles at all
        #[arg(long)]
        follower: Option<bool>,
    },

    /// Print stored settings with secrets obscured
    Show,

    /// Log in with the stored credentials and report the result
    Check,

    /// Poll the account and print delivered readings
    Poll {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    logging.init()?;

    let mut config = FollowerConfig::from_env()?;
    if let Some(path) = cli.settings {
        config.settings_path = path;
    }
    info!("{}", config.summary());

    if !initialize_shared_client(config.http.timeout_secs, config.http.connect_timeout_secs) {
        debug!("Shared HTTP client was already configured");
    }

    let store = JsonFileSettingsStore::open(config.settings_path.clone()).await?;

    match cli.command {
        Command::Configure {
            url,
            username,
            password,
            smoothing,
            follower,
        } => {
            commands::settings::configure(
                &store,
                commands::settings::ConfigureArgs {
                    url,
                    username,
                    password,
                    smoothing,
                    follower,
                },
            )
            .await?;
        }
        Command::Show => {
            commands::settings::show(&store, config.gap_fill.retention_depth).await?;
        }
        Command::Check => commands::follow::check(&store).await?,
        Command::Poll { once } => commands::follow::poll(&config, store, once).await?,
    }

    Ok(())
}
