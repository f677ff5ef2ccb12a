// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// InerScan — document scanning workstation
//
// Entry point. Initialises logging and backend services, then runs one
// command against them.

mod commands;
mod services;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inerscan_core::human_errors::humanize_error;

use services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "inerscan")]
#[command(version, about = "Scan, edit and export multi-page documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load images as pages, edit them and export the document
    Process(commands::ProcessArgs),

    /// Report whether an image looks like a blank page
    Blank {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Laplacian variance below which a page is blank
        #[arg(long, value_name = "FLOAT")]
        threshold: Option<f64>,
    },

    /// List or clear the export history
    History {
        /// Number of entries to show
        #[arg(short, long, value_name = "N", default_value = "50")]
        limit: u32,

        /// Delete one entry by id
        #[arg(long, value_name = "ID", conflicts_with = "clear")]
        delete: Option<i64>,

        /// Delete every entry
        #[arg(long)]
        clear: bool,
    },

    /// Read or change stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show or reset the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Extract text from an image
    Ocr {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Summarise an image's content
    Analyze {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Suggest a filename for an image
    Rename {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Ask a question, optionally about an image
    Chat {
        #[arg(value_name = "MESSAGE")]
        message: String,

        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },

    /// Check the remote endpoint and credentials
    TestConnection,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print every setting
    List,
    /// Print one setting
    Get { key: String },
    /// Store a setting
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active config as JSON
    Show,
    /// Write the default config to the data directory
    Reset,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("InerScan starting");

    let services = match AppServices::init() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "persistent storage failed; using in-memory fallback");
            match AppServices::fallback() {
                Ok(s) => s,
                Err(e) => exit_with(&e),
            }
        }
    };

    let result = match cli.command {
        Commands::Process(args) => commands::cmd_process(&services, args),
        Commands::Blank { input, threshold } => commands::cmd_blank(&services, &input, threshold),
        Commands::History { limit, delete, clear } => {
            commands::cmd_history(&services, limit, delete, clear)
        }
        Commands::Settings { action } => match action {
            SettingsAction::List => commands::cmd_settings_list(&services),
            SettingsAction::Get { key } => commands::cmd_settings_get(&services, &key),
            SettingsAction::Set { key, value } => commands::cmd_settings_set(&services, &key, &value),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::cmd_config_show(&services),
            ConfigAction::Reset => commands::cmd_config_reset(&services),
        },
        Commands::Ocr { input } => {
            commands::cmd_remote(&services, inerscan_bridge::RemoteKind::Ocr, &input)
        }
        Commands::Analyze { input } => {
            commands::cmd_remote(&services, inerscan_bridge::RemoteKind::Analysis, &input)
        }
        Commands::Rename { input } => {
            commands::cmd_remote(&services, inerscan_bridge::RemoteKind::Filename, &input)
        }
        Commands::Chat { message, image } => commands::cmd_chat(&services, message, image.as_deref()),
        Commands::TestConnection => commands::cmd_test_connection(&services),
    };

    if let Err(e) = result {
        exit_with(&e);
    }
}

fn exit_with(err: &inerscan_core::InerScanError) -> ! {
    let human = humanize_error(err);
    eprintln!("Error: {}", human.message);
    eprintln!("{}", human.suggestion);
    std::process::exit(1);
}
