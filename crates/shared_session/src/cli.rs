//! Command-line interface for shared_games.

use clap::{Parser, Subcommand};

/// Shared Games - tic-tac-toe over a shared key-value store
#[derive(Parser, Debug)]
#[command(name = "shared_games")]
#[command(about = "Tic-tac-toe played through compare-and-set on a shared store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a scripted match between two in-memory clients
    Demo {
        /// Username of the host
        #[arg(long, default_value = "alice")]
        host: String,

        /// Username of the guest
        #[arg(long, default_value = "bob")]
        guest: String,

        /// Path to a session config file (TOML)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },

    /// Decode a stored snapshot and print its board and status
    Inspect {
        /// File holding the snapshot JSON
        path: std::path::PathBuf,

        /// Player whose point of view to show
        #[arg(long)]
        player: Option<String>,

        /// Host of the match (defaults to the first player in the log)
        #[arg(long)]
        host: Option<String>,
    },
}
