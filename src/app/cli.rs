//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gesture Driver - servo gesture emulation with semi-Markov selection
#[derive(Parser, Debug)]
#[command(name = "gesture-driver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop (interactive single-character commands on stdin)
    Run {
        /// Start directly in autonomous (semi-Markov) mode
        #[arg(short, long)]
        autonomous: bool,

        /// Override the RNG seed from the config
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop after this many seconds (0 = until interrupted)
        #[arg(short, long, default_value = "0")]
        duration: u64,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the config file
        config_file: PathBuf,
    },

    /// Initialize the default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
