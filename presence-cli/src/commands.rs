//! Command line definitions

use clap::{Parser, Subcommand};

/// Zone presence tracker
#[derive(Parser, Debug)]
#[command(name = "presence")]
#[command(version)]
#[command(about = "Tracks who is inside monitored zones using access-control events")]
#[command(long_about = "Keeps a local snapshot of persons and their presence status, \
    rebuilt periodically from an access-control backend.\n\n\
    Connection settings come from ACCESS_API_* variables and the site layout \
    from PRESENCE_* variables, both usually loaded from a .env file.")]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, env = "PRESENCE_LOG_FORMAT", default_value = "compact", global = true)]
    pub log_format: LogFormat,

    /// Enable debug logging for the presence crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable text
    #[default]
    Plain,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the stored snapshot and refresh it on a timer until Ctrl-C
    Run {
        /// Refresh period in seconds (env: PRESENCE_REFRESH_INTERVAL_SECS)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run a single refresh cycle and print its report
    Sync {
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Print the floor plan of one group from the stored snapshot
    Show {
        /// Group key, e.g. obch1
        #[arg(short, long)]
        group: String,

        /// Refresh before printing
        #[arg(short, long)]
        refresh: bool,

        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Exchange login and password for a new token and store it
    Login,
}
