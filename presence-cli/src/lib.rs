//! Presence CLI
//!
//! Command line front end for the presence service.
//!
//! ```text
//! presence [OPTIONS] <COMMAND>
//!
//! Commands:
//!   run    Load the stored snapshot and refresh it on a timer until Ctrl-C
//!   sync   Run a single refresh cycle and print its report
//!   show   Print the floor plan of one group from the stored snapshot
//!   login  Exchange login and password for a new token and store it
//!
//! Options:
//!       --log-format <FORMAT>  pretty, compact or json [default: compact]
//!   -v, --verbose              Enable debug logging for the presence crates
//! ```

pub mod commands;
pub mod error;
pub mod handler;
pub mod logging;
pub mod output;

pub use commands::{Cli, Commands, LogFormat, OutputFormat};
pub use error::{CliError, CliResult};
