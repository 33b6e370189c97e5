//! Presence CLI Entry Point
//!
//! Configuration is read from the environment, after loading `.env` (or the
//! file named by PRESENCE_ENV_FILE). Variables already set win.

use clap::Parser;
use presence_cli::{handler, logging, Cli};

#[tokio::main]
async fn main() {
    match std::env::var("PRESENCE_ENV_FILE") {
        Ok(path) => {
            dotenvy::from_path(path).ok();
        }
        Err(_) => {
            dotenvy::dotenv().ok();
        }
    }

    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_format, cli.verbose) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    if let Err(e) = handler::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
