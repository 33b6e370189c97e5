//! Command Handlers

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use presence_sync::{
    EnvFileCredentialStore, FileSnapshotStore, HttpAccessApi, PresenceConfig, PresenceService,
    RefreshOutcome, RefreshScheduler,
};

use crate::commands::{Cli, Commands, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = PresenceConfig::from_env()?;
    info!(
        base_url = %config.api.base_url,
        division = config.site.division_id,
        snapshot = %config.sync.snapshot_path.display(),
        policy = %config.sync.status_policy,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { interval } => handle_run(config, interval).await,
        Commands::Sync { format } => handle_sync(config, format).await,
        Commands::Show {
            group,
            refresh,
            format,
        } => handle_show(config, &group, refresh, format).await,
        Commands::Login => handle_login(config).await,
    }
}

fn build_client(config: &PresenceConfig) -> CliResult<Arc<HttpAccessApi>> {
    let credentials = Arc::new(EnvFileCredentialStore::new(&config.sync.env_file));
    Ok(Arc::new(HttpAccessApi::new(&config.api, credentials)?))
}

/// Build the service and load whatever snapshot is on disk
async fn build_service(config: PresenceConfig) -> CliResult<Arc<PresenceService>> {
    let api = build_client(&config)?;
    let store = Arc::new(FileSnapshotStore::new(&config.sync.snapshot_path));
    let service = Arc::new(PresenceService::new(api, store, config.site, config.sync));

    if let Err(e) = service.load().await {
        warn!(error = %e, "Stored snapshot unusable, starting empty");
    }
    Ok(service)
}

async fn handle_run(config: PresenceConfig, interval: Option<u64>) -> CliResult<()> {
    let period = Duration::from_secs(interval.unwrap_or(config.sync.refresh_interval_secs).max(1));
    let service = build_service(config).await?;

    let scheduler = RefreshScheduler::new(service, period).start();
    info!("Presence service running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    scheduler.shutdown().await;
    Ok(())
}

async fn handle_sync(config: PresenceConfig, format: OutputFormat) -> CliResult<()> {
    let service = build_service(config).await?;

    match service.refresh().await {
        RefreshOutcome::Completed(report) => {
            print!("{}", output::render_report(&report, format)?);
            Ok(())
        }
        RefreshOutcome::Failed(message) => Err(CliError::cycle(message)),
        RefreshOutcome::Skipped => Err(CliError::cycle("another refresh is in progress")),
    }
}

async fn handle_show(
    config: PresenceConfig,
    group: &str,
    refresh: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let service = build_service(config).await?;

    if refresh {
        if let RefreshOutcome::Failed(message) = service.refresh().await {
            warn!(error = %message, "Refresh failed, showing stored data");
        }
    }

    let view = service.get_records(group).await?;
    print!("{}", output::render_group(&view, format)?);
    Ok(())
}

async fn handle_login(config: PresenceConfig) -> CliResult<()> {
    let env_file = config.sync.env_file.clone();
    let client = build_client(&config)?;

    client.reauthenticate().await?;
    println!("New token stored in {}", env_file.display());
    Ok(())
}
