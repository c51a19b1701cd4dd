use preptrack_core::config::SyncMode;
use preptrack_core::services::TrackerService;
use preptrack_core::sync::{SyncError, SyncReport};

use crate::commands::common::{format_optional_timestamp, format_sync_conflict_lines};
use crate::error::CliError;

pub async fn run_sync(service: &TrackerService) -> Result<(), CliError> {
    if !service.is_sync_configured() {
        return Err(CliError::SyncNotConfigured);
    }

    match service.sync().await {
        Ok(report) => {
            for line in format_sync_report(&report) {
                println!("{line}");
            }
            Ok(())
        }
        Err(SyncError::NotConfigured) => Err(CliError::SyncNotConfigured),
        Err(error) => {
            tracing::warn!("Sync failed: {error}");
            Err(error.into())
        }
    }
}

pub async fn run_sync_status(
    service: &TrackerService,
    configured_user_id: Option<String>,
) -> Result<(), CliError> {
    println!("Status         {}", service.sync_status());
    if let Some(path) = service.db_path() {
        println!("Database       {}", path.display());
    }
    println!(
        "Mode           {}",
        match service.sync_mode() {
            SyncMode::Merge => "merge",
            SyncMode::LastModified => "last-modified",
        }
    );
    println!("User id        {}", service.user_id(configured_user_id).await?);
    println!(
        "Last modified  {}",
        format_optional_timestamp(service.last_modified().await?)
    );
    Ok(())
}

pub async fn run_sync_conflicts(
    limit: usize,
    as_json: bool,
    service: &TrackerService,
) -> Result<(), CliError> {
    let conflicts = service.list_conflicts(limit).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflicts)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_sync_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec!["Sync completed".to_string()];
    if report.mode == SyncMode::Merge {
        let summary = &report.summary;
        lines.push(format!(
            "  {} local only, {} remote only, {} kept local, {} taken from remote",
            summary.local_only, summary.remote_only, summary.kept_local, summary.took_remote
        ));
    }
    if report.conflicts > 0 {
        lines.push(format!(
            "  {} conflict(s) resolved; see `prep sync conflicts`",
            report.conflicts
        ));
    }
    if report.pulled {
        lines.push("  Local data updated from remote".to_string());
    }
    if !report.pushed {
        lines.push("  Remote already up to date".to_string());
    }
    lines
}
