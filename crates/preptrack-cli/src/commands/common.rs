use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use preptrack_core::config::RemoteConfig;
use preptrack_core::models::{Application, PracticeLog, Record, RecordId, SyncConflict, Topic};
use preptrack_core::services::TrackerService;
use preptrack_core::util;
use serde_json::Value;

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("PREPTRACK_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("preptrack")
        .join("preptrack.db")
}

/// Open the tracker the way the app starts: seed first-run data and sweep
/// stale applications.
pub async fn open_service(db_path: &Path, remote: &RemoteConfig) -> Result<TrackerService, CliError> {
    let service = TrackerService::open_path(db_path, remote)?;

    if service.seed_defaults().await? {
        tracing::info!("Seeded default topics and settings");
    }
    let swept = service.sweep_stale_applications(util::today()).await?;
    if !swept.is_empty() {
        tracing::info!("Marked {} application(s) as stale", swept.len());
    }

    Ok(service)
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn short_id(id: &RecordId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

/// Find a record by full id or unique id prefix.
pub fn resolve_record<R: Record>(
    query: &str,
    records: &[R],
    kind: &'static str,
) -> Result<R, CliError> {
    let query = normalize_identifier(query)?;
    if let Some(record) = records.iter().find(|record| record.id().as_str() == query) {
        return Ok(record.clone());
    }

    let matches = records
        .iter()
        .filter(|record| record.id().as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::NotFound { kind, query }),
        [record] => Ok((*record).clone()),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|record| short_id(record.id()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::Ambiguous(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Find a topic by id, case-insensitive name, or unique id prefix.
pub fn resolve_topic(query: &str, topics: &[Topic]) -> Result<Topic, CliError> {
    let trimmed = normalize_identifier(query)?;
    let by_name = topics
        .iter()
        .filter(|topic| topic.name.eq_ignore_ascii_case(&trimmed))
        .collect::<Vec<_>>();

    match by_name.as_slice() {
        [topic] => Ok((*topic).clone()),
        [] => resolve_record(&trimmed, topics, "topic"),
        _ => Err(CliError::Ambiguous(format!(
            "Topic name '{trimmed}' exists in several categories; use its id"
        ))),
    }
}

/// Parse repeated `name=count` pairs.
pub fn parse_resources(pairs: &[String]) -> Result<BTreeMap<String, u32>, CliError> {
    let mut resources = BTreeMap::new();
    for pair in pairs {
        let (name, count) = pair.split_once('=').ok_or_else(|| {
            CliError::InvalidArgument(format!("resource '{pair}' must look like name=count"))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::InvalidArgument(format!(
                "resource '{pair}' has no name"
            )));
        }
        let count = count.trim().parse::<u32>().map_err(|_| {
            CliError::InvalidArgument(format!("resource '{pair}' count must be a whole number"))
        })?;
        *resources.entry(name.to_string()).or_insert(0) += count;
    }
    Ok(resources)
}

/// JSON when the text parses as JSON, otherwise the raw string.
pub fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn format_log_lines(logs: &[PracticeLog], topics: &[Topic]) -> Vec<String> {
    let names = topics
        .iter()
        .map(|topic| (&topic.id, topic.name.as_str()))
        .collect::<HashMap<&RecordId, &str>>();

    logs.iter()
        .map(|log| {
            let topic_names = log
                .topics
                .iter()
                .map(|id| names.get(id).copied().unwrap_or(id.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{:<13}  {}  {:>4}m  {:>3}q  {}",
                short_id(&log.id),
                log.date,
                log.minutes_spent,
                log.question_count(),
                topic_names
            )
        })
        .collect()
}

pub fn format_topic_lines(topics: &[Topic]) -> Vec<String> {
    topics
        .iter()
        .map(|topic| {
            let last = topic
                .last_practiced
                .map_or_else(|| "never".to_string(), |day| day.to_string());
            let marker = if topic.completed { "✓" } else { " " };
            format!(
                "{:<13}  {marker} {:<40}  {:>3}x  {last}",
                short_id(&topic.id),
                truncate(&topic.name, 40),
                topic.practice_count
            )
        })
        .collect()
}

pub fn format_application_lines(applications: &[Application], today: NaiveDate) -> Vec<String> {
    applications
        .iter()
        .map(|application| {
            let idle = util::days_between(application.last_touched(), today);
            format!(
                "{:<13}  {:<20}  {:<24}  {:<19}  {}  ({idle}d)",
                short_id(&application.id),
                truncate(&application.company, 20),
                truncate(&application.title, 24),
                application.status.as_str(),
                application.date_applied
            )
        })
        .collect()
}

pub fn format_sync_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {:<6}  {}/{}  local={} remote={}",
                conflict.resolved_at.format("%Y-%m-%d %H:%M:%S UTC"),
                conflict.winner.as_str(),
                conflict.collection,
                conflict.record_key,
                format_optional_timestamp(conflict.local_updated_at),
                format_optional_timestamp(conflict.remote_updated_at)
            )
        })
        .collect()
}

pub fn format_optional_timestamp(value: Option<chrono::DateTime<chrono::Utc>>) -> String {
    value.map_or_else(
        || "-".to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
