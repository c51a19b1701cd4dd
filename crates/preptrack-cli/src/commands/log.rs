use std::collections::BTreeSet;

use preptrack_core::models::{PracticeLog, PracticeLogPatch, RecordId, Topic};
use preptrack_core::services::TrackerService;
use preptrack_core::util;

use crate::cli::LogCommands;
use crate::commands::common::{
    format_log_lines, parse_resources, resolve_record, resolve_topic, short_id,
};
use crate::error::CliError;

pub async fn run_log(command: LogCommands, service: &TrackerService) -> Result<(), CliError> {
    match command {
        LogCommands::Add {
            minutes,
            date,
            resources,
            topics,
            notes,
        } => {
            let known_topics = service.list_topics().await?;
            let mut draft = PracticeLog::new(date.unwrap_or_else(util::today), minutes);
            draft.resources = parse_resources(&resources)?;
            draft.topics = resolve_topic_ids(&topics, &known_topics)?;
            draft.notes = notes.unwrap_or_default();

            let log = service.add_log(draft).await?;
            println!(
                "Logged {} minutes on {} ({})",
                log.minutes_spent,
                log.date,
                short_id(&log.id)
            );
        }
        LogCommands::List { limit, json } => {
            let logs = service
                .list_logs()
                .await?
                .into_iter()
                .take(limit)
                .collect::<Vec<_>>();
            if json {
                println!("{}", serde_json::to_string_pretty(&logs)?);
            } else if logs.is_empty() {
                println!("No practice logged yet.");
            } else {
                let topics = service.list_topics().await?;
                for line in format_log_lines(&logs, &topics) {
                    println!("{line}");
                }
            }
        }
        LogCommands::Edit {
            id,
            minutes,
            date,
            resources,
            topics,
            notes,
        } => {
            let log = resolve_record(&id, &service.list_logs().await?, "log")?;
            let known_topics = service.list_topics().await?;
            let patch = PracticeLogPatch {
                date,
                minutes_spent: minutes,
                resources: if resources.is_empty() {
                    None
                } else {
                    Some(parse_resources(&resources)?)
                },
                topics: if topics.is_empty() {
                    None
                } else {
                    Some(resolve_topic_ids(&topics, &known_topics)?)
                },
                notes,
            };
            if patch == PracticeLogPatch::default() {
                return Err(CliError::InvalidArgument(
                    "nothing to change; pass at least one field".to_string(),
                ));
            }

            let updated = service
                .update_log(&log.id, patch)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    kind: "log",
                    query: id.clone(),
                })?;
            println!("Updated log {}", short_id(&updated.id));
        }
        LogCommands::Delete { id } => {
            let log = resolve_record(&id, &service.list_logs().await?, "log")?;
            service.delete_log(&log.id).await?;
            println!("Deleted log {}", short_id(&log.id));
        }
    }

    Ok(())
}

pub fn resolve_topic_ids(queries: &[String], topics: &[Topic]) -> Result<BTreeSet<RecordId>, CliError> {
    queries
        .iter()
        .map(|query| resolve_topic(query, topics).map(|topic| topic.id))
        .collect()
}
