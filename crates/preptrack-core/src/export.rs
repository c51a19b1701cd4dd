//! Export of the visible dataset as JSON or Markdown.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{Record, RecordId, Snapshot, Topic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Copy of `snapshot` without tombstones.
#[must_use]
pub fn visible_snapshot(snapshot: &Snapshot) -> Snapshot {
    Snapshot {
        daily_logs: snapshot
            .daily_logs
            .iter()
            .filter(|log| !log.is_deleted())
            .cloned()
            .collect(),
        topics: snapshot.topics.clone(),
        applications: snapshot
            .applications
            .iter()
            .filter(|application| !application.is_deleted())
            .cloned()
            .collect(),
        settings: snapshot.settings.clone(),
        last_modified: snapshot.last_modified,
    }
}

/// Pretty-printed JSON snapshot of the visible records.
pub fn render_json_export(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&visible_snapshot(snapshot))
}

fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Markdown summary tables of the visible records.
#[must_use]
pub fn render_markdown_export(snapshot: &Snapshot) -> String {
    let visible = visible_snapshot(snapshot);
    let topic_names = visible
        .topics
        .iter()
        .map(|topic| (&topic.id, topic.name.as_str()))
        .collect::<HashMap<&RecordId, &str>>();

    let mut output = String::new();
    let _ = writeln!(output, "# Preptrack export");
    if let Some(at) = visible.last_modified {
        let _ = writeln!(output);
        let _ = writeln!(output, "Last synced snapshot: {}", at.to_rfc3339());
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Practice logs");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Date | Minutes | Questions | Topics | Notes |");
    let _ = writeln!(output, "| --- | ---: | ---: | --- | --- |");
    let mut logs = visible.daily_logs.iter().collect::<Vec<_>>();
    logs.sort_by(|a, b| b.date.cmp(&a.date));
    for log in logs {
        let topics = log
            .topics
            .iter()
            .map(|id| topic_names.get(id).copied().unwrap_or(id.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            log.date,
            log.minutes_spent,
            log.question_count(),
            cell(&topics),
            cell(&log.notes)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Topics");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Category | Topic | Practiced | Last practiced | Completed |");
    let _ = writeln!(output, "| --- | --- | ---: | --- | --- |");
    let mut topics = visible.topics.iter().collect::<Vec<&Topic>>();
    topics.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
    for topic in topics {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            cell(&topic.category),
            cell(&topic.name),
            topic.practice_count,
            topic
                .last_practiced
                .map_or_else(|| "never".to_string(), |day| day.to_string()),
            if topic.completed { "yes" } else { "no" }
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Applications");
    let _ = writeln!(output);
    let _ = writeln!(output, "| Company | Title | Status | Applied | Last updated |");
    let _ = writeln!(output, "| --- | --- | --- | --- | --- |");
    for application in &visible.applications {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            cell(&application.company),
            cell(&application.title),
            cell(application.status.as_str()),
            application.date_applied,
            application.last_touched()
        );
    }

    output
}

pub fn render_export(snapshot: &Snapshot, format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(snapshot),
        ExportFormat::Markdown => Ok(render_markdown_export(snapshot)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("preptrack-export-{timestamp_ms}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Application, PracticeLog};
    use chrono::NaiveDate;

    fn sample() -> Snapshot {
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let topic = Topic::new("Computer Vision", "SLAM");
        let mut log = PracticeLog::new(day, 40);
        log.topics.insert(topic.id.clone());
        log.resources.insert("leetcode".to_string(), 2);
        log.notes = "loop closure | pose graph".to_string();
        let mut deleted = PracticeLog::new(day, 99);
        deleted.deleted = true;
        let mut withdrawn = Application::new("Hooli", "MLE", day);
        withdrawn.deleted = true;

        Snapshot {
            daily_logs: vec![log, deleted],
            topics: vec![topic],
            applications: vec![Application::new("Acme", "ML Engineer", day), withdrawn],
            ..Snapshot::default()
        }
    }

    #[test]
    fn json_export_drops_tombstones() {
        let rendered = render_json_export(&sample()).unwrap();
        let parsed = Snapshot::from_json(&rendered).unwrap();
        assert_eq!(parsed.daily_logs.len(), 1);
        assert_eq!(parsed.applications.len(), 1);
        assert_eq!(parsed.topics.len(), 1);
    }

    #[test]
    fn markdown_export_renders_tables() {
        let rendered = render_markdown_export(&sample());
        assert!(rendered.contains("| 2024-04-02 | 40 | 2 | SLAM | loop closure \\| pose graph |"));
        assert!(rendered.contains("| Computer Vision | SLAM | 0 | never | no |"));
        assert!(rendered.contains("| Acme | ML Engineer | Applied | 2024-04-02 | 2024-04-02 |"));
        assert!(!rendered.contains("Hooli"));
        assert!(!rendered.contains("| 99 |"));
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "preptrack-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "preptrack-export-456.md"
        );
    }
}
