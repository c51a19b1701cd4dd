use preptrack_core::services::TrackerService;
use preptrack_core::stats::Dashboard;
use preptrack_core::util;

use crate::error::CliError;

pub async fn run_stats(as_json: bool, service: &TrackerService) -> Result<(), CliError> {
    let dashboard = service.dashboard(util::today()).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        for line in format_dashboard(&dashboard) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_dashboard(dashboard: &Dashboard) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Today          {} / {} min",
            dashboard.minutes_today, dashboard.daily_goal_minutes
        ),
        format!(
            "This week      {:.1} / {} h, {} topic(s)",
            dashboard.weekly_hours, dashboard.weekly_goal_hours, dashboard.weekly_topics
        ),
        format!(
            "Streak         {} day(s), best {}",
            dashboard.current_streak, dashboard.longest_streak
        ),
        format!("Questions      {}", dashboard.total_questions),
        format!(
            "Applications   {} this month",
            dashboard.applications_this_month
        ),
    ];

    match dashboard.days_until_target {
        Some(days) if days >= 0 => lines.push(format!("Target         {days} day(s) left")),
        Some(days) => lines.push(format!("Target         passed {} day(s) ago", -days)),
        None => {}
    }

    if !dashboard.recommended.is_empty() {
        lines.push("Practice next".to_string());
        for topic in &dashboard.recommended {
            let last = topic
                .last_practiced
                .map_or_else(|| "never practiced".to_string(), |day| format!("last {day}"));
            lines.push(format!("  - {} ({}, {last})", topic.name, topic.category));
        }
    }

    lines
}
