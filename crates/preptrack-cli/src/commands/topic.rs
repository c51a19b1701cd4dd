use std::collections::BTreeMap;

use preptrack_core::models::Topic;
use preptrack_core::services::TrackerService;

use crate::cli::TopicCommands;
use crate::commands::common::{format_topic_lines, resolve_topic};
use crate::error::CliError;

pub async fn run_topic(command: TopicCommands, service: &TrackerService) -> Result<(), CliError> {
    match command {
        TopicCommands::List {
            category,
            open,
            json,
        } => {
            let topics = filter_topics(service.list_topics().await?, category.as_deref(), open);
            if json {
                println!("{}", serde_json::to_string_pretty(&topics)?);
                return Ok(());
            }
            if topics.is_empty() {
                println!("No topics match.");
                return Ok(());
            }
            for (category, topics) in group_by_category(&topics) {
                println!("{category}");
                for line in format_topic_lines(&topics) {
                    println!("  {line}");
                }
            }
        }
        TopicCommands::Complete { topic, undo } => {
            let target = resolve_topic(&topic, &service.list_topics().await?)?;
            service.set_topic_completed(&target.id, !undo).await?;
            if undo {
                println!("Moved '{}' back to practice", target.name);
            } else {
                println!("Moved '{}' to casual revision", target.name);
            }
        }
        TopicCommands::Recompute => {
            let topics = service.recompute_topic_stats().await?;
            let practiced = topics.iter().filter(|topic| topic.practice_count > 0).count();
            println!("Recomputed stats for {} topics ({practiced} practiced)", topics.len());
        }
    }

    Ok(())
}

pub fn filter_topics(topics: Vec<Topic>, category: Option<&str>, open_only: bool) -> Vec<Topic> {
    topics
        .into_iter()
        .filter(|topic| category.map_or(true, |wanted| topic.category.eq_ignore_ascii_case(wanted)))
        .filter(|topic| !open_only || !topic.completed)
        .collect()
}

fn group_by_category(topics: &[Topic]) -> BTreeMap<&str, Vec<Topic>> {
    let mut groups = BTreeMap::<&str, Vec<Topic>>::new();
    for topic in topics {
        groups.entry(&topic.category).or_default().push(topic.clone());
    }
    groups
}
