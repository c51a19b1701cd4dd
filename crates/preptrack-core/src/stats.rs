//! Dashboard numbers derived from practice logs, topics and applications.
//!
//! Callers pass visible records only; tombstones are not filtered here.

use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Application, PracticeLog, Settings, Topic};
use crate::util::days_between;

const RECENT_WINDOW_DAYS: i64 = 14;
const NEVER_PRACTICED_SCORE: i64 = -1000;
const NOT_RECENT_PENALTY: i64 = 100;
const RECENCY_WEIGHT: i64 = 5;

/// Sunday on or before `day`
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

/// Consecutive practiced days ending today; zero when nothing was logged today
pub fn current_streak(logs: &[PracticeLog], today: NaiveDate) -> u32 {
    let days = logs.iter().map(|log| log.date).collect::<HashSet<_>>();

    let mut streak = 0;
    let mut expected = today;
    while days.contains(&expected) {
        streak += 1;
        match expected.pred_opt() {
            Some(previous) => expected = previous,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive practiced days ever
pub fn longest_streak(logs: &[PracticeLog]) -> u32 {
    let days = logs.iter().map(|log| log.date).collect::<BTreeSet<_>>();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        run = match previous {
            Some(prev) if days_between(prev, day) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

pub fn minutes_on(logs: &[PracticeLog], day: NaiveDate) -> u32 {
    logs.iter()
        .filter(|log| log.date == day)
        .map(|log| log.minutes_spent)
        .sum()
}

/// Hours logged from Sunday through `today`
pub fn weekly_hours(logs: &[PracticeLog], today: NaiveDate) -> f64 {
    let start = week_start(today);
    let minutes: u32 = logs
        .iter()
        .filter(|log| log.date >= start && log.date <= today)
        .map(|log| log.minutes_spent)
        .sum();
    f64::from(minutes) / 60.0
}

pub fn total_questions(logs: &[PracticeLog]) -> u32 {
    logs.iter().map(PracticeLog::question_count).sum()
}

/// Distinct topics touched from Sunday through `today`
pub fn weekly_topic_count(logs: &[PracticeLog], today: NaiveDate) -> usize {
    let start = week_start(today);
    logs.iter()
        .filter(|log| log.date >= start && log.date <= today)
        .flat_map(|log| log.topics.iter())
        .collect::<HashSet<_>>()
        .len()
}

/// Days left until the target date; negative once it has passed
pub fn days_until_target(settings: &Settings, today: NaiveDate) -> Option<i64> {
    settings
        .target_date()
        .map(|target| (target - today).num_days())
}

pub fn applications_this_month(applications: &[Application], today: NaiveDate) -> usize {
    applications
        .iter()
        .filter(|application| {
            application.date_applied.year() == today.year()
                && application.date_applied.month() == today.month()
        })
        .count()
}

/// Priority score; lower means practice sooner.
pub fn recommendation_score(topic: &Topic, today: NaiveDate) -> i64 {
    let count = i64::from(topic.practice_count);
    match topic.last_practiced {
        None => NEVER_PRACTICED_SCORE,
        Some(last) if last < today - Duration::days(RECENT_WINDOW_DAYS) => count - NOT_RECENT_PENALTY,
        Some(last) => count - (RECENT_WINDOW_DAYS - days_between(last, today)) * RECENCY_WEIGHT,
    }
}

/// Up to `limit` open topics, most in need of practice first
pub fn recommended_topics(topics: &[Topic], today: NaiveDate, limit: usize) -> Vec<Topic> {
    let mut scored = topics
        .iter()
        .filter(|topic| !topic.completed)
        .map(|topic| (recommendation_score(topic, today), topic))
        .collect::<Vec<_>>();
    scored.sort_by_key(|(score, _)| *score);
    scored
        .into_iter()
        .take(limit)
        .map(|(_, topic)| topic.clone())
        .collect()
}

/// Everything the dashboard shows, computed for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub today: NaiveDate,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub minutes_today: u32,
    pub daily_goal_minutes: u64,
    pub weekly_hours: f64,
    pub weekly_goal_hours: f64,
    pub total_questions: u32,
    pub weekly_topics: usize,
    pub days_until_target: Option<i64>,
    pub applications_this_month: usize,
    pub recommended: Vec<Topic>,
}

impl Dashboard {
    pub fn compute(
        logs: &[PracticeLog],
        topics: &[Topic],
        applications: &[Application],
        settings: &Settings,
        today: NaiveDate,
    ) -> Self {
        Self {
            today,
            current_streak: current_streak(logs, today),
            longest_streak: longest_streak(logs),
            minutes_today: minutes_on(logs, today),
            daily_goal_minutes: settings.daily_goal_minutes(),
            weekly_hours: weekly_hours(logs, today),
            weekly_goal_hours: settings.weekly_goal_hours(),
            total_questions: total_questions(logs),
            weekly_topics: weekly_topic_count(logs, today),
            days_until_target: days_until_target(settings, today),
            applications_this_month: applications_this_month(applications, today),
            recommended: recommended_topics(topics, today, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use serde_json::json;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn log_on(day: NaiveDate, minutes: u32) -> PracticeLog {
        PracticeLog::new(day, minutes)
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-04-10 is a Wednesday
        assert_eq!(week_start(date(4, 10)), date(4, 7));
        assert_eq!(week_start(date(4, 7)), date(4, 7));
    }

    #[test]
    fn current_streak_counts_unique_days_back_from_today() {
        let logs = vec![
            log_on(date(4, 10), 10),
            log_on(date(4, 10), 20),
            log_on(date(4, 9), 30),
            log_on(date(4, 8), 30),
            log_on(date(4, 6), 30),
        ];
        assert_eq!(current_streak(&logs, date(4, 10)), 3);
        assert_eq!(current_streak(&logs, date(4, 11)), 0);
        assert_eq!(current_streak(&[], date(4, 11)), 0);
    }

    #[test]
    fn longest_streak_finds_best_run() {
        let logs = vec![
            log_on(date(4, 1), 10),
            log_on(date(4, 2), 10),
            log_on(date(4, 5), 10),
            log_on(date(4, 6), 10),
            log_on(date(4, 7), 10),
            log_on(date(4, 7), 10),
        ];
        assert_eq!(longest_streak(&logs), 3);
        assert_eq!(longest_streak(&[]), 0);
    }

    #[test]
    fn weekly_totals_ignore_previous_week() {
        let mut monday = log_on(date(4, 8), 90);
        monday.resources.insert("leetcode".to_string(), 3);
        monday.topics.insert(RecordId::from("t1"));
        let mut saturday_before = log_on(date(4, 6), 60);
        saturday_before.resources.insert("kaggle".to_string(), 2);
        saturday_before.topics.insert(RecordId::from("t2"));
        let logs = vec![monday, saturday_before];

        assert!((weekly_hours(&logs, date(4, 10)) - 1.5).abs() < f64::EPSILON);
        assert_eq!(weekly_topic_count(&logs, date(4, 10)), 1);
        assert_eq!(total_questions(&logs), 5);
        assert_eq!(minutes_on(&logs, date(4, 8)), 90);
    }

    #[test]
    fn days_until_target_is_signed() {
        let settings: Settings = serde_json::from_value(json!({"targetDate": "2024-04-20"})).unwrap();
        assert_eq!(days_until_target(&settings, date(4, 10)), Some(10));
        assert_eq!(days_until_target(&settings, date(4, 25)), Some(-5));
        assert_eq!(days_until_target(&Settings::initial(), date(4, 10)), None);
    }

    #[test]
    fn applications_this_month_matches_year_and_month() {
        let applications = vec![
            Application::new("Acme", "MLE", date(4, 2)),
            Application::new("Initech", "DS", date(3, 30)),
            Application::new("Hooli", "MLE", NaiveDate::from_ymd_opt(2023, 4, 2).unwrap()),
        ];
        assert_eq!(applications_this_month(&applications, date(4, 10)), 1);
    }

    #[test]
    fn recommendations_prefer_never_then_neglected_topics() {
        let today = date(4, 30);
        let never = Topic::new("Computer Vision", "SLAM");
        let mut neglected = Topic::new("Computer Vision", "Camera Calibration");
        neglected.practice_count = 8;
        neglected.last_practiced = Some(date(4, 1));
        let mut recent = Topic::new("NLP & LLMs", "RLHF");
        recent.practice_count = 1;
        recent.last_practiced = Some(date(4, 29));
        let mut done = Topic::new("NLP & LLMs", "DPO");
        done.completed = true;

        assert_eq!(recommendation_score(&never, today), -1000);
        assert_eq!(recommendation_score(&neglected, today), -92);
        assert_eq!(recommendation_score(&recent, today), 1 - 13 * 5);

        let picks = recommended_topics(&[recent, neglected, done, never], today, 2);
        let names = picks.iter().map(|topic| topic.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["SLAM", "Camera Calibration"]);
    }

    #[test]
    fn dashboard_uses_settings_goals() {
        let settings: Settings =
            serde_json::from_value(json!({"dailyGoalMinutes": 45, "weeklyGoalHours": 10})).unwrap();
        let logs = vec![log_on(date(4, 10), 50)];
        let dashboard = Dashboard::compute(&logs, &[], &[], &settings, date(4, 10));

        assert_eq!(dashboard.daily_goal_minutes, 45);
        assert!((dashboard.weekly_goal_hours - 10.0).abs() < f64::EPSILON);
        assert_eq!(dashboard.minutes_today, 50);
        assert_eq!(dashboard.current_streak, 1);
        assert!(dashboard.recommended.is_empty());
    }
}
