//! User settings model

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DAILY_GOAL_MINUTES: &str = "dailyGoalMinutes";
const WEEKLY_GOAL_HOURS: &str = "weeklyGoalHours";
const TARGET_DATE: &str = "targetDate";
const AUTHORIZED_DEVICES: &str = "authorizedDevices";

const DEFAULT_DAILY_GOAL_MINUTES: u64 = 30;
const DEFAULT_WEEKLY_GOAL_HOURS: u32 = 14;

/// Flat option -> value mapping, synchronized as a whole.
///
/// Keys this crate does not know about are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

/// Keys to overwrite in the current settings.
pub type SettingsPatch = BTreeMap<String, Value>;

impl Settings {
    /// Settings written on first run
    #[must_use]
    pub fn initial() -> Self {
        let mut values = BTreeMap::new();
        values.insert(
            WEEKLY_GOAL_HOURS.to_string(),
            Value::from(DEFAULT_WEEKLY_GOAL_HOURS),
        );
        values.insert(
            DAILY_GOAL_MINUTES.to_string(),
            Value::from(DEFAULT_DAILY_GOAL_MINUTES),
        );
        Self(values)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Shallow union where `self` wins on key collisions
    #[must_use]
    pub fn union_preferring_self(&self, other: &Self) -> Self {
        let mut merged = other.0.clone();
        merged.extend(self.0.iter().map(|(key, value)| (key.clone(), value.clone())));
        Self(merged)
    }

    /// Daily practice goal in minutes
    #[must_use]
    pub fn daily_goal_minutes(&self) -> u64 {
        self.get(DAILY_GOAL_MINUTES)
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_DAILY_GOAL_MINUTES)
    }

    /// Weekly practice goal in hours
    #[must_use]
    pub fn weekly_goal_hours(&self) -> f64 {
        self.get(WEEKLY_GOAL_HOURS)
            .and_then(Value::as_f64)
            .unwrap_or_else(|| f64::from(DEFAULT_WEEKLY_GOAL_HOURS))
    }

    /// Milestone date, if one is set and well-formed
    #[must_use]
    pub fn target_date(&self) -> Option<NaiveDate> {
        self.get(TARGET_DATE)
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
    }

    /// Device ids allowed to sync this dataset
    #[must_use]
    pub fn authorized_devices(&self) -> Vec<String> {
        self.get(AUTHORIZED_DEVICES)
            .and_then(Value::as_array)
            .map(|devices| {
                devices
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FromIterator<(String, Value)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_initial() {
        let settings = Settings::initial();
        assert_eq!(settings.daily_goal_minutes(), 30);
        assert!((settings.weekly_goal_hours() - 14.0).abs() < f64::EPSILON);
        assert!(settings.target_date().is_none());
    }

    #[test]
    fn test_accessors_fall_back_on_malformed_values() {
        let settings: Settings = serde_json::from_value(json!({
            "dailyGoalMinutes": "lots",
            "targetDate": "2024-06-01",
            "authorizedDevices": ["laptop", 3, "phone"]
        }))
        .unwrap();
        assert_eq!(settings.daily_goal_minutes(), 30);
        assert_eq!(
            settings.target_date(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(settings.authorized_devices(), vec!["laptop", "phone"]);
    }

    #[test]
    fn test_union_preferring_self_keeps_local_values() {
        let local: Settings = serde_json::from_value(json!({"dailyGoalMinutes": 45})).unwrap();
        let remote: Settings = serde_json::from_value(json!({
            "dailyGoalMinutes": 20,
            "targetDate": "2024-06-01"
        }))
        .unwrap();
        let merged = local.union_preferring_self(&remote);
        assert_eq!(merged.daily_goal_minutes(), 45);
        assert!(merged.target_date().is_some());
    }
}
