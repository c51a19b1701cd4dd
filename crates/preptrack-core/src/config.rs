//! Remote sync configuration.
//!
//! The Supabase URL and anon key are public client values; nothing secret is
//! stored here.

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

/// Default PostgREST table holding one snapshot row per user.
pub const DEFAULT_TABLE: &str = "user_data";

/// How a sync reconciles local and remote data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Record-level merge of both snapshots
    #[default]
    Merge,
    /// Whole-snapshot replace, newest `lastModified` wins
    LastModified,
}

/// Remote settings as written in a profile or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    /// Row key shared by every device of one user
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sync_mode: SyncMode,
}

/// Validated connection details for the remote row store.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub base_url: String,
    pub anon_key: String,
    pub table: String,
}

impl std::fmt::Debug for RemoteEndpoint {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteEndpoint")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .field("table", &self.table)
            .finish()
    }
}

impl RemoteConfig {
    /// Both the URL and the anon key are present
    pub fn is_configured(&self) -> bool {
        normalize_text_option(self.supabase_url.clone()).is_some()
            && normalize_text_option(self.supabase_anon_key.clone()).is_some()
    }

    /// Table name, falling back to [`DEFAULT_TABLE`]
    pub fn table_name(&self) -> String {
        normalize_text_option(self.table.clone()).unwrap_or_else(|| DEFAULT_TABLE.to_string())
    }

    /// Explicit user id, if one is configured
    pub fn configured_user_id(&self) -> Option<String> {
        normalize_text_option(self.user_id.clone())
    }

    /// Validate and normalize into an endpoint.
    pub fn endpoint(&self) -> Result<RemoteEndpoint, String> {
        let base_url = normalize_text_option(self.supabase_url.clone())
            .ok_or_else(|| "supabase_url is required".to_string())?;
        if !is_http_url(&base_url) {
            return Err("supabase_url must include http:// or https://".to_string());
        }
        let anon_key = normalize_text_option(self.supabase_anon_key.clone())
            .ok_or_else(|| "supabase_anon_key is required".to_string())?;

        Ok(RemoteEndpoint {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            table: self.table_name(),
        })
    }

    /// Fill fields that are still empty from `other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            supabase_url: normalize_text_option(self.supabase_url)
                .or_else(|| normalize_text_option(other.supabase_url)),
            supabase_anon_key: normalize_text_option(self.supabase_anon_key)
                .or_else(|| normalize_text_option(other.supabase_anon_key)),
            table: normalize_text_option(self.table).or_else(|| normalize_text_option(other.table)),
            user_id: normalize_text_option(self.user_id)
                .or_else(|| normalize_text_option(other.user_id)),
            sync_mode: self.sync_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RemoteConfig {
        RemoteConfig {
            supabase_url: Some(" https://demo.supabase.co/ ".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn is_configured_requires_url_and_key() {
        assert!(!RemoteConfig::default().is_configured());
        assert!(configured().is_configured());

        let blank_key = RemoteConfig {
            supabase_anon_key: Some("  ".to_string()),
            ..configured()
        };
        assert!(!blank_key.is_configured());
    }

    #[test]
    fn endpoint_normalizes_url_and_defaults_table() {
        let endpoint = configured().endpoint().unwrap();
        assert_eq!(endpoint.base_url, "https://demo.supabase.co");
        assert_eq!(endpoint.table, DEFAULT_TABLE);
        assert!(!format!("{endpoint:?}").contains("anon\""));
    }

    #[test]
    fn endpoint_rejects_non_http_url() {
        let config = RemoteConfig {
            supabase_url: Some("demo.supabase.co".to_string()),
            ..configured()
        };
        assert!(config.endpoint().unwrap_err().contains("http://"));
    }

    #[test]
    fn or_prefers_self_and_fills_gaps() {
        let from_env = RemoteConfig {
            user_id: Some("shared".to_string()),
            supabase_url: Some("https://override.example".to_string()),
            ..RemoteConfig::default()
        };
        let merged = from_env.or(configured());
        assert_eq!(merged.supabase_url.as_deref(), Some("https://override.example"));
        assert_eq!(merged.supabase_anon_key.as_deref(), Some("anon"));
        assert_eq!(merged.configured_user_id().as_deref(), Some("shared"));
    }

    #[test]
    fn sync_mode_defaults_to_merge() {
        let config: RemoteConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.sync_mode, SyncMode::Merge);

        let legacy: RemoteConfig =
            serde_json::from_str(r#"{"sync_mode":"last-modified"}"#).unwrap();
        assert_eq!(legacy.sync_mode, SyncMode::LastModified);
    }
}
