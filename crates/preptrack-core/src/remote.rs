//! Remote snapshot transport.
//!
//! One row per user id holds the whole snapshot. [`SupabaseRemote`] speaks
//! PostgREST to a Supabase table with `user_id`, `data` and `updated_at`
//! columns.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemoteEndpoint;
use crate::models::Snapshot;
use crate::util::compact_text;

const REMOTE_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

impl TransportError {
    /// The remote could not be reached at all
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Http(error) if error.is_connect() || error.is_timeout())
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Row-level access to the remote snapshot store.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// The stored snapshot, or `None` when no row exists yet
    async fn fetch_record(&self, user_id: &str) -> TransportResult<Option<Snapshot>>;

    /// Create or replace the row for `user_id`
    async fn upsert_record(&self, user_id: &str, snapshot: &Snapshot) -> TransportResult<()>;
}

impl<T: RemoteStore> RemoteStore for std::sync::Arc<T> {
    async fn fetch_record(&self, user_id: &str) -> TransportResult<Option<Snapshot>> {
        (**self).fetch_record(user_id).await
    }

    async fn upsert_record(&self, user_id: &str, snapshot: &Snapshot) -> TransportResult<()> {
        (**self).upsert_record(user_id, snapshot).await
    }
}

/// Supabase (PostgREST) implementation of [`RemoteStore`].
#[derive(Clone)]
pub struct SupabaseRemote {
    endpoint: RemoteEndpoint,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UserDataRow {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    user_id: &'a str,
    data: &'a Snapshot,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
    hint: Option<String>,
}

impl SupabaseRemote {
    pub fn new(endpoint: RemoteEndpoint) -> TransportResult<Self> {
        if endpoint.base_url.is_empty() || endpoint.anon_key.is_empty() {
            return Err(TransportError::InvalidConfiguration(
                "Supabase URL and anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REMOTE_HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.endpoint.base_url,
            urlencoding::encode(&self.endpoint.table)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.endpoint.anon_key)
            .bearer_auth(&self.endpoint.anon_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

impl RemoteStore for SupabaseRemote {
    async fn fetch_record(&self, user_id: &str) -> TransportResult<Option<Snapshot>> {
        let url = format!(
            "{}?user_id=eq.{}&select=data",
            self.table_url(),
            urlencoding::encode(user_id)
        );
        let response = self.authorized(self.client.get(url)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let body = response.text().await?;
        parse_fetch_body(&body)
    }

    async fn upsert_record(&self, user_id: &str, snapshot: &Snapshot) -> TransportResult<()> {
        let url = format!("{}?on_conflict=user_id", self.table_url());
        let row = UpsertRow {
            user_id,
            data: snapshot,
            updated_at: crate::util::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };

        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        tracing::debug!("Upserted snapshot for user {user_id}");
        Ok(())
    }
}

/// Decode a `select=data` response; an empty array means no row.
fn parse_fetch_body(body: &str) -> TransportResult<Option<Snapshot>> {
    let rows: Vec<UserDataRow> = serde_json::from_str(body)
        .map_err(|error| TransportError::InvalidPayload(format!("expected row array: {error}")))?;

    let Some(data) = rows.into_iter().next().and_then(|row| row.data) else {
        return Ok(None);
    };
    if data.is_null() {
        return Ok(None);
    }

    Snapshot::from_value(data)
        .map(Some)
        .map_err(|error| TransportError::InvalidPayload(format!("malformed snapshot: {error}")))
}

fn api_error(status: StatusCode, body: &str) -> TransportError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| {
            let message = payload.message.or(payload.error)?;
            Some(match payload.hint {
                Some(hint) if !hint.trim().is_empty() => format!("{} ({})", message.trim(), hint.trim()),
                _ => message.trim().to_string(),
            })
        })
        .unwrap_or_else(|| {
            let trimmed = compact_text(body);
            if trimmed.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                trimmed
            }
        });

    TransportError::Api {
        status: status.as_u16(),
        message,
    }
}
