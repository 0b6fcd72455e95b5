use super::{RUNS_TABLE, RunStore, StoreError};
use crate::models::Run;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

/// Postgres error code for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by the PostgREST gateway.
#[derive(Debug, Default, Deserialize)]
struct GatewayError {
    code: Option<String>,
    message: Option<String>,
}

/// Run table hosted behind a Supabase REST endpoint.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{RUNS_TABLE}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

impl RunStore for SupabaseStore {
    async fn query(&self) -> Result<Vec<Run>, StoreError> {
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "date,kilometers"), ("order", "date.desc")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(gateway_error(status, &body));
        }

        let runs: Vec<Run> = serde_json::from_str(&body)?;
        debug!("fetched {} runs from {}", runs.len(), self.base_url);
        Ok(runs)
    }

    async fn insert(&self, run: Run) -> Result<Run, StoreError> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&[&run])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(gateway_error(status, &body));
        }

        let mut inserted: Vec<Run> = serde_json::from_str(&body)?;
        if inserted.is_empty() {
            return Err(StoreError::Rejected("insert returned no rows".into()));
        }
        Ok(inserted.swap_remove(0))
    }
}

fn gateway_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: GatewayError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("{status}: {}", body.trim()));

    if parsed.code.as_deref() == Some(UNIQUE_VIOLATION) {
        return StoreError::Duplicate(message);
    }
    warn!("store rejected request with {status}: {message}");
    StoreError::Rejected(message)
}
