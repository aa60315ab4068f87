use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use statusboard_types::Priority;
use statusboard_types::api::{
    CreateNoteRequest, CreatePresetRequest, DaySchedule, ErrorResponse, MessageResponse, Note,
    PersonSchedule, Preset, ReplaceScheduleRequest, ScheduleEntry, UpdateNoteRequest,
    UpdatePresetRequest, UpsertDayRequest, WorkingHours,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed client for the status board REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket address of the relay on the same server.
    pub fn relay_url(&self) -> Result<String> {
        relay_url(&self.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -- Notes --

    pub async fn notes(&self) -> Result<Vec<Note>> {
        decode(self.http.get(self.url("/api/notes")).send().await?).await
    }

    pub async fn note(&self, id: i64) -> Result<Note> {
        decode(self.http.get(self.url(&format!("/api/notes/{}", id))).send().await?).await
    }

    pub async fn create_note(&self, message: &str, priority: Option<Priority>) -> Result<Note> {
        let body = CreateNoteRequest {
            message: message.to_string(),
            priority,
        };
        decode(self.http.post(self.url("/api/notes")).json(&body).send().await?).await
    }

    pub async fn update_note(&self, id: i64, update: &UpdateNoteRequest) -> Result<Note> {
        decode(
            self.http
                .put(self.url(&format!("/api/notes/{}", id)))
                .json(update)
                .send()
                .await?,
        )
        .await
    }

    pub async fn delete_note(&self, id: i64) -> Result<MessageResponse> {
        decode(self.http.delete(self.url(&format!("/api/notes/{}", id))).send().await?).await
    }

    pub async fn clear_notes(&self) -> Result<MessageResponse> {
        decode(self.http.delete(self.url("/api/notes")).send().await?).await
    }

    // -- Presets --

    pub async fn presets(&self) -> Result<Vec<Preset>> {
        decode(self.http.get(self.url("/api/presets")).send().await?).await
    }

    pub async fn preset(&self, id: i64) -> Result<Preset> {
        decode(self.http.get(self.url(&format!("/api/presets/{}", id))).send().await?).await
    }

    pub async fn create_preset(&self, text: &str, priority: Option<Priority>) -> Result<Preset> {
        let body = CreatePresetRequest {
            text: text.to_string(),
            priority,
        };
        decode(self.http.post(self.url("/api/presets")).json(&body).send().await?).await
    }

    pub async fn update_preset(&self, id: i64, update: &UpdatePresetRequest) -> Result<Preset> {
        decode(
            self.http
                .put(self.url(&format!("/api/presets/{}", id)))
                .json(update)
                .send()
                .await?,
        )
        .await
    }

    pub async fn delete_preset(&self, id: i64) -> Result<MessageResponse> {
        decode(self.http.delete(self.url(&format!("/api/presets/{}", id))).send().await?).await
    }

    // -- Working hours --

    pub async fn working_hours(&self) -> Result<WorkingHours> {
        decode(self.http.get(self.url("/api/working-hours")).send().await?).await
    }

    pub async fn person_schedule(&self, person: &str) -> Result<PersonSchedule> {
        decode(
            self.http
                .get(self.url(&format!("/api/working-hours/{}", person)))
                .send()
                .await?,
        )
        .await
    }

    pub async fn replace_schedule(
        &self,
        person: &str,
        schedule: BTreeMap<String, DaySchedule>,
    ) -> Result<PersonSchedule> {
        decode(
            self.http
                .put(self.url(&format!("/api/working-hours/{}", person)))
                .json(&ReplaceScheduleRequest {
                    schedule: Some(schedule),
                })
                .send()
                .await?,
        )
        .await
    }

    pub async fn upsert_day(
        &self,
        person: &str,
        day: &str,
        update: &UpsertDayRequest,
    ) -> Result<ScheduleEntry> {
        decode(
            self.http
                .put(self.url(&format!("/api/working-hours/{}/{}", person, day)))
                .json(update)
                .send()
                .await?,
        )
        .await
    }
}

/// Turn a response into `T`, or into an error carrying the server's
/// `{ "error": ... }` message.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json()
            .await
            .with_context(|| format!("decoding {} response", status));
    }

    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    match status {
        StatusCode::NOT_FOUND => bail!("not found: {}", message),
        StatusCode::BAD_REQUEST => bail!("rejected: {}", message),
        _ => bail!("server error ({}): {}", status.as_u16(), message),
    }
}

/// `http://host:3000/` -> `ws://host:3000/ws`
pub fn relay_url(base_url: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        bail!("server URL must start with http:// or https://, got '{}'", base_url);
    };
    Ok(format!("{}/ws", ws))
}
