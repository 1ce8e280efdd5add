//! HTTP client for the remote time-tracking directory.
//!
//! Speaks the v4 JSON envelope protocol: every response wraps its payload as
//! `{"response": {"status", "message"}, "data": ...}`, with HTTP 200 plus a
//! non-200 envelope status meaning "understood and refused". Requests carry
//! basic auth and a configured `User-Agent`, with an optional account id
//! segment in the path.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tsr_core::gateway::{
    DirectoryGateway, EventDraft, GatewayError, ProjectId, ProjectRecord, TaskId, TaskRecord,
};

/// Default request timeout for directory calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire format for instants, in the account's local time.
const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Client construction errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Username or password missing or blank.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },

    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Everything needed to reach the directory.
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://app.trackingtime.co/api/v4`.
    pub base_url: String,
    /// Optional account id inserted into the path after the root.
    pub account_id: Option<u64>,
    /// User that created tasks and events are attributed to.
    pub user_id: u64,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

/// Directory client.
///
/// Cloning shares the underlying connection pool. Calls are sequential from
/// the reconciliation driver's point of view; the client imposes no
/// concurrency of its own.
#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    account_id: Option<u64>,
    user_id: u64,
    username: String,
    password: String,
}

impl fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl DirectoryClient {
    /// Creates a client after validating credentials.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.username.trim().is_empty() {
            return Err(ClientError::InvalidCredentials {
                reason: "username cannot be empty",
            });
        }
        if config.password.trim().is_empty() {
            return Err(ClientError::InvalidCredentials {
                reason: "password cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(config.user_agent)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id,
            user_id: config.user_id,
            username: config.username,
            password: config.password,
        })
    }

    /// Lists every user in the account.
    pub async fn list_users(&self) -> Result<Vec<AccountUser>, GatewayError> {
        self.get_json("users", &[("filter", "ALL".to_string())])
            .await
    }

    fn endpoint(&self, path: &str) -> String {
        match self.account_id {
            Some(account) => format!("{}/{account}/{path}", self.base_url),
            None => format!("{}/{path}", self.base_url),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "directory GET");
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        decode_body(status, &body)
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        payload: &B,
    ) -> Result<(StatusCode, String), GatewayError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "directory POST");
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        Ok((status, body))
    }
}

#[async_trait]
impl DirectoryGateway for DirectoryClient {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, GatewayError> {
        let payload: Vec<ProjectPayload> = self
            .get_json("projects", &[("filter", "ALL".to_string())])
            .await?;
        Ok(payload.into_iter().map(ProjectPayload::into_record).collect())
    }

    async fn task_page(
        &self,
        project: ProjectId,
        page: usize,
        page_size: usize,
        include_archived: bool,
    ) -> Result<Vec<TaskRecord>, GatewayError> {
        let filter = if include_archived { "ALL" } else { "ACTIVE" };
        let payload: Vec<TaskPayload> = self
            .get_json(
                "tasks",
                &[
                    ("filter", filter.to_string()),
                    ("project_id", project.to_string()),
                    ("page", page.to_string()),
                    ("page_size", page_size.to_string()),
                ],
            )
            .await?;
        Ok(payload.into_iter().map(TaskPayload::into_record).collect())
    }

    async fn create_task(&self, project: ProjectId, name: &str) -> Result<TaskId, GatewayError> {
        let payload = NewTask {
            name,
            project_id: project.0,
            user_id: self.user_id,
        };
        let (status, body) = self.post_json("tasks/add", &payload).await?;
        let created: CreatedTask = decode_body(status, &body)?;
        Ok(TaskId(created.id))
    }

    async fn create_event(&self, event: &EventDraft) -> Result<(), GatewayError> {
        let payload = NewEvent {
            task_id: event.task.0,
            user_id: self.user_id,
            start: event.start.format(INSTANT_FORMAT).to_string(),
            end: event.end.format(INSTANT_FORMAT).to_string(),
            duration: (event.end - event.start).num_seconds(),
            notes: event.notes.as_deref(),
        };
        let (status, body) = self.post_json("events/add", &payload).await?;
        decode_ack(status, &body)
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

/// Standard response wrapper around every directory payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: ResponseStatus,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    status: u32,
    #[serde(default)]
    message: Option<String>,
}

/// Unwraps an envelope, requiring a data payload.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, GatewayError> {
    let envelope: Envelope<T> = decode_envelope(status, body)?;
    envelope
        .data
        .ok_or_else(|| GatewayError::InvalidResponse("missing data payload".to_string()))
}

/// Unwraps an envelope where only the status matters.
fn decode_ack(status: StatusCode, body: &str) -> Result<(), GatewayError> {
    decode_envelope::<serde_json::Value>(status, body).map(|_| ())
}

fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Envelope<T>, GatewayError> {
    if !status.is_success() {
        return Err(GatewayError::Rejected(format!("HTTP {status}: {body}")));
    }
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
    if envelope.response.status != 200 {
        let message = envelope
            .response
            .message
            .unwrap_or_else(|| format!("remote status {}", envelope.response.status));
        return Err(GatewayError::Rejected(message));
    }
    Ok(envelope)
}

#[derive(Debug, Deserialize)]
struct ProjectPayload {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_archived: bool,
}

impl ProjectPayload {
    fn into_record(self) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId(self.id),
            name: self.name,
            archived: self.is_archived,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskPayload {
    id: u64,
    #[serde(default)]
    name: String,
}

impl TaskPayload {
    fn into_record(self) -> TaskRecord {
        TaskRecord {
            id: TaskId(self.id),
            name: self.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    id: u64,
}

#[derive(Debug, Serialize)]
struct NewTask<'a> {
    name: &'a str,
    project_id: u64,
    user_id: u64,
}

#[derive(Debug, Serialize)]
struct NewEvent<'a> {
    task_id: u64,
    user_id: u64,
    start: String,
    end: String,
    /// Whole seconds between start and end.
    duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

/// A user in the account, as the `users` listing reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}
