//! Remote directory contract.
//!
//! The engine only ever sees this trait; the HTTP client lives in
//! `tsr-remote` and mocks live in tests. The acting user is a construction
//! concern of the implementation, not a per-call parameter.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote project identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A project as the remote directory reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub archived: bool,
}

/// A task as the remote directory reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
}

/// A time-tracking event to be created remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub task: TaskId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub notes: Option<String>,
}

/// Failures crossing the gateway boundary.
///
/// None of these abort a reconciliation run; the driver reports the affected
/// entry and moves on.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a decodable response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote understood the request and said no.
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// The response arrived but did not have the expected shape.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Paginated, fallible read/write operations against the remote directory.
///
/// `task_page` is a single page fetch; the resolver owns the loop and its
/// termination (a page shorter than `page_size` is the last one).
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// Lists every project in the account.
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, GatewayError>;

    /// Fetches one page of a project's tasks.
    async fn task_page(
        &self,
        project: ProjectId,
        page: usize,
        page_size: usize,
        include_archived: bool,
    ) -> Result<Vec<TaskRecord>, GatewayError>;

    /// Creates a task in the given project, returning its new identifier.
    async fn create_task(&self, project: ProjectId, name: &str) -> Result<TaskId, GatewayError>;

    /// Creates a time-tracking event.
    async fn create_event(&self, event: &EventDraft) -> Result<(), GatewayError>;
}
