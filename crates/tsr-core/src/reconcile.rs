//! Entry resolution and reconciliation against the remote directory.
//!
//! One run owns one [`ReconcileContext`]: a project directory snapshotted at
//! the start, a lazily-filled per-project task index, and the task creation
//! cache that keeps duplicate lines from creating duplicate remote tasks.
//! Nothing here survives the run.

use std::collections::HashMap;

use crate::entry::WorkEntry;
use crate::gateway::{
    DirectoryGateway, EventDraft, GatewayError, ProjectId, TaskId, TaskRecord,
};
use crate::parser::{DocumentParser, LineOutcome, ParseCause, ParseSkip};

/// Tasks fetched per page when filling the task index.
pub const DEFAULT_TASK_PAGE_SIZE: usize = 100;

/// Upper bound on page round-trips per project, in case the remote never
/// serves a short page.
pub const MAX_TASK_PAGES: usize = 50;

/// Why an entry or line produced no remote event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A time range appeared before any project line.
    MissingProject,
    /// The time range did not describe a usable interval.
    MalformedTimeRange,
    /// The project name has no case-insensitive match in the directory.
    UnresolvedProject,
    /// No remote task matched the task line.
    UnresolvedTask,
    /// The remote task listing could not be fetched.
    RemoteFetchFailure(String),
    /// The remote refused to create a task or event.
    RemoteCreateFailure(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingProject => write!(f, "no project in scope"),
            Self::MalformedTimeRange => write!(f, "malformed time range"),
            Self::UnresolvedProject => write!(f, "project not found in remote directory"),
            Self::UnresolvedTask => write!(f, "no remote task matches"),
            Self::RemoteFetchFailure(cause) => write!(f, "failed to fetch remote tasks: {cause}"),
            Self::RemoteCreateFailure(cause) => write!(f, "remote creation failed: {cause}"),
        }
    }
}

impl From<ParseCause> for SkipReason {
    fn from(cause: ParseCause) -> Self {
        match cause {
            ParseCause::MissingProject => Self::MissingProject,
            ParseCause::MalformedTimeRange => Self::MalformedTimeRange,
        }
    }
}

/// One skipped line or entry, for the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based line number in the document.
    pub line: usize,
    /// What was skipped: the raw line, or `project / task / description`.
    pub subject: String,
    pub reason: SkipReason,
}

/// Outcome counts for a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries the parser produced.
    pub entries: usize,
    /// Remote tasks created (two-level documents only).
    pub tasks_created: usize,
    /// Remote events created.
    pub events_created: usize,
    /// Everything that produced no event, with its reason.
    pub skipped: Vec<SkippedEntry>,
}

/// Run-scoped lookup state. Discarded when the run ends.
#[derive(Debug, Default)]
struct ReconcileContext {
    /// Lower-cased, trimmed project name -> id. Snapshotted once per run.
    projects: HashMap<String, ProjectId>,
    /// Project id -> full remote task list, filled on first reference.
    task_index: HashMap<ProjectId, Vec<TaskRecord>>,
    /// (project, description) -> task created this run. At most one remote
    /// creation per distinct key, however many lines repeat it.
    created_tasks: HashMap<(ProjectId, String), TaskId>,
}

impl ReconcileContext {
    fn snapshot_projects(&mut self, records: Vec<crate::gateway::ProjectRecord>) {
        for record in records {
            let name = record.name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            self.projects.insert(name, record.id);
        }
    }

    fn resolve_project(&self, name: &str) -> Option<ProjectId> {
        self.projects.get(&name.trim().to_lowercase()).copied()
    }
}

/// Fetches a project's complete task list, page by page.
///
/// Stops at the first page shorter than `page_size`; a remote that always
/// serves full pages is cut off at [`MAX_TASK_PAGES`].
pub async fn fetch_project_tasks<G: DirectoryGateway>(
    gateway: &G,
    project: ProjectId,
    page_size: usize,
) -> Result<Vec<TaskRecord>, GatewayError> {
    let mut tasks = Vec::new();
    for page in 0..MAX_TASK_PAGES {
        let batch = gateway.task_page(project, page, page_size, true).await?;
        let last = batch.len() < page_size;
        tasks.extend(batch);
        if last {
            return Ok(tasks);
        }
    }
    tracing::warn!(
        %project,
        pages = MAX_TASK_PAGES,
        "task listing hit the page cap, matching against what arrived"
    );
    Ok(tasks)
}

/// First task in remote order satisfying any clause of the substring
/// heuristic: task text within the candidate name, candidate name within the
/// task text, or the entry description within the candidate name.
///
/// The clause order and first-match-wins policy are load-bearing; changing
/// either silently changes which task wins when several match.
fn match_task(tasks: &[TaskRecord], task_text: &str, description: &str) -> Option<TaskId> {
    let wanted = task_text.trim().to_lowercase();
    let description = description.trim().to_lowercase();
    tasks
        .iter()
        .find(|candidate| {
            let name = candidate.name.to_lowercase();
            name.contains(&wanted) || wanted.contains(&name) || name.contains(&description)
        })
        .map(|candidate| candidate.id)
}

/// Single-pass reconciliation driver.
///
/// Feeds the document to the parser line by line and, for every emitted
/// entry, resolves remote identifiers and creates the event. No entry
/// failure is fatal: each skip is logged and counted, and the run continues
/// with the next line.
#[derive(Debug)]
pub struct Reconciler<'g, G> {
    gateway: &'g G,
    page_size: usize,
    ctx: ReconcileContext,
    report: ReconcileReport,
}

impl<'g, G: DirectoryGateway> Reconciler<'g, G> {
    #[must_use]
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            page_size: DEFAULT_TASK_PAGE_SIZE,
            ctx: ReconcileContext::default(),
            report: ReconcileReport::default(),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reconciles one document against the remote directory.
    pub async fn run(mut self, document: &str) -> ReconcileReport {
        match self.gateway.list_projects().await {
            Ok(records) => self.ctx.snapshot_projects(records),
            Err(err) => {
                // Same degraded behavior as an empty account: every entry
                // will skip as unresolved rather than aborting the run.
                tracing::warn!(%err, "could not list remote projects");
            }
        }

        let mut parser = DocumentParser::new();
        for (idx, line) in document.lines().enumerate() {
            match parser.feed(line) {
                LineOutcome::Consumed => {}
                LineOutcome::Skipped(skip) => self.record_parse_skip(skip),
                LineOutcome::Entry(entry) => {
                    self.report.entries += 1;
                    if let Err(reason) = self.apply(&entry).await {
                        self.record_entry_skip(idx + 1, &entry, reason);
                    }
                }
            }
        }
        self.report
    }

    async fn apply(&mut self, entry: &WorkEntry) -> Result<(), SkipReason> {
        let project = self
            .ctx
            .resolve_project(&entry.project)
            .ok_or(SkipReason::UnresolvedProject)?;

        let task = match entry.task.as_deref() {
            None => self.task_for_description(project, &entry.description).await?,
            Some(name) => {
                self.match_existing_task(project, name, &entry.description)
                    .await?
            }
        };

        let draft = EventDraft {
            task,
            start: entry.start,
            end: entry.end,
            notes: Some(format!(
                "Auto time entry for existing project '{}'",
                entry.project
            )),
        };
        self.gateway
            .create_event(&draft)
            .await
            .map_err(|err| SkipReason::RemoteCreateFailure(err.to_string()))?;
        self.report.events_created += 1;
        tracing::debug!(%task, start = %entry.start, end = %entry.end, "event created");
        Ok(())
    }

    /// Two-level documents: the description is the task identity. Creates the
    /// remote task on first sight and reuses it for every later duplicate.
    /// Failures are not cached, so a later duplicate line retries.
    async fn task_for_description(
        &mut self,
        project: ProjectId,
        description: &str,
    ) -> Result<TaskId, SkipReason> {
        let key = (project, description.to_string());
        if let Some(id) = self.ctx.created_tasks.get(&key) {
            return Ok(*id);
        }

        let id = self
            .gateway
            .create_task(project, description)
            .await
            .map_err(|err| SkipReason::RemoteCreateFailure(err.to_string()))?;
        tracing::info!(%project, task = description, %id, "created remote task");
        self.ctx.created_tasks.insert(key, id);
        self.report.tasks_created += 1;
        Ok(id)
    }

    /// Three-level documents: match against the project's existing tasks,
    /// fetching and caching the list on first reference. Never creates.
    async fn match_existing_task(
        &mut self,
        project: ProjectId,
        task_text: &str,
        description: &str,
    ) -> Result<TaskId, SkipReason> {
        if !self.ctx.task_index.contains_key(&project) {
            // A failed fetch leaves the index unpopulated so the next entry
            // for this project tries again.
            let tasks = fetch_project_tasks(self.gateway, project, self.page_size)
                .await
                .map_err(|err| SkipReason::RemoteFetchFailure(err.to_string()))?;
            self.ctx.task_index.insert(project, tasks);
        }

        let tasks = self
            .ctx
            .task_index
            .get(&project)
            .map_or(&[] as &[TaskRecord], Vec::as_slice);
        match_task(tasks, task_text, description).ok_or(SkipReason::UnresolvedTask)
    }

    fn record_parse_skip(&mut self, skip: ParseSkip) {
        tracing::warn!(line = skip.line, cause = %skip.cause, text = %skip.text, "line skipped");
        self.report.skipped.push(SkippedEntry {
            line: skip.line,
            subject: skip.text,
            reason: skip.cause.into(),
        });
    }

    fn record_entry_skip(&mut self, line: usize, entry: &WorkEntry, reason: SkipReason) {
        let subject = match &entry.task {
            Some(task) => format!("{} / {task} / {}", entry.project, entry.description),
            None => format!("{} / {}", entry.project, entry.description),
        };
        tracing::warn!(line, %reason, %subject, "entry skipped");
        self.report.skipped.push(SkippedEntry {
            line,
            subject,
            reason,
        });
    }
}
