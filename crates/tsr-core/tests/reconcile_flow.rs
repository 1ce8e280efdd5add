//! Driver-level reconciliation tests against an in-memory directory.
//!
//! These exercise the full pipeline: document text in, gateway calls out,
//! with the skip-on-failure policy and the run-scoped caches observable
//! through the recorded call log.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use tsr_core::reconcile::MAX_TASK_PAGES;
use tsr_core::{
    DirectoryGateway, EventDraft, GatewayError, ProjectId, ProjectRecord, Reconciler, SkipReason,
    TaskId, TaskRecord,
};

#[derive(Debug, Default)]
struct CallLog {
    list_projects: usize,
    task_pages: Vec<(u64, usize)>,
    create_task: Vec<(u64, String)>,
    create_event: Vec<EventDraft>,
}

/// In-memory remote directory with injectable failures.
#[derive(Default)]
struct MockDirectory {
    projects: Vec<ProjectRecord>,
    tasks: HashMap<u64, Vec<TaskRecord>>,
    fail_list_projects: bool,
    /// Fail this many leading `create_task` calls.
    fail_create_task: Mutex<usize>,
    /// Fail this many leading `task_page` calls.
    fail_task_page: Mutex<usize>,
    /// Always serve a full page, never terminating pagination naturally.
    endless_pages: bool,
    next_task_id: Mutex<u64>,
    calls: Mutex<CallLog>,
}

impl MockDirectory {
    fn with_projects(names: &[(&str, u64)]) -> Self {
        Self {
            projects: names
                .iter()
                .map(|(name, id)| ProjectRecord {
                    id: ProjectId(*id),
                    name: (*name).to_string(),
                    archived: false,
                })
                .collect(),
            next_task_id: Mutex::new(100),
            ..Self::default()
        }
    }

    fn with_tasks(mut self, project: u64, names: &[(u64, &str)]) -> Self {
        self.tasks.insert(
            project,
            names
                .iter()
                .map(|(id, name)| TaskRecord {
                    id: TaskId(*id),
                    name: (*name).to_string(),
                })
                .collect(),
        );
        self
    }

    fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl DirectoryGateway for MockDirectory {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, GatewayError> {
        self.log().list_projects += 1;
        if self.fail_list_projects {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        Ok(self.projects.clone())
    }

    async fn task_page(
        &self,
        project: ProjectId,
        page: usize,
        page_size: usize,
        _include_archived: bool,
    ) -> Result<Vec<TaskRecord>, GatewayError> {
        self.log().task_pages.push((project.0, page));
        {
            let mut failures = self.fail_task_page.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(GatewayError::Transport("timed out".to_string()));
            }
        }
        if self.endless_pages {
            let filler = (0..page_size)
                .map(|n| TaskRecord {
                    id: TaskId(u64::try_from(page * page_size + n).unwrap()),
                    name: format!("filler {page}.{n}"),
                })
                .collect();
            return Ok(filler);
        }
        let tasks = self.tasks.get(&project.0).cloned().unwrap_or_default();
        let from = (page * page_size).min(tasks.len());
        let to = (from + page_size).min(tasks.len());
        Ok(tasks[from..to].to_vec())
    }

    async fn create_task(&self, project: ProjectId, name: &str) -> Result<TaskId, GatewayError> {
        self.log().create_task.push((project.0, name.to_string()));
        {
            let mut failures = self.fail_create_task.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(GatewayError::Rejected("task limit reached".to_string()));
            }
        }
        let mut next = self.next_task_id.lock().unwrap();
        *next += 1;
        Ok(TaskId(*next))
    }

    async fn create_event(&self, event: &EventDraft) -> Result<(), GatewayError> {
        self.log().create_event.push(event.clone());
        Ok(())
    }
}

const TWO_LEVEL_DOC: &str = "\
# date 290125
    timesheet
        Centurion
            9.00 - 12.00 Software design
";

#[tokio::test]
async fn two_level_entry_creates_task_then_event() {
    let directory = MockDirectory::with_projects(&[("Centurion", 7)]);
    let report = Reconciler::new(&directory).run(TWO_LEVEL_DOC).await;

    assert_eq!(report.entries, 1);
    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.events_created, 1);
    assert!(report.skipped.is_empty());

    let log = directory.log();
    assert_eq!(log.create_task, vec![(7, "Software design".to_string())]);
    assert_eq!(log.create_event.len(), 1);
    let event = &log.create_event[0];
    assert_eq!(event.task, TaskId(101));
    assert_eq!(event.start.to_string(), "2025-01-29 09:00:00");
    assert_eq!(event.end.to_string(), "2025-01-29 12:00:00");
    assert_eq!(
        event.notes.as_deref(),
        Some("Auto time entry for existing project 'Centurion'")
    );
}

#[tokio::test]
async fn duplicate_descriptions_create_one_task_and_two_events() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            9.00 - 12.00 Software design
            13.00 - 15.00 Software design
";
    let directory = MockDirectory::with_projects(&[("Centurion", 7)]);
    let report = Reconciler::new(&directory).run(doc).await;

    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.events_created, 2);

    let log = directory.log();
    assert_eq!(log.create_task.len(), 1);
    assert_eq!(log.create_event.len(), 2);
    // Both events reference the single created task.
    assert_eq!(log.create_event[0].task, log.create_event[1].task);
}

#[tokio::test]
async fn unresolved_project_skips_without_any_write() {
    let directory = MockDirectory::with_projects(&[("LandCruiser", 9)]);
    let report = Reconciler::new(&directory).run(TWO_LEVEL_DOC).await;

    assert_eq!(report.entries, 1);
    assert_eq!(report.events_created, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::UnresolvedProject);
    assert!(report.skipped[0].subject.contains("Centurion"));

    let log = directory.log();
    assert!(log.create_task.is_empty());
    assert!(log.create_event.is_empty());
}

#[tokio::test]
async fn failed_task_creation_is_not_cached_and_retries() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            9.00 - 12.00 Software design
            13.00 - 15.00 Software design
";
    let directory = MockDirectory::with_projects(&[("Centurion", 7)]);
    *directory.fail_create_task.lock().unwrap() = 1;
    let report = Reconciler::new(&directory).run(doc).await;

    // First line fails and is skipped; the duplicate retries and lands.
    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.events_created, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(
        report.skipped[0].reason,
        SkipReason::RemoteCreateFailure(_)
    ));

    let log = directory.log();
    assert_eq!(log.create_task.len(), 2);
    assert_eq!(log.create_event.len(), 1);
}

#[tokio::test]
async fn three_level_entry_matches_existing_task_without_creating() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            Controls firmware
                9.00 - 12.00 PCS sub controller
";
    let directory = MockDirectory::with_projects(&[("Centurion", 7)]).with_tasks(
        7,
        &[(31, "Site survey"), (32, "Q1 Controls firmware refactor")],
    );
    let report = Reconciler::new(&directory).run(doc).await;

    assert_eq!(report.events_created, 1);
    assert_eq!(report.tasks_created, 0);

    let log = directory.log();
    assert!(log.create_task.is_empty());
    assert_eq!(log.create_event[0].task, TaskId(32));
}

#[tokio::test]
async fn three_level_entry_without_match_skips() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            Payroll
                9.00 - 12.00 Nothing related
";
    let directory =
        MockDirectory::with_projects(&[("Centurion", 7)]).with_tasks(7, &[(31, "Site survey")]);
    let report = Reconciler::new(&directory).run(doc).await;

    assert_eq!(report.events_created, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::UnresolvedTask);
    assert!(directory.log().create_task.is_empty());
}

#[tokio::test]
async fn task_listing_pages_until_short_page() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            Edge case
                9.00 - 12.00 Follow-up
";
    let directory = MockDirectory::with_projects(&[("Centurion", 7)]).with_tasks(
        7,
        &[
            (1, "Alpha"),
            (2, "Beta"),
            (3, "Gamma"),
            (4, "Delta"),
            (5, "Edge case handling"),
        ],
    );
    let report = Reconciler::new(&directory)
        .with_page_size(2)
        .run(doc)
        .await;

    // The match lives on the final (short) page, proving the whole list was
    // fetched before matching.
    assert_eq!(report.events_created, 1);
    assert_eq!(directory.log().create_event[0].task, TaskId(5));
    assert_eq!(
        directory.log().task_pages,
        vec![(7, 0), (7, 1), (7, 2)]
    );
}

#[tokio::test]
async fn task_listing_stops_at_page_cap_when_remote_never_ends() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            zzz-unmatchable
                9.00 - 12.00 qqq-unmatchable
";
    let directory = MockDirectory {
        endless_pages: true,
        ..MockDirectory::with_projects(&[("Centurion", 7)])
    };
    let report = Reconciler::new(&directory)
        .with_page_size(1)
        .run(doc)
        .await;

    assert_eq!(directory.log().task_pages.len(), MAX_TASK_PAGES);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::UnresolvedTask);
}

#[tokio::test]
async fn task_index_is_fetched_once_per_project() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            Site survey
                9.00 - 10.00 Morning
            Invoicing
                10.00 - 11.00 Midday
";
    let directory = MockDirectory::with_projects(&[("Centurion", 7)])
        .with_tasks(7, &[(31, "Site survey"), (32, "Invoicing")]);
    let report = Reconciler::new(&directory).run(doc).await;

    assert_eq!(report.events_created, 2);
    // One short page covers both entries; the second entry hits the index.
    assert_eq!(directory.log().task_pages, vec![(7, 0)]);
}

#[tokio::test]
async fn failed_task_fetch_skips_entry_but_retries_later() {
    let doc = "\
# date 290125
    timesheet
        Centurion
            Site survey
                9.00 - 10.00 Morning
            Site survey
                10.00 - 11.00 Midday
";
    let directory =
        MockDirectory::with_projects(&[("Centurion", 7)]).with_tasks(7, &[(31, "Site survey")]);
    *directory.fail_task_page.lock().unwrap() = 1;
    let report = Reconciler::new(&directory).run(doc).await;

    assert_eq!(report.events_created, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(
        report.skipped[0].reason,
        SkipReason::RemoteFetchFailure(_)
    ));
    // First fetch failed, second entry triggered a fresh (successful) fetch.
    assert_eq!(directory.log().task_pages.len(), 2);
}

#[tokio::test]
async fn unreachable_project_listing_degrades_to_skips() {
    let directory = MockDirectory {
        fail_list_projects: true,
        ..MockDirectory::with_projects(&[("Centurion", 7)])
    };
    let report = Reconciler::new(&directory).run(TWO_LEVEL_DOC).await;

    assert_eq!(report.entries, 1);
    assert_eq!(report.events_created, 0);
    assert_eq!(report.skipped[0].reason, SkipReason::UnresolvedProject);
    assert!(directory.log().create_event.is_empty());
}
