//! Timesheet parsing and reconciliation engine.
//!
//! This crate contains the whole pipeline from raw document lines to remote
//! mutations:
//! - timecode: compact date and decimal clock token conversion
//! - parser: the indentation state machine producing [`WorkEntry`] values
//! - gateway: the remote directory contract the engine depends on
//! - reconcile: the resolver, run-scoped caches, and the driver
//!
//! Transport and presentation live elsewhere (`tsr-remote`, `tsr-cli`).

pub mod entry;
pub mod gateway;
pub mod parser;
pub mod reconcile;
pub mod timecode;

pub use entry::WorkEntry;
pub use gateway::{
    DirectoryGateway, EventDraft, GatewayError, ProjectId, ProjectRecord, TaskId, TaskRecord,
};
pub use parser::{DocumentParser, LineOutcome, ParseCause, ParsedDocument, parse_document};
pub use reconcile::{ReconcileReport, Reconciler, SkipReason, SkippedEntry, fetch_project_tasks};
