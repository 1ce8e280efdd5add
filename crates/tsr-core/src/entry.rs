//! Parsed work entries.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One time-range line together with its enclosing date/project/task context.
///
/// Produced by the parser and consumed once by the resolver; never mutated.
/// The project name is kept exactly as written: display uses the author's
/// casing, lookups fold case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkEntry {
    /// The calendar date from the most recent valid date header.
    pub date: NaiveDate,
    /// Project name as written in the document.
    pub project: String,
    /// Task name, present only in three-level documents.
    pub task: Option<String>,
    /// Free text following the time range.
    pub description: String,
    /// Start instant on `date`.
    pub start: NaiveDateTime,
    /// End instant on `date`, strictly after `start`.
    pub end: NaiveDateTime,
}
