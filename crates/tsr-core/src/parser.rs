//! Indentation-structured timesheet parsing.
//!
//! Documents are line-oriented with no explicit delimiters; structure is
//! carried by a date header, a block marker and three indentation bands:
//!
//! ```text
//! # date 290125
//!     timesheet
//!         Centurion
//!             Controls firmware
//!                 9.00 - 12.00 Software design
//! ```
//!
//! Two-level documents omit the task line and write time ranges in the task
//! band; both layouts are handled by the same machine. The parser is
//! push-based and single-pass: feed it one physical line at a time and it
//! emits at most one [`WorkEntry`] per line.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::entry::WorkEntry;
use crate::timecode;

/// Leading token of a date header line.
pub const DATE_MARKER: &str = "# date";

/// Trimmed content that opens a timesheet block (matched case-insensitively).
pub const BLOCK_MARKER: &str = "timesheet";

/// First column (inclusive) of the project band.
pub const PROJECT_INDENT: usize = 8;

/// First column (inclusive) of the task band; end (exclusive) of the project band.
pub const TASK_INDENT: usize = 12;

/// First column (inclusive) of the time-range band; end (exclusive) of the task band.
pub const TIME_INDENT: usize = 16;

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}\.\d{1,2})\s*-\s*(\d{1,2}\.\d{1,2})\s+(.*)$")
        .expect("time range pattern is valid")
});

/// Where the machine is between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Nothing seen yet; waiting for a date header or block marker.
    AwaitingDate,
    /// A date header was seen; waiting for the block marker.
    AwaitingBlock,
    /// Inside a timesheet block; body lines are classified by indentation.
    InBlock,
}

/// Why a line that should have produced an entry did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseCause {
    /// A time range appeared before any project line.
    MissingProject,
    /// The time range matched but did not describe a usable interval.
    MalformedTimeRange,
}

impl fmt::Display for ParseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingProject => write!(f, "no project in scope"),
            Self::MalformedTimeRange => write!(f, "malformed time range"),
        }
    }
}

/// A line-level diagnostic from parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSkip {
    /// 1-based physical line number.
    pub line: usize,
    /// The offending line, trimmed.
    pub text: String,
    pub cause: ParseCause,
}

/// Result of feeding one line to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Structural, blank or ignorable line; nothing to emit.
    Consumed,
    /// A fully-formed work entry.
    Entry(WorkEntry),
    /// A time-range line that could not become an entry.
    Skipped(ParseSkip),
}

/// Re-entrant line classifier.
///
/// The date may be redefined and the block marker restarted any number of
/// times; each date header clears the project/task context, and a malformed
/// header suppresses emission until the next valid one.
#[derive(Debug)]
pub struct DocumentParser {
    state: ParserState,
    date: Option<NaiveDate>,
    project: Option<String>,
    task: Option<String>,
    line: usize,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::AwaitingDate,
            date: None,
            project: None,
            task: None,
            line: 0,
        }
    }

    /// Classifies one physical line and advances the machine.
    pub fn feed(&mut self, raw: &str) -> LineOutcome {
        self.line += 1;
        let line = raw.trim_end_matches(['\r', '\n']);
        let stripped = line.trim();

        if stripped.is_empty() {
            return LineOutcome::Consumed;
        }

        if stripped.starts_with(DATE_MARKER) {
            self.enter_date_header(stripped);
            return LineOutcome::Consumed;
        }

        if stripped.eq_ignore_ascii_case(BLOCK_MARKER) {
            self.state = ParserState::InBlock;
            self.project = None;
            self.task = None;
            return LineOutcome::Consumed;
        }

        if self.state != ParserState::InBlock {
            tracing::debug!(line = self.line, "ignoring line outside timesheet block");
            return LineOutcome::Consumed;
        }
        let Some(date) = self.date else {
            // An earlier header failed to parse; everything up to the next
            // valid header is suppressed.
            tracing::debug!(line = self.line, "ignoring line under unknown date");
            return LineOutcome::Consumed;
        };

        let indent = line.len() - line.trim_start_matches(' ').len();
        match indent {
            PROJECT_INDENT..TASK_INDENT => {
                self.project = Some(stripped.to_string());
                self.task = None;
                LineOutcome::Consumed
            }
            TASK_INDENT..TIME_INDENT => {
                // Two-level documents write their time ranges in this band;
                // anything that is not a time range names a task.
                if TIME_RANGE.is_match(stripped) {
                    self.emit(date, stripped)
                } else {
                    self.task = Some(stripped.to_string());
                    LineOutcome::Consumed
                }
            }
            TIME_INDENT.. => {
                if TIME_RANGE.is_match(stripped) {
                    self.emit(date, stripped)
                } else {
                    // Stray prose at time depth is tolerated.
                    tracing::debug!(line = self.line, text = stripped, "ignoring non-range line");
                    LineOutcome::Consumed
                }
            }
            _ => {
                tracing::debug!(line = self.line, "ignoring shallow line inside block");
                LineOutcome::Consumed
            }
        }
    }

    fn enter_date_header(&mut self, stripped: &str) {
        let parts: Vec<&str> = stripped.split_whitespace().collect();
        self.date = if parts.len() == 3 {
            match timecode::parse_compact_date(parts[2]) {
                Ok(date) => Some(date),
                Err(err) => {
                    tracing::warn!(line = self.line, %err, "unparseable date header");
                    None
                }
            }
        } else {
            tracing::warn!(line = self.line, text = stripped, "malformed date header");
            None
        };
        self.state = ParserState::AwaitingBlock;
        self.project = None;
        self.task = None;
    }

    fn emit(&mut self, date: NaiveDate, stripped: &str) -> LineOutcome {
        let Some(captures) = TIME_RANGE.captures(stripped) else {
            return LineOutcome::Consumed;
        };
        let Some(project) = self.project.clone() else {
            return self.skip(stripped, ParseCause::MissingProject);
        };

        let interval = timecode::decimal_hour_to_hm(&captures[1]).and_then(|(sh, sm)| {
            let (eh, em) = timecode::decimal_hour_to_hm(&captures[2])?;
            Ok((timecode::combine(date, sh, sm)?, timecode::combine(date, eh, em)?))
        });
        let (start, end) = match interval {
            Ok(interval) => interval,
            Err(err) => {
                tracing::warn!(line = self.line, %err, "unusable time range");
                return self.skip(stripped, ParseCause::MalformedTimeRange);
            }
        };
        if end <= start {
            tracing::warn!(line = self.line, %start, %end, "time range does not move forward");
            return self.skip(stripped, ParseCause::MalformedTimeRange);
        }

        LineOutcome::Entry(WorkEntry {
            date,
            project,
            task: self.task.clone(),
            description: captures[3].to_string(),
            start,
            end,
        })
    }

    fn skip(&self, stripped: &str, cause: ParseCause) -> LineOutcome {
        LineOutcome::Skipped(ParseSkip {
            line: self.line,
            text: stripped.to_string(),
            cause,
        })
    }
}

/// Everything a document parsed into.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub entries: Vec<WorkEntry>,
    pub skips: Vec<ParseSkip>,
}

/// One-shot parse of a whole document.
#[must_use]
pub fn parse_document(text: &str) -> ParsedDocument {
    let mut parser = DocumentParser::new();
    let mut parsed = ParsedDocument::default();
    for line in text.lines() {
        match parser.feed(line) {
            LineOutcome::Consumed => {}
            LineOutcome::Entry(entry) => parsed.entries.push(entry),
            LineOutcome::Skipped(skip) => parsed.skips.push(skip),
        }
    }
    parsed
}
