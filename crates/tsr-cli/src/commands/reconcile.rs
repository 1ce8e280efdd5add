//! Reconcile command: parse a timesheet and push it to the remote directory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use tsr_core::reconcile::{ReconcileReport, Reconciler};

use crate::Config;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Path to the timesheet document.
    pub file: PathBuf,
}

pub fn run<W: Write>(writer: &mut W, args: &ReconcileArgs, config: &Config) -> Result<()> {
    // The one hard stop: a document we cannot read at all.
    let document = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    if config.user_id.is_none() {
        bail!("missing user id (set TSR_USER_ID or user_id in config.toml)");
    }
    let client = super::directory_client(config)?;

    let runtime = super::runtime()?;
    let report = runtime.block_on(
        Reconciler::new(&client)
            .with_page_size(config.page_size)
            .run(&document),
    );

    render_report(writer, &report)
}

fn render_report<W: Write>(writer: &mut W, report: &ReconcileReport) -> Result<()> {
    writeln!(writer, "Entries parsed: {}", report.entries)?;
    writeln!(writer, "Tasks created:  {}", report.tasks_created)?;
    writeln!(writer, "Events created: {}", report.events_created)?;
    if report.skipped.is_empty() {
        return Ok(());
    }
    writeln!(writer, "Skipped:")?;
    for skip in &report.skipped {
        writeln!(
            writer,
            "- line {}: {} ({})",
            skip.line, skip.subject, skip.reason
        )?;
    }
    Ok(())
}
