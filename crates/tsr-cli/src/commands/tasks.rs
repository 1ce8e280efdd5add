//! Tasks command: list one project's tasks through the paginated fetch.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use tsr_core::{ProjectId, fetch_project_tasks};

use crate::Config;

#[derive(Debug, Args)]
pub struct TasksArgs {
    /// Remote project id.
    #[arg(long)]
    pub project: u64,
}

pub fn run<W: Write>(writer: &mut W, args: &TasksArgs, config: &Config) -> Result<()> {
    let client = super::directory_client(config)?;
    let runtime = super::runtime()?;
    let tasks = runtime
        .block_on(fetch_project_tasks(
            &client,
            ProjectId(args.project),
            config.page_size,
        ))
        .with_context(|| format!("failed to list tasks for project {}", args.project))?;

    writeln!(writer, "Found {} tasks in project {}:", tasks.len(), args.project)?;
    for task in tasks {
        writeln!(writer, "- {}: {}", task.id, task.name)?;
    }
    Ok(())
}
