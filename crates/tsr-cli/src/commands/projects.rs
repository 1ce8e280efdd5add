//! Projects command: list the account's projects.

use std::io::Write;

use anyhow::{Context, Result};

use tsr_core::DirectoryGateway;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let client = super::directory_client(config)?;
    let runtime = super::runtime()?;
    let projects = runtime
        .block_on(client.list_projects())
        .context("failed to list projects")?;

    writeln!(writer, "Found {} projects:", projects.len())?;
    for project in projects {
        let marker = if project.archived { " (archived)" } else { "" };
        writeln!(writer, "- {}: {}{marker}", project.id, project.name)?;
    }
    Ok(())
}
