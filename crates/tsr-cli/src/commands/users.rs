//! Users command: list the account's users.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let client = super::directory_client(config)?;
    let runtime = super::runtime()?;
    let users = runtime
        .block_on(client.list_users())
        .context("failed to list users")?;

    writeln!(writer, "Found {} users:", users.len())?;
    for user in users {
        writeln!(writer, "- {}: {} <{}>", user.id, user.name, user.email)?;
    }
    Ok(())
}
