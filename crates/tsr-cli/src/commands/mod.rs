//! CLI subcommand implementations.

pub mod check;
pub mod projects;
pub mod reconcile;
pub mod tasks;
pub mod users;

use anyhow::{Context, Result};

use tsr_remote::{ClientConfig, DirectoryClient};

use crate::Config;

/// Builds the directory client from configuration, requiring credentials.
pub(crate) fn directory_client(config: &Config) -> Result<DirectoryClient> {
    let username = require(config.username.as_deref(), "username", "TSR_USERNAME")?;
    let password = require(config.password.as_deref(), "password", "TSR_PASSWORD")?;

    DirectoryClient::new(ClientConfig {
        base_url: config.base_url.clone(),
        account_id: config.account_id,
        user_id: config.user_id.unwrap_or_default(),
        username,
        password,
        user_agent: config.user_agent.clone(),
    })
    .context("failed to build directory client")
}

fn require(value: Option<&str>, field: &str, env_var: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::anyhow!("missing {field} (set {env_var}, config.toml, or --{field})")
        })
}

/// One blocking runtime per command invocation; remote calls stay sequential.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")
}
