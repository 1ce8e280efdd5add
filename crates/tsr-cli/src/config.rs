//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use tsr_core::reconcile::DEFAULT_TASK_PAGE_SIZE;

const DEFAULT_BASE_URL: &str = "https://app.trackingtime.co/api/v4";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// API root for the remote directory.
    pub base_url: String,
    /// Account id inserted into request paths, when the account needs one.
    pub account_id: Option<u64>,
    /// User that created tasks and time entries are attributed to.
    pub user_id: Option<u64>,
    /// Directory username (email).
    pub username: Option<String>,
    /// Directory password.
    pub password: Option<String>,
    /// Tasks fetched per page when listing a project's tasks.
    pub page_size: usize,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("page_size", &self.page_size)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id: None,
            user_id: None,
            username: None,
            password: None,
            page_size: DEFAULT_TASK_PAGE_SIZE,
            user_agent: format!("tsr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TSR_*)
        figment = figment.merge(Env::prefixed("TSR_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for tsr.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tsr"))
}
