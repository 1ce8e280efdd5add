//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{check, reconcile, tasks};

/// Timesheet reconciler.
///
/// Parses indentation-structured timesheet documents and reconciles them
/// against the remote time-tracking directory, creating missing tasks and
/// time entries without duplicating either.
#[derive(Debug, Parser)]
#[command(name = "tsr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory username (email). Overrides configuration.
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Directory password. Overrides configuration.
    #[arg(long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile a timesheet document against the remote directory.
    Reconcile(reconcile::ReconcileArgs),

    /// Parse a timesheet document and print what it contains.
    Check(check::CheckArgs),

    /// List projects in the account.
    Projects,

    /// List a project's tasks.
    Tasks(tasks::TasksArgs),

    /// List users in the account.
    Users,
}
