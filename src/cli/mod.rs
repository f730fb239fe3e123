//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub mod commands;

/// Offline-first local replica of Jira projects
#[derive(Parser, Debug)]
#[command(name = "jira", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Issue cache file (defaults to <data-dir>/issue_cache.jsonl)
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// Directory holding the cache and project registry
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to ~/.config/jira-offline/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Timezone offset for remote timestamps, e.g. +10:00
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Append JSON log lines to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List issues in the local cache
    Ls(LsArgs),

    /// Show one issue
    Show {
        /// Issue key (placeholder keys may be shortened)
        key: String,
    },

    /// Create an issue offline; it is created remotely on the next push
    New(NewArgs),

    /// Edit an issue offline
    Edit(EditArgs),

    /// Issue counts grouped by a field
    Stats {
        #[command(subcommand)]
        command: Option<StatsCommand>,

        /// Restrict to one project
        #[arg(long)]
        project: Option<String>,
    },

    /// Check issues against structural rules
    Lint(LintArgs),

    /// List cloned projects
    Projects,
}

#[derive(Args, Debug, Default)]
pub struct LsArgs {
    /// Restrict to one project
    #[arg(long)]
    pub project: Option<String>,

    /// Include issues in a closed status
    #[arg(long)]
    pub all: bool,

    /// Only issues with unpushed local changes
    #[arg(long)]
    pub modified: bool,

    /// Show more columns and full timestamps
    #[arg(long)]
    pub long: bool,
}

#[derive(Args, Debug, Default)]
pub struct NewArgs {
    /// Project key for the new issue
    pub project: String,

    /// A valid issue type for the project
    pub issuetype: String,

    /// One-line summary
    pub summary: String,

    /// Username of the assignee
    #[arg(long)]
    pub assignee: Option<String>,

    /// Long description
    #[arg(long)]
    pub description: Option<String>,

    /// Short epic name (Epics only)
    #[arg(long)]
    pub epic_name: Option<String>,

    /// Epic key this issue belongs to
    #[arg(long)]
    pub epic_ref: Option<String>,

    /// Size estimate in story points
    #[arg(long)]
    pub estimate: Option<Decimal>,

    /// Comma-separated fix versions
    #[arg(long, value_delimiter = ',')]
    pub fix_versions: Vec<String>,

    /// Comma-separated labels
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Priority allowed for the issue type
    #[arg(long)]
    pub priority: Option<String>,

    /// Username of the reporter
    #[arg(long)]
    pub reporter: Option<String>,
}

/// Field edits; pass an empty string to clear a text field.
#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Issue key (placeholder keys may be shortened)
    pub key: String,

    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub reporter: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub epic_ref: Option<String>,

    #[arg(long)]
    pub epic_name: Option<String>,

    #[arg(long)]
    pub estimate: Option<Decimal>,

    /// Replace the fix versions (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub fix_versions: Option<Vec<String>>,

    /// Replace the labels (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsCommand {
    /// Counts per issue type
    Issuetype,
    /// Counts per status
    Status,
    /// Counts per fix version
    FixVersions,
}

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Apply the fix to every violating issue
    #[arg(long, global = true)]
    pub fix: bool,

    #[command(subcommand)]
    pub command: LintCommand,
}

#[derive(Subcommand, Debug)]
pub enum LintCommand {
    /// Issues with no fix version
    FixVersions {
        /// Fix version to set with --fix
        #[arg(long)]
        value: Option<String>,
    },
    /// Non-epic issues with no epic
    IssuesMissingEpic {
        /// Epic key to set with --fix
        #[arg(long)]
        epic_ref: Option<String>,
    },
}

/// Output format for list and stats commands.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

pub(crate) fn to_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
