//! `jira_offline` - an offline-first local replica of Jira projects.
//!
//! Issues live in a line-delimited JSON cache. Each one keeps its last-known
//! remote state, so local edits are tracked as a diff and pushed as the
//! minimal set of changed fields. Pull and push talk to the remote through
//! the [`sync::IssueTracker`] trait.

pub mod cli;
pub mod config;
pub mod edit;
pub mod error;
pub mod format;
pub mod lint;
pub mod logging;
pub mod model;
pub mod serializer;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{DeserializeError, ErrorCode, JiraError, Result, StructuredError};
