#![allow(dead_code)]

use jira_offline::config::AppConfig;
use jira_offline::model::ProjectRegistry;
use jira_offline::store::Store;
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

pub mod cli;
pub mod fake_tracker;
pub mod fixtures;

pub use fake_tracker::{Call, FakeTracker};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        jira_offline::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

/// A data directory in a temp dir with the fixture project registry saved.
pub struct TestData {
    pub dir: TempDir,
    pub config: AppConfig,
    pub projects: ProjectRegistry,
}

impl TestData {
    pub fn new() -> Self {
        init_test_logging();
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig::in_dir(dir.path());
        let projects = fixtures::registry();
        projects.save(&config.projects_path).expect("save registry");
        Self {
            dir,
            config,
            projects,
        }
    }

    /// An empty store bound to the cache path.
    pub fn store(&self) -> Store {
        Store::from_config(&self.config)
    }

    /// A store freshly loaded from the cache file.
    pub fn reload(&self) -> Store {
        Store::open(&self.config, &self.projects).expect("load cache")
    }
}
