use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct JiraRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

/// A temp home and data directory for running the binary.
pub struct JiraWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl JiraWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let data_dir = root.join("data");
        let log_dir = root.join("logs");
        fs::create_dir_all(&data_dir).expect("data dir");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            data_dir,
            log_dir,
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("issue_cache.jsonl")
    }

    pub fn projects_path(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }
}

pub fn run_jira<I, S>(workspace: &JiraWorkspace, args: I, label: &str) -> JiraRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jira"));
    cmd.current_dir(&workspace.root);
    cmd.arg("--data-dir").arg(&workspace.data_dir);
    cmd.args(args);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "jira_offline=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);
    cmd.env_remove("XDG_DATA_HOME");
    cmd.env("COLUMNS", "200");

    let start = Instant::now();
    let output = cmd.output().expect("run jira");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    JiraRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// JSON document on stdout, skipping any leading non-JSON lines.
pub fn extract_json_payload(stdout: &str) -> String {
    let lines: Vec<&str> = stdout.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    stdout.trim().to_string()
}
