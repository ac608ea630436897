use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

/// Env prefixes that could leak real credentials or settings into a run.
const SCRUBBED_PREFIXES: &[&str] = &["LINEAR", "JIRA", "SYNC_", "ATTACHMENT_"];

#[derive(Debug)]
pub struct SyncRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

/// Isolated `HOME` and working directory for one CLI test.
pub struct SyncWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl SyncWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    /// Default state directory under the isolated `HOME`.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".linear-jira-sync")
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join(".syncstate.json")
    }
}

/// `ljsync` rooted in `workspace` with a scrubbed environment.
pub fn ljsync_command(workspace: &SyncWorkspace) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ljsync"));
    cmd.current_dir(&workspace.root);
    for (key, _) in std::env::vars() {
        if SCRUBBED_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
            cmd.env_remove(key);
        }
    }
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "linear_jira_sync=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);
    cmd
}

pub fn run_ljsync<I, S>(workspace: &SyncWorkspace, args: I, label: &str) -> SyncRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_ljsync_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_ljsync_with_env<I, S, E, K, V>(
    workspace: &SyncWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> SyncRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = ljsync_command(workspace);
    cmd.args(args);
    cmd.envs(env_vars);

    let start = Instant::now();
    let output = cmd.output().expect("run ljsync");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    SyncRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Trim leading non-JSON lines (e.g. log output) from stdout.
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
