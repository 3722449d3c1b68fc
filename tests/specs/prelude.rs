//! Shared helpers for CLI specs.

use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

/// The xero-api recipe used across specs.
pub const XERO_RECIPE: &str = r#"base = "python:3.13-slim"
timezone = "America/Los_Angeles"

[identity]
name = "xero"
comment = "Xero API user"

[image]
command = ["python", "xero_api_test.py"]
"#;

pub const XERO_REQUIREMENTS: &str = "flask==3.0.3\nrequests>=2.31\n";

/// `keel` with a scrubbed environment.
pub fn cli() -> Command {
    let mut cmd = match Command::cargo_bin("keel") {
        Ok(cmd) => cmd,
        Err(e) => panic!("keel binary not built: {e}"),
    };
    for var in ["KEEL_RECIPE", "KEEL_BASE_IMAGE", "KEEL_DOCKER", "KEEL_BUILD_TIMEOUT_MS", "KEEL_LOG", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A temporary build context.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        match tempfile::tempdir() {
            Ok(dir) => Self { dir },
            Err(e) => panic!("failed to create temp dir: {e}"),
        }
    }

    /// The xero-api application: recipe, manifest, and entry point.
    pub fn xero() -> Self {
        let project = Self::empty();
        project.file("keel.toml", XERO_RECIPE);
        project.file("requirements.txt", XERO_REQUIREMENTS);
        project.file("xero_api_test.py", "print('ok')\n");
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, path: &str, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                panic!("failed to create {}: {e}", parent.display());
            }
        }
        if let Err(e) = std::fs::write(&full, content) {
            panic!("failed to write {}: {e}", full.display());
        }
    }

    pub fn read(&self, path: &str) -> String {
        match std::fs::read_to_string(self.dir.path().join(path)) {
            Ok(content) => content,
            Err(e) => panic!("failed to read {path}: {e}"),
        }
    }

    /// `keel -C <project>`
    pub fn keel(&self) -> Command {
        let mut cmd = cli();
        cmd.arg("-C").arg(self.dir.path());
        cmd
    }
}

pub trait CommandExt {
    fn passes(&mut self) -> Run;
    fn fails_with(&mut self, code: i32) -> Run;
}

impl CommandExt for Command {
    fn passes(&mut self) -> Run {
        let run = Run::capture(self);
        if run.code != Some(0) {
            panic!("expected success, got {:?}\nstdout:\n{}\nstderr:\n{}", run.code, run.stdout, run.stderr);
        }
        run
    }

    fn fails_with(&mut self, code: i32) -> Run {
        let run = Run::capture(self);
        if run.code != Some(code) {
            panic!("expected exit {code}, got {:?}\nstdout:\n{}\nstderr:\n{}", run.code, run.stdout, run.stderr);
        }
        run
    }
}

/// Captured output of a finished command.
pub struct Run {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    fn capture(cmd: &mut Command) -> Self {
        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => panic!("failed to run keel: {e}"),
        };
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(&self, needle: &str) -> &Self {
        assert!(!self.stdout.contains(needle), "stdout unexpectedly has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        match serde_json::from_str(&self.stdout) {
            Ok(value) => value,
            Err(e) => panic!("stdout is not JSON ({e}):\n{}", self.stdout),
        }
    }
}
