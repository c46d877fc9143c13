//! Shared helpers for CLI specs

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// `pathlock` with logging confined to warnings
pub fn pathlock() -> Command {
    let mut cmd = Command::cargo_bin("pathlock").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd.timeout(std::time::Duration::from_secs(60));
    cmd
}

/// A scratch directory holding config files
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write `content` to `name` and return its path
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub trait AssertExt {
    fn stdout_has(self, needle: &str) -> Self;
    fn stderr_has(self, needle: &str) -> Self;
}

impl AssertExt for Assert {
    fn stdout_has(self, needle: &str) -> Self {
        self.stdout(predicates::str::contains(needle))
    }

    fn stderr_has(self, needle: &str) -> Self {
        self.stderr(predicates::str::contains(needle))
    }
}

/// Run a command and start asserting on its result
pub trait RunExt {
    fn passes(&mut self) -> Assert;
    fn fails(&mut self) -> Assert;
}

impl RunExt for Command {
    fn passes(&mut self) -> Assert {
        self.assert().success()
    }

    fn fails(&mut self) -> Assert {
        self.assert().failure()
    }
}
