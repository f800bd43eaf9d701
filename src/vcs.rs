use crate::error::MigrateError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

/// The history being written. Paths are relative to the working tree.
pub trait VersionControl {
    fn stage(&mut self, paths: &[String]) -> Result<(), MigrateError>;

    fn commit(
        &mut self,
        paths: &[String],
        author: &str,
        timestamp: &str,
        message: &str,
    ) -> Result<(), MigrateError>;

    /// Discards every uncommitted change to tracked files.
    fn hard_reset(&mut self) -> Result<(), MigrateError>;
}

impl<T: VersionControl + ?Sized> VersionControl for &mut T {
    fn stage(&mut self, paths: &[String]) -> Result<(), MigrateError> {
        (**self).stage(paths)
    }

    fn commit(
        &mut self,
        paths: &[String],
        author: &str,
        timestamp: &str,
        message: &str,
    ) -> Result<(), MigrateError> {
        (**self).commit(paths, author, timestamp, message)
    }

    fn hard_reset(&mut self) -> Result<(), MigrateError> {
        (**self).hard_reset()
    }
}

/// Drives the `git` command line inside a working tree.
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
    work_dir: PathBuf,
}

impl Git {
    /// Fails with a config error unless `work_dir` holds a `.git` directory.
    pub fn open(program: impl Into<String>, work_dir: &Path) -> Result<Self, MigrateError> {
        if !work_dir.join(".git").is_dir() {
            return Err(MigrateError::Config(format!(
                "expected to be in a git repository: no .git in {:?}",
                work_dir
            )));
        }
        Ok(Self {
            program: program.into(),
            work_dir: work_dir.to_path_buf(),
        })
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.work_dir);
        cmd
    }

    fn check(&self, description: String, output: std::io::Result<Output>) -> Result<(), MigrateError> {
        let output = output.map_err(|e| MigrateError::Collaborator {
            command: description.clone(),
            status: None,
            diagnostic: e.to_string(),
        })?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            if !stderr.trim().is_empty() {
                warn!(command = %description, "{}", stderr.trim_end());
            }
            return Ok(());
        }
        Err(MigrateError::Collaborator {
            command: description,
            status: output.status.code(),
            diagnostic: format!("{}{}", String::from_utf8_lossy(&output.stdout), stderr),
        })
    }
}

impl VersionControl for Git {
    fn stage(&mut self, paths: &[String]) -> Result<(), MigrateError> {
        debug!(?paths, "git add");
        let output = self.command().arg("add").arg("--").args(paths).output();
        self.check(format!("{} add {}", self.program, paths.join(" ")), output)
    }

    fn commit(
        &mut self,
        paths: &[String],
        author: &str,
        timestamp: &str,
        message: &str,
    ) -> Result<(), MigrateError> {
        let description = format!(
            "{} commit --date {} --author {:?} {}",
            self.program,
            timestamp,
            author,
            paths.join(" ")
        );
        debug!(command = %description, "git commit");

        // The message goes through stdin so quotes and newlines need no escaping.
        let child = self
            .command()
            .arg("commit")
            .args(["--date", timestamp, "--author", author, "-F", "-", "--allow-empty", "--"])
            .args(paths)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => return self.check(description, Err(e)),
        };
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(message.as_bytes()) {
                let _ = child.kill();
                return self.check(description, Err(e));
            }
        }
        self.check(description, child.wait_with_output())
    }

    fn hard_reset(&mut self) -> Result<(), MigrateError> {
        let output = self.command().args(["reset", "--hard"]).output();
        self.check(format!("{} reset --hard", self.program), output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_requires_git_directory() {
        let dir = TempDir::new().unwrap();
        let err = Git::open("git", dir.path()).unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));

        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(Git::open("git", dir.path()).is_ok());
    }

    #[test]
    fn missing_program_is_collaborator_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let mut git = Git::open("definitely-not-a-real-git-binary", dir.path()).unwrap();
        let err = git.hard_reset().unwrap_err();
        assert!(matches!(
            err,
            MigrateError::Collaborator { status: None, .. }
        ));
        assert_eq!(err.exit_status(), 1);
    }
}
