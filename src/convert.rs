use crate::config::{PANDOC_FROM, PANDOC_TO};
use crate::error::MigrateError;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Turns a MediaWiki source file into Markdown.
///
/// `Err(MigrateError::Conversion)` means this revision can't be converted and
/// should be skipped; any other error is fatal.
pub trait Converter {
    fn convert(&self, source: &Path) -> Result<String, MigrateError>;
}

impl<T: Converter + ?Sized> Converter for &T {
    fn convert(&self, source: &Path) -> Result<String, MigrateError> {
        (**self).convert(source)
    }
}

/// Shells out to pandoc.
#[derive(Debug, Clone)]
pub struct Pandoc {
    program: String,
}

impl Pandoc {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Converter for Pandoc {
    fn convert(&self, source: &Path) -> Result<String, MigrateError> {
        debug!(source = ?source, "Running pandoc");
        let output = Command::new(&self.program)
            .args(["-f", PANDOC_FROM, "-t", PANDOC_TO])
            .arg(source)
            .output()
            .map_err(|e| MigrateError::Collaborator {
                command: self.program.clone(),
                status: None,
                diagnostic: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(source = ?source, "pandoc: {}", stderr.trim_end());
        }

        if !output.status.success() {
            return Err(MigrateError::Conversion {
                path: source.to_path_buf(),
                reason: format!("pandoc exited with {}", output.status),
            });
        }
        if stdout.is_empty() {
            return Err(MigrateError::Conversion {
                path: source.to_path_buf(),
                reason: "no output from pandoc".to_string(),
            });
        }
        Ok(stdout)
    }
}
