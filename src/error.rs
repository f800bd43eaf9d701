use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds the pipeline distinguishes. Only `Conversion` is recovered
/// from (the revision is skipped); every other kind aborts the run.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed dump structure: {0}")]
    Structure(String),

    #[error("could not convert {path:?}: {reason}")]
    Conversion { path: PathBuf, reason: String },

    #[error("could not fetch {title} as of {timestamp}: {reason}")]
    Fetch {
        title: String,
        timestamp: String,
        reason: String,
    },

    #[error("{command} failed ({}):\n{diagnostic}", describe_status(.status))]
    Collaborator {
        command: String,
        status: Option<i32>,
        diagnostic: String,
    },
}

impl MigrateError {
    /// Exit status the process should terminate with for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            MigrateError::Collaborator {
                status: Some(code), ..
            } if (1..=255).contains(code) => *code as u8,
            _ => 1,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}
