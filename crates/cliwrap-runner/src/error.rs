//! Error types for the runner crate

use std::io;
use thiserror::Error;

/// Failures surfaced by [`ProcessRunner`](crate::ProcessRunner) operations.
///
/// Spawn failures and non-zero exits are separate variants so callers can
/// tell "the tool is missing" apart from "the tool ran and refused".
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Invalid option combination detected before anything was spawned.
    #[error("Runner configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },

    /// The OS refused to start the process.
    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Interactive run finished with a non-zero exit code.
    ///
    /// Output aggregated during the run is not carried here.
    #[error("'{command}' exited with {}", describe_exit(.exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
    },

    /// Synchronous run failed to start or finished unsuccessfully.
    #[error("Command failed: {command} ({})", describe_exit(.exit_code))]
    ChildProcessExecution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Reading from or writing to one of the child's streams failed.
    #[error("I/O error on {stream} of '{command}': {source}")]
    StreamFailed {
        command: String,
        stream: &'static str,
        #[source]
        source: io::Error,
    },
}

impl RunnerError {
    /// True when the process never started.
    #[must_use]
    pub fn is_spawn_failure(&self) -> bool {
        match self {
            Self::SpawnFailed { .. } => true,
            Self::ChildProcessExecution { source, .. } => source.is_some(),
            _ => false,
        }
    }

    /// True when the process ran and exited unsuccessfully.
    #[must_use]
    pub fn is_non_zero_exit(&self) -> bool {
        match self {
            Self::NonZeroExit { .. } => true,
            Self::ChildProcessExecution { source, .. } => source.is_none(),
            _ => false,
        }
    }

    /// Exit code of the failed process, if it exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. }
            | Self::ChildProcessExecution { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_failure_classification() {
        let err = RunnerError::SpawnFailed {
            program: "terraform".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.is_spawn_failure());
        assert!(!err.is_non_zero_exit());
        assert_eq!(err.exit_code(), None);
        assert!(err.to_string().contains("terraform"));
    }

    #[test]
    fn test_non_zero_exit_message() {
        let err = RunnerError::NonZeroExit {
            command: "terraform apply".to_string(),
            exit_code: Some(1),
        };
        assert!(err.is_non_zero_exit());
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.to_string(), "'terraform apply' exited with exit code 1");
    }

    #[test]
    fn test_child_process_execution_classification() {
        let exited = RunnerError::ChildProcessExecution {
            command: "terraform init".to_string(),
            exit_code: Some(2),
            stderr: "boom".to_string(),
            source: None,
        };
        assert!(exited.is_non_zero_exit());
        assert!(!exited.is_spawn_failure());

        let not_started = RunnerError::ChildProcessExecution {
            command: "terraform init".to_string(),
            exit_code: None,
            stderr: String::new(),
            source: Some(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        };
        assert!(not_started.is_spawn_failure());
        assert!(not_started.to_string().contains("no exit code"));
    }
}
