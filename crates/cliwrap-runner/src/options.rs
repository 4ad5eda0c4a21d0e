//! Option shapes accepted by the runner and the output option normalizer.

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Options for an interactive run.
///
/// Both fields are tri-state: an unset field is different from an explicit
/// `false`. Only the explicit combination `silent = true` together with
/// `auto_approve = false` is rejected, since nothing would be able to answer
/// a prompt the child might print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InteractiveOptions {
    /// Append the wrapper's auto-approve flag to the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
    /// Suppress live forwarding of child output to the sinks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

/// Options for [`ProcessRunner::execute_interactive`](crate::ProcessRunner::execute_interactive).
pub type RunOptions = InteractiveOptions;
/// Options for [`ProcessRunner::apply`](crate::ProcessRunner::apply).
pub type ApplyOptions = InteractiveOptions;
/// Options for [`ProcessRunner::destroy`](crate::ProcessRunner::destroy).
pub type DestroyOptions = InteractiveOptions;

impl InteractiveOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auto_approve: None,
            silent: None,
        }
    }

    #[must_use]
    pub const fn auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = Some(auto_approve);
        self
    }

    #[must_use]
    pub const fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    /// Whether child output is forwarded to the sinks.
    #[must_use]
    pub fn streams_live(&self) -> bool {
        !self.silent.unwrap_or(false)
    }

    /// Whether the auto-approve flag is appended.
    #[must_use]
    pub fn appends_auto_approve(&self) -> bool {
        self.auto_approve.unwrap_or(false)
    }

    /// Reject option combinations that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ConfigurationInvalid`] for `silent = true` with
    /// `auto_approve = false`.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.silent == Some(true) && self.auto_approve == Some(false) {
            return Err(RunnerError::ConfigurationInvalid {
                reason: "silent output requires auto-approve: a prompt could not be answered"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Options for [`ProcessRunner::execute_sync`](crate::ProcessRunner::execute_sync).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    /// Skip writing captured output to the logger (default: false)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

impl ExecuteOptions {
    #[must_use]
    pub const fn silent(silent: bool) -> Self {
        Self {
            silent: Some(silent),
        }
    }

    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.silent.unwrap_or(false)
    }
}

/// Partial output options as supplied by callers or config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<bool>,
}

/// Output options with every field filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOutputOptions {
    pub silent: bool,
    pub simple: bool,
}

impl Default for ResolvedOutputOptions {
    fn default() -> Self {
        normalize_output_options(&OutputOptions::default())
    }
}

impl OutputOptions {
    /// See [`normalize_output_options`].
    #[must_use]
    pub fn normalize(&self) -> ResolvedOutputOptions {
        normalize_output_options(self)
    }
}

/// Fill unset output options with their defaults (`silent = true`, `simple = true`).
#[must_use]
pub fn normalize_output_options(options: &OutputOptions) -> ResolvedOutputOptions {
    ResolvedOutputOptions {
        silent: options.silent.unwrap_or(true),
        simple: options.simple.unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults_to_true() {
        let resolved = normalize_output_options(&OutputOptions::default());
        assert!(resolved.silent);
        assert!(resolved.simple);
        assert_eq!(resolved, ResolvedOutputOptions::default());
    }

    #[test]
    fn test_normalize_keeps_explicit_values() {
        let resolved = OutputOptions {
            silent: Some(false),
            simple: None,
        }
        .normalize();
        assert!(!resolved.silent);
        assert!(resolved.simple);

        let resolved = OutputOptions {
            silent: None,
            simple: Some(false),
        }
        .normalize();
        assert!(resolved.silent);
        assert!(!resolved.simple);
    }

    #[test]
    fn test_validate_rejects_silent_without_auto_approve() {
        let options = InteractiveOptions::new().silent(true).auto_approve(false);
        assert!(matches!(
            options.validate(),
            Err(RunnerError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_other_combinations() {
        for options in [
            InteractiveOptions::new(),
            InteractiveOptions::new().silent(true),
            InteractiveOptions::new().silent(true).auto_approve(true),
            InteractiveOptions::new().silent(false).auto_approve(false),
            InteractiveOptions::new().auto_approve(false),
        ] {
            assert!(options.validate().is_ok(), "{options:?}");
        }
    }

    #[test]
    fn test_interactive_defaults() {
        let options = InteractiveOptions::default();
        assert!(options.streams_live());
        assert!(!options.appends_auto_approve());
    }

    #[test]
    fn test_execute_options_default_logs() {
        assert!(!ExecuteOptions::default().is_silent());
        assert!(ExecuteOptions::silent(true).is_silent());
    }

    #[test]
    fn test_output_options_deserialize_partial() {
        let options: OutputOptions = serde_json::from_str(r#"{"silent": false}"#).unwrap();
        assert_eq!(options.silent, Some(false));
        assert_eq!(options.simple, None);
    }
}
