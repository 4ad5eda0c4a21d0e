//! cliwrap - drive an external command-line tool from Rust
//!
//! This crate bundles the runner and config crates behind one dependency:
//!
//! - [`runner`]: [`ProcessRunner`] with buffered (`execute_sync`) and
//!   interactive (`execute_interactive`, `apply`, `destroy`) execution.
//! - [`config`]: [`WrapperConfig`], wrapper definitions read from
//!   `.cliwrap/config.toml`.
//! - [`logging`]: `tracing` subscriber setup.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cliwrap::{ApplyOptions, ProcessRunner, WrapperSpec};
//!
//! # async fn example() -> anyhow::Result<()> {
//! cliwrap::logging::init_tracing(false).ok();
//!
//! let mut terraform = ProcessRunner::new(WrapperSpec::new("terraform", "-auto-approve"));
//! terraform.add_trigger_word("Enter a value:");
//! let result = terraform.apply("infra", &ApplyOptions::new()).await?;
//! println!("{} bytes of output", result.stdout.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;

pub mod logging;

pub use cliwrap_config as config;
pub use cliwrap_runner as runner;

pub use cliwrap_config::{ConfigError, WrapperConfig};
pub use cliwrap_runner::{
    ApplyOptions, DestroyOptions, ExecuteOptions, ExecutionResult, InteractiveOptions, Logger,
    OutputOptions, OutputSink, ProcessRunner, RunOptions, RunnerError, TriggerWords, WrapperSpec,
};

/// Build a runner from the config file that applies to `start_dir`.
///
/// Returns `Ok(None)` when no config file is found.
///
/// # Errors
///
/// Fails when a config file exists but cannot be read, parsed or validated.
pub fn runner_from_discovered_config(start_dir: &Path) -> Result<Option<ProcessRunner>> {
    let config = WrapperConfig::discover(start_dir).with_context(|| {
        format!(
            "Failed to load wrapper configuration for {}",
            start_dir.display()
        )
    })?;
    Ok(config.map(|config| config.build_runner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_runner_from_discovered_config() {
        unsafe { std::env::remove_var(config::CONFIG_ENV_VAR) };
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let config_dir = temp.path().join(config::CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join(config::CONFIG_FILE),
            "[wrapper]\nexecutable = \"terraform\"\nauto_approve_flag = \"-auto-approve\"\ntrigger_words = [\"Enter a value:\"]\n",
        )
        .unwrap();

        let runner = runner_from_discovered_config(temp.path()).unwrap().unwrap();

        assert_eq!(runner.executable_name(), "terraform");
        assert_eq!(runner.trigger_words().len(), 1);
    }

    #[test]
    #[serial]
    fn test_invalid_config_carries_context() {
        unsafe { std::env::remove_var(config::CONFIG_ENV_VAR) };
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let config_dir = temp.path().join(config::CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join(config::CONFIG_FILE), "[wrapper]\n").unwrap();

        let err = runner_from_discovered_config(temp.path()).unwrap_err();

        assert!(format!("{err:#}").contains("Failed to load wrapper configuration"));
    }
}
