use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use cliwrap_runner::{OutputOptions, ProcessRunner, ResolvedOutputOptions, WrapperSpec};

use crate::discovery::{CONFIG_ENV_VAR, discover_config_file_from};
use crate::error::ConfigError;

/// `[wrapper]` section: what to run and how to recognize its prompts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WrapperSection {
    /// Executable name or path
    pub executable: String,
    /// Flag that suppresses the executable's confirmation prompts
    pub auto_approve_flag: String,
    /// Phrases that mean the executable is waiting for input
    #[serde(default)]
    pub trigger_words: Vec<String>,
}

/// A complete wrapper definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WrapperConfig {
    pub wrapper: WrapperSection,
    #[serde(default)]
    pub output: OutputOptions,
}

impl WrapperConfig {
    /// Parse and validate a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] for values that fail validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` does not exist, otherwise
    /// the errors of [`WrapperConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        debug!(path = %path.display(), "loading wrapper config");
        Self::parse(&content, path)
    }

    /// Locate and load the config that applies to `start_dir`.
    ///
    /// `CLIWRAP_CONFIG`, when set, names the file directly. Otherwise the
    /// search walks upward from `start_dir` looking for `.cliwrap/config.toml`.
    /// Returns `Ok(None)` when no config exists.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`WrapperConfig::load`]; a `CLIWRAP_CONFIG`
    /// pointing at a missing file is [`ConfigError::NotFound`].
    pub fn discover(start_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(explicit) if !explicit.is_empty() => Some(PathBuf::from(explicit)),
            _ => discover_config_file_from(start_dir),
        };
        path.map(|path| Self::load(&path)).transpose()
    }

    /// Output options with defaults applied.
    ///
    /// These are consumed by the caller. [`WrapperConfig::build_runner`] does
    /// not read them.
    #[must_use]
    pub fn output_options(&self) -> ResolvedOutputOptions {
        self.output.normalize()
    }

    /// Build a runner for this wrapper with its trigger words registered.
    #[must_use]
    pub fn build_runner(&self) -> ProcessRunner {
        let mut runner = ProcessRunner::new(WrapperSpec::new(
            &self.wrapper.executable,
            &self.wrapper.auto_approve_flag,
        ));
        for word in &self.wrapper.trigger_words {
            runner.add_trigger_word(word);
        }
        runner
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let executable = &self.wrapper.executable;
        if executable.trim().is_empty() {
            return Err(invalid("wrapper.executable", "must not be empty"));
        }
        if executable.chars().any(char::is_whitespace) {
            return Err(invalid(
                "wrapper.executable",
                "must be a single executable name without arguments",
            ));
        }
        if self.wrapper.auto_approve_flag.trim().is_empty() {
            return Err(invalid("wrapper.auto_approve_flag", "must not be empty"));
        }
        if let Some(index) = self
            .wrapper
            .trigger_words
            .iter()
            .position(|word| word.is_empty())
        {
            return Err(invalid(
                &format!("wrapper.trigger_words[{index}]"),
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
