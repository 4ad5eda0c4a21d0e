//! Wrapper definitions loaded from TOML
//!
//! A wrapper can be declared in `.cliwrap/config.toml` instead of code:
//!
//! ```toml
//! [wrapper]
//! executable = "terraform"
//! auto_approve_flag = "-auto-approve"
//! trigger_words = ["Enter a value:"]
//!
//! [output]
//! silent = false
//! ```
//!
//! [`WrapperConfig::discover`] finds the file, [`WrapperConfig::build_runner`]
//! turns it into a ready [`ProcessRunner`](cliwrap_runner::ProcessRunner).
//!
//! The `[output]` section is not applied to the runner. It is for the caller
//! deciding how to present results: read it with
//! [`WrapperConfig::output_options`] and pass `silent` on to the run options.

mod discovery;
mod error;
mod model;

pub use discovery::{CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE, discover_config_file_from};
pub use error::ConfigError;
pub use model::{WrapperConfig, WrapperSection};
