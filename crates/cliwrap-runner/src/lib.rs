//! Process runner for wrapping an external command-line tool
//!
//! A [`ProcessRunner`] is configured with the executable to wrap and the flag
//! that skips its confirmation prompts. It offers two ways to run the tool:
//!
//! - [`ProcessRunner::execute_sync`] runs a shell command line to completion
//!   and returns the captured output, logging it afterwards.
//! - [`ProcessRunner::execute_interactive`] runs a subcommand with discrete
//!   arguments, forwards its output live, and connects the parent's stdin to
//!   the child as soon as the child prints one of the registered trigger
//!   words.
//!
//! Neither path retries, times out, or supports cancellation. A hung child
//! hangs the caller; wrap calls in `tokio::time::timeout` if that matters.

pub mod command_spec;
pub mod error;
pub mod input;
pub mod logger;
pub mod options;
pub mod process;
pub mod result;
pub mod sink;
pub mod triggers;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use input::{
    BoxedReader, InputAttachment, InputSource, ProcessStdin, ThreadedInput, active_input_attachments,
};
pub use logger::{FnLogger, Logger, StdoutLogger, TracingLogger};
pub use options::{
    ApplyOptions, DestroyOptions, ExecuteOptions, InteractiveOptions, OutputOptions,
    ResolvedOutputOptions, RunOptions, normalize_output_options,
};
pub use process::{ProcessRunner, WrapperSpec};
pub use result::ExecutionResult;
pub use sink::{OutputSink, SharedBuffer};
pub use triggers::TriggerWords;
