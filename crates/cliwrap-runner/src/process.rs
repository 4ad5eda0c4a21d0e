use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdin;
use tracing::{debug, info, warn};

use crate::command_spec::CommandSpec;
use crate::error::RunnerError;
use crate::input::{InputAttachment, InputSource, ProcessStdin};
use crate::logger::{Logger, StdoutLogger};
use crate::options::{ApplyOptions, DestroyOptions, ExecuteOptions, RunOptions};
use crate::result::ExecutionResult;
use crate::sink::OutputSink;
use crate::triggers::TriggerWords;

const READ_CHUNK_BYTES: usize = 8192;

// ============================================================================
// WrapperSpec - What Is Being Wrapped
// ============================================================================

/// Identity of the wrapped executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperSpec {
    /// Binary to invoke, resolved through `PATH`
    pub executable_name: String,
    /// Flag that makes the executable skip its confirmation prompts
    pub auto_approve_flag_name: String,
}

impl WrapperSpec {
    #[must_use]
    pub fn new(executable_name: impl Into<String>, auto_approve_flag_name: impl Into<String>) -> Self {
        Self {
            executable_name: executable_name.into(),
            auto_approve_flag_name: auto_approve_flag_name.into(),
        }
    }
}

// ============================================================================
// ProcessRunner - Synchronous and Interactive Execution
// ============================================================================

/// Runs a wrapped executable either to completion with captured output, or
/// interactively with live output and prompt answering.
///
/// One `ProcessRunner` exists per wrapped tool. Its trigger words, logger,
/// sinks and input source belong to it alone; separate runners can drive
/// separate children concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use cliwrap_runner::{ApplyOptions, ProcessRunner, WrapperSpec};
///
/// # async fn example() -> Result<(), cliwrap_runner::RunnerError> {
/// let mut terraform = ProcessRunner::new(WrapperSpec::new("terraform", "-auto-approve"));
/// terraform.add_trigger_word("Enter a value:");
///
/// let plan = terraform.execute_sync("/srv/infra", "plan -no-color", &Default::default()).await?;
/// println!("{}", plan.stdout);
///
/// terraform.apply("/srv/infra", &ApplyOptions::new().auto_approve(true)).await?;
/// # Ok(())
/// # }
/// ```
pub struct ProcessRunner {
    spec: WrapperSpec,
    env: Vec<(OsString, OsString)>,
    triggers: TriggerWords,
    logger: Arc<dyn Logger>,
    stdout_sink: OutputSink,
    stderr_sink: OutputSink,
    input: Arc<dyn InputSource>,
}

impl ProcessRunner {
    /// Create a runner writing to the process's own stdout/stderr and
    /// answering prompts from the process's own stdin.
    #[must_use]
    pub fn new(spec: WrapperSpec) -> Self {
        Self {
            spec,
            env: Vec::new(),
            triggers: TriggerWords::new(),
            logger: Arc::new(StdoutLogger),
            stdout_sink: OutputSink::stdout(),
            stderr_sink: OutputSink::stderr(),
            input: Arc::new(ProcessStdin),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Add an environment variable to every child spawned by this runner.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn spec(&self) -> &WrapperSpec {
        &self.spec
    }

    #[must_use]
    pub fn executable_name(&self) -> &str {
        &self.spec.executable_name
    }

    #[must_use]
    pub fn auto_approve_flag_name(&self) -> &str {
        &self.spec.auto_approve_flag_name
    }

    #[must_use]
    pub fn trigger_words(&self) -> &TriggerWords {
        &self.triggers
    }

    /// Register a phrase that means the child is waiting for input.
    pub fn add_trigger_word(&mut self, word: impl Into<String>) {
        self.triggers.add(word);
    }

    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = logger;
    }

    pub fn set_stdout_sink(&mut self, sink: OutputSink) {
        self.stdout_sink = sink;
    }

    pub fn set_stderr_sink(&mut self, sink: OutputSink) {
        self.stderr_sink = sink;
    }

    pub fn set_input_source(&mut self, input: Arc<dyn InputSource>) {
        self.input = input;
    }

    /// Run `<executable> <args>` through the shell in `cwd` and capture its output.
    ///
    /// `args` is a single pre-joined string and is subject to shell quoting.
    /// Nothing is streamed while the command runs. Unless `options` is
    /// silent, captured stderr and then stdout are sent to the logger once
    /// the command finishes; on failure only stderr is logged.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ChildProcessExecution`] if the shell cannot be
    /// started or the command exits unsuccessfully.
    pub async fn execute_sync(
        &self,
        cwd: impl AsRef<Path>,
        args: &str,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult, RunnerError> {
        let cwd = cwd.as_ref();
        let command_line = if args.trim().is_empty() {
            self.spec.executable_name.clone()
        } else {
            format!("{} {}", self.spec.executable_name, args)
        };
        let silent = options.is_silent();

        debug!(command = %command_line, cwd = %cwd.display(), silent, "executing command");

        let mut cmd = self
            .command_spec(CommandSpec::shell(&command_line), cwd)
            .to_tokio_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(source) => {
                warn!(command = %command_line, error = %source, "failed to start command");
                return Err(RunnerError::ChildProcessExecution {
                    command: command_line,
                    exit_code: None,
                    stderr: String::new(),
                    source: Some(source),
                });
            }
        };

        let result = ExecutionResult::from_bytes(&output.stdout, &output.stderr);

        if !output.status.success() {
            if !silent {
                self.log(&result.stderr).await;
            }
            warn!(
                command = %command_line,
                exit_code = ?output.status.code(),
                "command exited unsuccessfully"
            );
            return Err(RunnerError::ChildProcessExecution {
                command: command_line,
                exit_code: output.status.code(),
                stderr: result.stderr,
                source: None,
            });
        }

        if !silent {
            self.log(&result.stderr).await;
            self.log(&result.stdout).await;
        }

        debug!(command = %command_line, "command completed");
        Ok(result)
    }

    /// Run `<executable> <base_command> [auto-approve flag]` in `cwd`,
    /// streaming its output and answering prompts.
    ///
    /// Every chunk the child writes is added to the returned aggregate and,
    /// unless `options` is silent, forwarded to the stdout/stderr sinks as it
    /// arrives. The first chunk on either stream that contains a trigger word
    /// attaches the runner's input source to the child's stdin; the
    /// attachment lasts until the child exits.
    ///
    /// # Errors
    ///
    /// - [`RunnerError::ConfigurationInvalid`] for `silent = true` with
    ///   `auto_approve = false`; nothing is spawned.
    /// - [`RunnerError::SpawnFailed`] if the executable cannot be started.
    /// - [`RunnerError::NonZeroExit`] if the child exits unsuccessfully. The
    ///   aggregated output is dropped.
    /// - [`RunnerError::StreamFailed`] if reading the child's output fails.
    pub async fn execute_interactive(
        &self,
        base_command: &str,
        cwd: impl AsRef<Path>,
        options: &RunOptions,
    ) -> Result<ExecutionResult, RunnerError> {
        options.validate()?;

        let cwd = cwd.as_ref();
        let mut spec = CommandSpec::new(&self.spec.executable_name).arg(base_command);
        if options.appends_auto_approve() {
            spec = spec.arg(&self.spec.auto_approve_flag_name);
        }
        let spec = self.command_spec(spec, cwd);
        let command = spec.display_line();
        let live = options.streams_live();

        info!(command = %command, cwd = %cwd.display(), live, "starting interactive run");

        let mut cmd = spec.to_tokio_command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| RunnerError::SpawnFailed {
            program: self.spec.executable_name.clone(),
            source,
        })?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| missing_pipe(&command, "stdout"))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| missing_pipe(&command, "stderr"))?;

        let mut run = InteractiveRun {
            runner: self,
            command: command.clone(),
            stdout_live: live,
            stderr_live: live,
            stdout: Vec::new(),
            stderr: Vec::new(),
            child_stdin: child.stdin.take(),
            attachment: None,
        };

        let mut stdout_buf = vec![0u8; READ_CHUNK_BYTES];
        let mut stderr_buf = vec![0u8; READ_CHUNK_BYTES];
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                stdout_result = stdout_pipe.read(&mut stdout_buf), if stdout_open => {
                    match stdout_result {
                        Ok(0) => stdout_open = false,
                        Ok(n) => run.on_chunk(Stream::Stdout, &stdout_buf[..n]).await,
                        Err(source) => return Err(stream_failed(&command, "stdout", source)),
                    }
                }
                stderr_result = stderr_pipe.read(&mut stderr_buf), if stderr_open => {
                    match stderr_result {
                        Ok(0) => stderr_open = false,
                        Ok(n) => run.on_chunk(Stream::Stderr, &stderr_buf[..n]).await,
                        Err(source) => return Err(stream_failed(&command, "stderr", source)),
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|source| stream_failed(&command, "process", source))?;

        run.release_input();

        if !status.success() {
            warn!(command = %command, exit_code = ?status.code(), "interactive run failed");
            return Err(RunnerError::NonZeroExit {
                command,
                exit_code: status.code(),
            });
        }

        run.finish_forwarding().await;

        info!(command = %command, "interactive run completed");
        Ok(run.into_result())
    }

    /// Interactive `apply` run.
    ///
    /// # Errors
    ///
    /// See [`ProcessRunner::execute_interactive`].
    pub async fn apply(
        &self,
        cwd: impl AsRef<Path>,
        options: &ApplyOptions,
    ) -> Result<ExecutionResult, RunnerError> {
        self.execute_interactive("apply", cwd, options).await
    }

    /// Interactive `destroy` run.
    ///
    /// # Errors
    ///
    /// See [`ProcessRunner::execute_interactive`].
    pub async fn destroy(
        &self,
        cwd: impl AsRef<Path>,
        options: &DestroyOptions,
    ) -> Result<ExecutionResult, RunnerError> {
        self.execute_interactive("destroy", cwd, options).await
    }

    fn command_spec(&self, spec: CommandSpec, cwd: &Path) -> CommandSpec {
        let spec = spec.cwd(cwd);
        if self.env.is_empty() {
            spec
        } else {
            spec.envs(self.env.iter().cloned())
        }
    }

    async fn log(&self, text: &str) {
        if !text.is_empty() {
            self.logger.log(text).await;
        }
    }
}

impl fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("spec", &self.spec)
            .field("triggers", &self.triggers)
            .field("stdout_sink", &self.stdout_sink)
            .field("stderr_sink", &self.stderr_sink)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Per-call state of one interactive run.
///
/// Owns the child's stdin until a trigger word hands it to an
/// [`InputAttachment`]; dropping the run drops both.
struct InteractiveRun<'a> {
    runner: &'a ProcessRunner,
    command: String,
    stdout_live: bool,
    stderr_live: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    child_stdin: Option<ChildStdin>,
    attachment: Option<InputAttachment>,
}

impl InteractiveRun<'_> {
    async fn on_chunk(&mut self, stream: Stream, chunk: &[u8]) {
        let (aggregate, sink, live) = match stream {
            Stream::Stdout => (&mut self.stdout, &self.runner.stdout_sink, &mut self.stdout_live),
            Stream::Stderr => (&mut self.stderr, &self.runner.stderr_sink, &mut self.stderr_live),
        };
        aggregate.extend_from_slice(chunk);

        if *live {
            if let Err(err) = sink.write_chunk(chunk).await {
                warn!(
                    command = %self.command,
                    stream = stream.as_str(),
                    error = %err,
                    "output sink failed; no longer forwarding this stream"
                );
                *live = false;
            }
        }

        if self.attachment.is_none() {
            let text = String::from_utf8_lossy(chunk);
            if let Some(word) = self.runner.triggers.first_match(&text) {
                if let Some(child_stdin) = self.child_stdin.take() {
                    info!(
                        command = %self.command,
                        stream = stream.as_str(),
                        trigger = word,
                        "prompt detected; forwarding input"
                    );
                    self.attachment = Some(InputAttachment::attach(
                        self.runner.input.as_ref(),
                        child_stdin,
                        &self.command,
                    ));
                }
            }
        }
    }

    fn release_input(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            attachment.detach();
        }
        self.child_stdin = None;
    }

    async fn finish_forwarding(&mut self) {
        for (live, sink) in [
            (self.stdout_live, &self.runner.stdout_sink),
            (self.stderr_live, &self.runner.stderr_sink),
        ] {
            if live {
                if let Err(err) = sink.flush().await {
                    debug!(command = %self.command, error = %err, "failed to flush output sink");
                }
            }
        }
        self.stdout_live = false;
        self.stderr_live = false;
    }

    fn into_result(self) -> ExecutionResult {
        ExecutionResult::from_bytes(&self.stdout, &self.stderr)
    }
}

fn missing_pipe(command: &str, stream: &'static str) -> RunnerError {
    stream_failed(
        command,
        stream,
        std::io::Error::other(format!("{stream} was not captured")),
    )
}

fn stream_failed(command: &str, stream: &'static str, source: std::io::Error) -> RunnerError {
    RunnerError::StreamFailed {
        command: command.to_string(),
        stream,
        source,
    }
}
