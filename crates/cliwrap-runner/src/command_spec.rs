use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

// ============================================================================
// CommandSpec - Process Invocation Description
// ============================================================================

/// Description of a single process invocation.
///
/// Every spawn in this crate goes through a `CommandSpec`. The interactive
/// path builds one with discrete arguments; the synchronous path builds one
/// with [`CommandSpec::shell`], which hands a single command line to the
/// platform shell. Quoting rules therefore only ever apply to the
/// synchronous path.
///
/// # Example
///
/// ```rust
/// use cliwrap_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("terraform")
///     .arg("apply")
///     .arg("-auto-approve")
///     .cwd("/srv/infra");
///
/// assert_eq!(cmd.program, OsString::from("terraform"));
/// assert_eq!(cmd.args.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements
    pub args: Vec<OsString>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
    /// Optional environment overrides
    pub env: Option<HashMap<OsString, OsString>>,
}

impl CommandSpec {
    /// Create a new `CommandSpec` for the given program.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    /// Create a `CommandSpec` that runs `command_line` through the platform shell.
    ///
    /// Uses `sh -c` on Unix and `cmd /C` on Windows. The command line is passed
    /// as one argument and is interpreted by the shell.
    ///
    /// ```rust
    /// use cliwrap_runner::CommandSpec;
    ///
    /// let cmd = CommandSpec::shell("terraform plan -no-color");
    /// assert_eq!(cmd.args.last().unwrap(), "terraform plan -no-color");
    /// ```
    #[must_use]
    pub fn shell(command_line: impl Into<OsString>) -> Self {
        #[cfg(windows)]
        let (shell, shell_arg) = ("cmd", "/C");
        #[cfg(not(windows))]
        let (shell, shell_arg) = ("sh", "-c");

        Self::new(shell).arg(shell_arg).arg(command_line)
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables for the child.
    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in envs {
            env.insert(key.into(), value.into());
        }
        self
    }

    /// Human readable rendering used in logs and error messages.
    #[must_use]
    pub fn display_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Convert this `CommandSpec` into a `tokio::process::Command`.
    ///
    /// The returned command has `kill_on_drop` set, so dropping the future
    /// that owns the child also terminates the child.
    #[must_use]
    pub fn to_tokio_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.kill_on_drop(true);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        if let Some(ref env) = self.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        cmd
    }
}
