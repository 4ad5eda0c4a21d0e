//! Logger capability that receives captured output from synchronous runs.

use async_trait::async_trait;
use std::fmt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Destination for text captured by [`ProcessRunner::execute_sync`](crate::ProcessRunner::execute_sync).
///
/// Implementations must not fail; a logger that cannot write reports the
/// problem through `tracing` and drops the text.
#[async_trait]
pub trait Logger: Send + Sync {
    async fn log(&self, text: &str);
}

/// Writes text verbatim to the process's standard output. The default logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutLogger;

#[async_trait]
impl Logger for StdoutLogger {
    async fn log(&self, text: &str) {
        let mut stdout = tokio::io::stdout();
        let written = async {
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await
        }
        .await;
        if let Err(err) = written {
            warn!(error = %err, "failed to write captured output to stdout");
        }
    }
}

/// Emits each logged text as an `info` event on the `cliwrap::output` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

#[async_trait]
impl Logger for TracingLogger {
    async fn log(&self, text: &str) {
        info!(target: "cliwrap::output", "{}", text.trim_end());
    }
}

/// Adapts a plain closure into a [`Logger`].
pub struct FnLogger<F>(pub F);

impl<F> fmt::Debug for FnLogger<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLogger")
    }
}

#[async_trait]
impl<F> Logger for FnLogger<F>
where
    F: Fn(&str) + Send + Sync,
{
    async fn log(&self, text: &str) {
        (self.0)(text);
    }
}
