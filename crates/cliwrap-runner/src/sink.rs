//! Replaceable writers that receive live output from interactive runs.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, AsyncWriteExt};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared handle to an async writer.
///
/// Clones refer to the same writer. Writes from one run are serialized by an
/// async mutex, so chunks land in the order they were forwarded.
#[derive(Clone)]
pub struct OutputSink {
    label: &'static str,
    writer: Arc<tokio::sync::Mutex<BoxedWriter>>,
}

impl OutputSink {
    /// The process's own standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_label("stdout", tokio::io::stdout())
    }

    /// The process's own standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_label("stderr", tokio::io::stderr())
    }

    /// Wrap an arbitrary writer.
    #[must_use]
    pub fn from_writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::with_label("custom", writer)
    }

    fn with_label<W>(label: &'static str, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            label,
            writer: Arc::new(tokio::sync::Mutex::new(Box::new(writer))),
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Write a chunk and flush it so consumers see it immediately.
    ///
    /// # Errors
    ///
    /// Returns the writer's I/O error.
    pub async fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(chunk).await?;
        writer.flush().await
    }

    /// # Errors
    ///
    /// Returns the writer's I/O error.
    pub async fn flush(&self) -> io::Result<()> {
        self.writer.lock().await.flush().await
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// In-memory writer whose contents can be read back while a run is active.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .map(|bytes| bytes.clone())
            .unwrap_or_default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// A sink writing into this buffer.
    #[must_use]
    pub fn sink(&self) -> OutputSink {
        OutputSink::with_label("buffer", self.clone())
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let written = self
            .bytes
            .lock()
            .map(|mut bytes| {
                bytes.extend_from_slice(buf);
                buf.len()
            })
            .map_err(|_| io::Error::other("shared buffer lock poisoned"));
        Poll::Ready(written)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
