//! Attachment of the parent's input stream to a child's stdin.
//!
//! The parent's stdin is a process-wide resource. An [`InputAttachment`] is
//! the only way a run holds it: creating one starts forwarding into the
//! child, dropping one stops forwarding and closes the child's stdin. Every
//! exit path of a run therefore releases the input, including early returns
//! and dropped futures.
//!
//! Blocking reads of fd 0 cannot be cancelled, so process stdin is drained by
//! one dedicated thread for the life of the process ([`ThreadedInput`]).
//! Attachments only borrow its channel. No runtime task is left blocked on
//! stdin after a run, and a runtime can shut down as soon as its runs finish.

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reader handed out by an [`InputSource`].
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Supplies the stream that answers a child's prompts.
pub trait InputSource: Send + Sync {
    /// Open a fresh reader for one attachment.
    fn open(&self) -> BoxedReader;
}

const PUMP_CHUNK: usize = 8 * 1024;
const PUMP_DEPTH: usize = 16;

/// The parent process's standard input. The default input source.
///
/// The reader thread starts on the first attachment and is shared by every
/// later one. Input typed between runs is buffered and goes to the next run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStdin;

impl InputSource for ProcessStdin {
    fn open(&self) -> BoxedReader {
        static STDIN: OnceLock<ThreadedInput> = OnceLock::new();
        STDIN
            .get_or_init(|| ThreadedInput::spawn(io::stdin(), "cliwrap-stdin"))
            .open()
    }
}

#[derive(Debug)]
struct PumpState {
    chunks: mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

/// Input source fed by a blocking reader on its own thread.
///
/// Readers opened from one `ThreadedInput` share a single queue, so bytes
/// one attachment did not consume stay available to the next.
#[derive(Debug, Clone)]
pub struct ThreadedInput {
    state: Arc<Mutex<PumpState>>,
}

impl ThreadedInput {
    /// Start draining `source` on a detached thread named `thread_name`.
    pub fn spawn<R>(source: R, thread_name: &str) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(PUMP_DEPTH);
        let spawned = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || pump(source, &tx));
        if let Err(err) = spawned {
            // The sender went down with the closure; readers see end of stream.
            warn!(error = %err, "failed to start input reader thread");
        }
        Self {
            state: Arc::new(Mutex::new(PumpState {
                chunks: rx,
                pending: Vec::new(),
            })),
        }
    }
}

impl InputSource for ThreadedInput {
    fn open(&self) -> BoxedReader {
        Box::new(ThreadedReader {
            state: Arc::clone(&self.state),
        })
    }
}

fn pump<R: Read>(mut source: R, tx: &mpsc::Sender<Vec<u8>>) {
    let mut buf = vec![0u8; PUMP_CHUNK];
    loop {
        match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.blocking_send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                debug!(error = %err, "input reader stopped");
                break;
            }
        }
    }
}

struct ThreadedReader {
    state: Arc<Mutex<PumpState>>,
}

impl AsyncRead for ThreadedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("input queue lock poisoned"))?;
        if state.pending.is_empty() {
            match state.chunks.poll_recv(cx) {
                Poll::Ready(Some(chunk)) => state.pending = chunk,
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }
        let n = state.pending.len().min(buf.remaining());
        buf.put_slice(&state.pending[..n]);
        state.pending.drain(..n);
        Poll::Ready(Ok(()))
    }
}

static ACTIVE_ATTACHMENTS: AtomicUsize = AtomicUsize::new(0);

/// Number of input attachments currently alive in this process.
#[must_use]
pub fn active_input_attachments() -> usize {
    ACTIVE_ATTACHMENTS.load(Ordering::SeqCst)
}

/// Scoped forwarding of an input source into one child's stdin.
#[derive(Debug)]
pub struct InputAttachment {
    command: String,
    forwarder: JoinHandle<()>,
}

impl InputAttachment {
    /// Start forwarding `source` into `child_stdin`.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn attach(source: &dyn InputSource, child_stdin: ChildStdin, command: &str) -> Self {
        let already_attached = ACTIVE_ATTACHMENTS.fetch_add(1, Ordering::SeqCst);
        if already_attached > 0 {
            warn!(
                command,
                already_attached, "input is already attached to another run; interactive runs should be serialized"
            );
        }

        let mut reader = source.open();
        let label = command.to_string();
        let forwarder = tokio::spawn(async move {
            let mut child_stdin = child_stdin;
            match tokio::io::copy(&mut reader, &mut child_stdin).await {
                Ok(bytes) => debug!(command = %label, bytes, "input source reached end of stream"),
                Err(err) => debug!(command = %label, error = %err, "input forwarding stopped"),
            }
            let _ = child_stdin.shutdown().await;
        });

        debug!(command, "attached input to child stdin");
        Self {
            command: command.to_string(),
            forwarder,
        }
    }

    /// Stop forwarding and close the child's stdin.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for InputAttachment {
    fn drop(&mut self) {
        self.forwarder.abort();
        ACTIVE_ATTACHMENTS.fetch_sub(1, Ordering::SeqCst);
        debug!(command = %self.command, "detached input from child stdin");
    }
}
