//! Tracing setup for binaries and tests embedding cliwrap.
//!
//! Runner diagnostics are emitted as `tracing` events; nothing is printed
//! unless a subscriber is installed. Captured tool output goes through the
//! runner's [`Logger`](cliwrap_runner::Logger) capability instead.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Filter directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "cliwrap=debug,cliwrap_runner=debug,cliwrap_config=debug,info"
    } else {
        "cliwrap=info,cliwrap_runner=info,cliwrap_config=info,warn"
    }
}

/// Install a global compact subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over [`default_directive`].
///
/// # Errors
///
/// Fails if a global subscriber has already been installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_color())
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
