//! stderr logging for the cc-queue binary.
//!
//! Hook invocations must not stall on a slow stderr, so events go through a
//! non-blocking writer. Keep the returned guard alive until exit to flush.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn init(debug: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), debug);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .try_init();
    guard
}

/// `RUST_LOG` directives win when valid; otherwise `debug` with the debug flag
/// and `warn` without.
fn build_filter(directives: Option<&str>, debug: bool) -> EnvFilter {
    directives
        .filter(|d| !d.is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(if debug { "debug" } else { "warn" }))
}
