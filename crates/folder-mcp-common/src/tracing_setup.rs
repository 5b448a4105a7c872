//! Dual JSON logging setup shared by the daemon binary and its integration
//! tests: a daily-rotating file appender plus non-blocking stderr.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Guards that must be kept alive for the lifetime of the process. Dropping
/// them flushes and closes the non-blocking writers, so callers must hold
/// onto the returned value (typically in `main`'s local scope) until exit.
pub struct TracingGuards {
    _file_guard: WorkerGuard,
    _stderr_guard: WorkerGuard,
}

/// Initialize the global tracing subscriber with JSON-formatted dual output.
///
/// `log_dir` receives a daily-rotating `file_name` log. Stderr always
/// receives the same stream, so running interactively still shows output.
///
/// The env filter defaults to `info`, widened to `debug` when
/// `FOLDER_MCP_DEVELOPMENT_ENABLED` is set to a truthy value, unless
/// `RUST_LOG` is already set (which always wins).
///
/// # Errors
///
/// Returns an error if `log_dir` cannot be created.
pub fn init_tracing(log_dir: &Path, file_name: &str) -> std::io::Result<TracingGuards> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, file_name);
    let (file_writer, file_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(file_appender);

    let (stderr_writer, stderr_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(std::io::stderr());

    let multi_writer = file_writer.and(stderr_writer);

    tracing_subscriber::fmt()
        .json()
        .with_writer(multi_writer)
        .with_env_filter(default_env_filter())
        .init();

    Ok(TracingGuards {
        _file_guard: file_guard,
        _stderr_guard: stderr_guard,
    })
}

fn default_env_filter() -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some() {
        return EnvFilter::from_default_env();
    }

    let development = std::env::var("FOLDER_MCP_DEVELOPMENT_ENABLED")
        .is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"));

    EnvFilter::new(if development { "debug" } else { "info" })
}

#[cfg(test)]
mod tests {
    use super::default_env_filter;

    #[test]
    fn builds_a_filter_without_panicking() {
        let _filter = default_env_filter();
    }
}
