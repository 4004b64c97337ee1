pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod pricing;
pub mod state;
pub mod store;
pub mod svg;

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;

/// Directory holding `laserquote.log`:
///   Linux    ~/.local/share/laserquote
///   macOS    ~/Library/Application Support/laserquote
///   Windows  %LOCALAPPDATA%\laserquote
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_default().join("laserquote")
}

/// Install the global tracing subscriber.
///
/// Log level is controlled by the RUST_LOG environment variable; defaults to
/// INFO when the variable is absent. Logs go to a single file under
/// [`log_dir`], or to stderr when `log_to_stderr` is set. The returned guard
/// must be held until exit so buffered file output is flushed.
pub fn init_tracing(log_to_stderr: bool) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if log_to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    }

    let dir = log_dir();
    // tracing_appender::rolling::never panics if it cannot open the log file.
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!(dir = %dir.display(), "cannot create log directory, logging to stderr: {e}");
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&dir, "laserquote.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Some(guard)
}
