pub mod commands;
pub mod engine;
pub mod error;
pub mod gcode;
pub mod models;
pub mod toolpath;

pub use engine::GcodeEngine;
pub use error::AppError;

use tracing_appender::non_blocking::WorkerGuard;

/// Installs the global tracing subscriber.
///
/// Logs are written to a single, never-rotated file in the OS data dir:
///   Linux    ~/.local/share/gcodemorph/gcodemorph.log
///   macOS    ~/Library/Application Support/gcodemorph/gcodemorph.log
///   Windows  %LOCALAPPDATA%\gcodemorph\gcodemorph.log
///
/// Log level is controlled by the RUST_LOG environment variable; defaults to
/// INFO when the variable is absent. The returned guard flushes the writer
/// when dropped, so the caller keeps it alive until exit.
pub fn init_tracing() -> WorkerGuard {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_default()
        .join("gcodemorph");

    // The appender cannot open a file in a missing directory.
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::never(&log_dir, "gcodemorph.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gcodemorph starting");
    guard
}
