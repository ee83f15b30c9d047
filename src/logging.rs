use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

// Terminal output belongs to the UI, so stderr logging stays at warn unless RUST_LOG says otherwise
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole run or buffered file logs are lost.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    match log_dir {
        Some(dir) => {
            // Rolling daily log
            let file_appender = rolling::daily(dir, "timeclock.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::fmt()
                .with_writer(non_blocking)
                .with_env_filter(env_filter("info"))
                .with_ansi(false)
                .with_target(false)
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter("warn"))
                .with_target(false)
                .init();

            None
        }
    }
}
