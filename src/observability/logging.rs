use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// Falls back to console-only output when `log_dir` cannot be created. The returned
/// guard flushes the file writer when dropped; keep it alive for the whole run.
pub fn init_logging(log_dir: &str) -> Option<WorkerGuard> {
    // Determine filter: respect RUST_LOG if set; otherwise default to info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("listing_scraper=info,warn"));

    // JSON file layer with daily rotation, skipped when the directory is unusable
    let (file_layer, guard) = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "listing_scraper.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(non_blocking_writer)), Some(guard))
        }
        Err(_) => (None, None),
    };

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("A global subscriber is already installed, keeping it");
    }
    if guard.is_none() {
        tracing::warn!("Could not create log directory '{}', logging to console only", log_dir);
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_created_and_guard_returned() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let guard = init_logging(log_dir.to_str().unwrap());
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_unusable_log_dir_falls_back_to_console() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let guard = init_logging(blocker.join("logs").to_str().unwrap());
        assert!(guard.is_none());
    }
}
