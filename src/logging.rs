use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "where-to-fly.log";

/// Creates the log directory if it doesn't exist. Runs before the subscriber
/// is installed, so failures go to stderr.
pub fn prepare_directory(directory: &Path) -> bool {
    match std::fs::create_dir_all(directory) {
        Ok(()) => true,
        Err(e) => {
            eprintln!(
                "Could not create log directory {}: {}. File logging will not work.",
                directory.display(),
                e
            );
            false
        }
    }
}

pub fn initialize_logging(directory: impl AsRef<Path>) -> WorkerGuard {
    let directory = directory.as_ref();
    prepare_directory(directory);

    let file_appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!(directory = %directory.display(), "Logging initialized successfully.");
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_directory() {
        let base = std::env::temp_dir().join(format!("where-to-fly-logs-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&base);

        let nested = base.join("a/b");
        assert!(prepare_directory(&nested));
        assert!(nested.is_dir());

        // A path below a regular file can't be created
        let file = base.join("plain-file");
        std::fs::write(&file, b"x").unwrap();
        assert!(!prepare_directory(&file.join("logs")));

        let _ = std::fs::remove_dir_all(&base);
    }
}
