use super::Result;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, Layer};

/// Logging sink of one data split
///
/// DEBUG and above go to the split log file, ERROR and above to stderr.
/// Events are only captured inside [RunLogger::in_scope]; no global
/// subscriber is installed.
pub struct RunLogger {
    dispatch: Dispatch,
}

impl RunLogger {
    /// Opens (appending to) the log file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(LevelFilter::DEBUG),
            )
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_filter(LevelFilter::ERROR),
            );
        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }
    /// Runs `f` with this logger receiving every `tracing` event
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_debug_and_above_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log").join("cylinder_bc.log");
        let logger = RunLogger::create(&path).unwrap();
        logger.in_scope(|| {
            tracing::trace!("trace message");
            tracing::debug!("debug message");
            tracing::info!(case = 3, "info message");
        });
        let log = fs::read_to_string(&path).unwrap();
        assert!(!log.contains("trace message"));
        assert!(log.contains("debug message"));
        assert!(log.contains("info message"));
        assert!(log.contains("case=3"));
    }

    #[test]
    fn appends_across_loggers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cylinder_geo.log");
        RunLogger::create(&path)
            .unwrap()
            .in_scope(|| tracing::warn!("first run"));
        RunLogger::create(&path)
            .unwrap()
            .in_scope(|| tracing::warn!("second run"));
        let log = fs::read_to_string(&path).unwrap();
        assert!(log.contains("first run"));
        assert!(log.contains("second run"));
    }

    #[test]
    fn events_outside_scope_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cylinder_bc.log");
        let logger = RunLogger::create(&path).unwrap();
        tracing::info!("not captured");
        logger.in_scope(|| tracing::info!("captured"));
        let log = fs::read_to_string(&path).unwrap();
        assert!(!log.contains("not captured"));
        assert!(log.contains("captured"));
    }
}
