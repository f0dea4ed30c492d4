//! The task log: one timestamped line per task action, appended to
//! `logging.file` by the file layer installed in `main`.

use std::fmt::Display;

/// Tracing target routed to the task log file.
pub const TASK_LOG_TARGET: &str = "factotum::task";

/// Record a completed task action.
pub fn log_task(message: impl Display) {
    tracing::info!(target: TASK_LOG_TARGET, "{message}");
}

/// Record a failed task action.
pub fn log_task_failure(message: impl Display) {
    tracing::error!(target: TASK_LOG_TARGET, "{message}");
}

/// Captures task-log lines emitted on the current thread.
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::filter::{LevelFilter, Targets};
    use tracing_subscriber::{fmt, prelude::*};

    use super::TASK_LOG_TARGET;

    #[derive(Clone, Default)]
    pub(crate) struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Install a subscriber shaped like the task-log file layer until the guard drops.
    pub(crate) fn task_log() -> (DefaultGuard, Buffer) {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_target(false)
                .with_filter(Targets::new().with_target(TASK_LOG_TARGET, LevelFilter::INFO)),
        );
        (tracing::subscriber::set_default(subscriber), buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_task_target_is_captured() {
        let (_guard, log) = capture::task_log();
        log_task("Moved a.txt -> txt/a.txt");
        log_task_failure("Task 'x' failed: boom");
        tracing::info!("diagnostic noise");

        let text = log.contents();
        assert!(text.contains("INFO Moved a.txt -> txt/a.txt"));
        assert!(text.contains("ERROR Task 'x' failed: boom"));
        assert!(!text.contains("diagnostic noise"));
    }
}
