//! Progress reporting handles handed to tools that declare they want one.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::kernel::task_log::log_task;

/// Sink for progress updates from a long-running tool.
pub trait ProgressReporter: Send + Sync {
    /// Begin a unit of work with `total` steps.
    fn start(&self, label: &str, total: u64);
    /// Mark one step done.
    fn advance(&self);
    /// Print a line without disturbing the bar.
    fn note(&self, message: &str);
    /// Tear down the bar.
    fn finish(&self);
}

/// Used when no handle was supplied: no bar, notes are printed as plain
/// lines and recorded in the task log.
pub struct PlainProgress;

impl ProgressReporter for PlainProgress {
    fn start(&self, label: &str, total: u64) {
        tracing::debug!(label, total, "progress start");
    }

    fn advance(&self) {}

    fn note(&self, message: &str) {
        println!("{message}");
        log_task(message);
    }

    fn finish(&self) {}
}

/// Terminal progress bar backed by indicatif.
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self { bar: Mutex::new(None) }
    }

    fn current(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalProgress {
    fn start(&self, label: &str, total: u64) {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(label.to_string());
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(previous) = guard.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self) {
        if let Some(bar) = self.current() {
            bar.inc(1);
        }
    }

    fn note(&self, message: &str) {
        match self.current() {
            Some(bar) => bar.println(message),
            None => println!("{message}"),
        }
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}
