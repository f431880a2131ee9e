//! Spinners for running filter jobs.

use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

use bonetexture_core::features::FilterKind;

const TICK: Duration = Duration::from_millis(120);

/// One spinner per running filter family, drawn on stderr.
pub struct JobSpinners {
    multi: MultiProgress,
    bars: Mutex<HashMap<FilterKind, ProgressBar>>,
}

impl JobSpinners {
    /// Spinners drawn on stderr, or hidden when `visible` is false.
    #[must_use]
    pub fn new(visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:>5} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Show a spinner for `kind`.
    pub fn start(&self, kind: FilterKind, message: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::style());
        bar.set_prefix(kind.label());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK);
        if let Some(previous) = self.bars.lock().insert(kind, bar) {
            previous.finish_and_clear();
        }
    }

    /// Stop the spinner for `kind`, leaving `message` in its place.
    pub fn finish(&self, kind: FilterKind, message: &str) {
        if let Some(bar) = self.bars.lock().remove(&kind) {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Stop every remaining spinner, e.g. when waiting timed out.
    pub fn abandon_all(&self, message: &str) {
        for (_, bar) in self.bars.lock().drain() {
            bar.abandon_with_message(message.to_string());
        }
    }

    /// Number of spinners still running.
    #[must_use]
    pub fn active(&self) -> usize {
        self.bars.lock().len()
    }

    /// Print a line above the spinners without tearing them.
    pub fn println(&self, line: &str) {
        if self.multi.is_hidden() {
            println!("{line}");
        } else {
            let _ = self.multi.println(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_finish() {
        let spinners = JobSpinners::new(false);
        spinners.start(FilterKind::Cooccurrence, "running");
        spinners.start(FilterKind::Morphometry, "running");
        assert_eq!(spinners.active(), 2);
        spinners.finish(FilterKind::Cooccurrence, "done");
        assert_eq!(spinners.active(), 1);
        spinners.finish(FilterKind::Cooccurrence, "done");
        assert_eq!(spinners.active(), 1);
    }

    #[test]
    fn restart_replaces_spinner() {
        let spinners = JobSpinners::new(false);
        spinners.start(FilterKind::RunLength, "first");
        spinners.start(FilterKind::RunLength, "second");
        assert_eq!(spinners.active(), 1);
    }

    #[test]
    fn abandon_all_clears() {
        let spinners = JobSpinners::new(false);
        for kind in FilterKind::ALL {
            spinners.start(kind, "running");
        }
        spinners.abandon_all("timed out");
        assert_eq!(spinners.active(), 0);
    }
}
