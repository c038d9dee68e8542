use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Visual progress for a batch: one overall bar plus a spinner per running
/// task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Mutex<HashMap<usize, ProgressBar>>,
    enabled: bool,
}

impl ProgressMonitor {
    /// `enabled` is false for jsonl output and non-interactive runs.
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        Self::with_target(MultiProgress::new(), total_tasks, enabled)
    }

    /// Draw into `multi`, which the caller may share with a log writer so
    /// that log lines suspend the bars instead of tearing them.
    pub fn with_target(multi: MultiProgress, total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi,
                overall: ProgressBar::hidden(),
                task_bars: Mutex::new(HashMap::new()),
                enabled: false,
            };
        }

        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    pub fn start_task(&self, index: usize, label: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bars) = self.task_bars.lock() {
            bars.insert(index, bar);
        }
    }

    pub fn complete_task(&self, index: usize, success: bool) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.lock().ok().and_then(|mut b| b.remove(&index)) {
            bar.finish_and_clear();
        }
        self.overall.inc(1);
        if !success {
            self.overall.set_message("some files failed");
        }
    }

    /// Print a line above the bars (plain `println!` when disabled).
    pub fn println(&self, line: &str) {
        if self.enabled {
            let _ = self.multi.println(line);
        } else {
            println!("{line}");
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if success {
            "all files plotted"
        } else {
            "finished with failures"
        };
        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Ok(mut bars) = self.task_bars.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
            }
        }
    }
}
