use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use plotbatch_core::executor::{BatchTask, InputFile, OutcomeStatus, TaskOutcome, TaskRunner};

/// Fake task body that records how many tasks run at once and when each one
/// started and ended.
pub struct InstrumentedRunner {
    delay: Duration,
    failing: HashSet<String>,
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
    intervals: Mutex<Vec<(usize, Instant, Instant)>>,
}

impl InstrumentedRunner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failing: HashSet::new(),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            intervals: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, label: &str) -> Self {
        self.failing.insert(label.to_string());
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// (index, start, end) for every finished task, sorted by start.
    pub fn intervals(&self) -> Vec<(usize, Instant, Instant)> {
        let mut v = self.intervals.lock().unwrap().clone();
        v.sort_by_key(|(_, start, _)| *start);
        v
    }
}

#[async_trait]
impl TaskRunner for InstrumentedRunner {
    fn name(&self) -> &str {
        "instrumented"
    }

    async fn run(&self, task: &BatchTask) -> TaskOutcome {
        let start = Instant::now();
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        // Vary durations so completion order differs from submission order.
        let jitter = Duration::from_millis((task.index as u64 * 7) % 13);
        tokio::time::sleep(self.delay + jitter).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        let end = Instant::now();
        self.intervals
            .lock()
            .unwrap()
            .push((task.index, start, end));
        self.finished.fetch_add(1, Ordering::SeqCst);

        let status = if self.failing.contains(task.label()) {
            OutcomeStatus::Failed { exit_code: Some(1) }
        } else {
            OutcomeStatus::Succeeded
        };
        TaskOutcome::new(task, status, (end - start).as_millis() as u64)
    }
}

pub fn inputs(labels: &[&str]) -> Vec<InputFile> {
    labels
        .iter()
        .map(|l| InputFile::new(PathBuf::from(format!("output/{l}.root"))))
        .collect()
}
