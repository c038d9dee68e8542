mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{inputs, InstrumentedRunner};
use plotbatch_core::config::BatchConfig;
use plotbatch_core::error::ExecutorError;
use plotbatch_core::executor::{BatchDispatcher, OutcomeStatus};
use pretty_assertions::assert_eq;

fn dispatcher(runner: Arc<InstrumentedRunner>) -> BatchDispatcher {
    let cfg = BatchConfig {
        progress_bar: false,
        ..BatchConfig::default()
    };
    BatchDispatcher::from_config(&cfg).with_runner(runner)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn returns_one_outcome_per_input_in_order() {
    let labels: Vec<String> = (0..9).map(|i| format!("out_MIMOSA_{i}")).collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

    for limit in [1, 2, 4, 16] {
        let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(5)));
        let outcomes = dispatcher(runner.clone())
            .run_batch(inputs(&label_refs), limit)
            .await
            .unwrap();

        let got: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(got, label_refs, "limit {limit}");
        let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
        // Barrier: every task had finished by the time run_batch returned.
        assert_eq!(runner.finished(), 9);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_exceeds_concurrency_limit() {
    let labels: Vec<String> = (0..12).map(|i| format!("f{i}")).collect();
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

    for limit in [1, 3, 5] {
        let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(20)));
        dispatcher(runner.clone())
            .run_batch(inputs(&label_refs), limit)
            .await
            .unwrap();

        assert!(runner.peak() <= limit, "peak {} > {}", runner.peak(), limit);
        assert!(runner.peak() >= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn limit_of_one_runs_strictly_sequentially() {
    let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(10)));
    dispatcher(runner.clone())
        .run_batch(inputs(&["a", "b", "c", "d"]), 1)
        .await
        .unwrap();

    let intervals = runner.intervals();
    assert_eq!(intervals.len(), 4);
    for pair in intervals.windows(2) {
        let (_, _, prev_end) = pair[0];
        let (_, next_start, _) = pair[1];
        assert!(next_start >= prev_end, "task intervals overlap");
    }
    // FIFO admission with a single worker.
    let order: Vec<usize> = intervals.iter().map(|(i, _, _)| *i).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn failing_task_does_not_affect_siblings() {
    let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(5)).failing_on("b"));
    let outcomes = dispatcher(runner.clone())
        .run_batch(inputs(&["a", "b", "c"]), 2)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 2);
    assert_eq!(
        outcomes[1].status,
        OutcomeStatus::Failed { exit_code: Some(1) }
    );
    assert_eq!(runner.finished(), 3);
}

#[tokio::test]
async fn empty_input_returns_immediately() {
    let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(5)));
    let outcomes = dispatcher(runner.clone())
        .run_batch(Vec::new(), 4)
        .await
        .unwrap();

    assert!(outcomes.is_empty());
    assert_eq!(runner.peak(), 0);
}

#[tokio::test]
async fn zero_concurrency_is_rejected() {
    let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(5)));
    let err = dispatcher(runner.clone())
        .run_batch(inputs(&["a"]), 0)
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::InvalidConcurrency(0)));
    assert_eq!(runner.finished(), 0);
}

#[tokio::test]
async fn dispatch_over_empty_pattern_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = BatchConfig {
        pattern: format!("{}/out_MIMOSA_*root", dir.path().display()),
        progress_bar: false,
        ..BatchConfig::default()
    };
    let runner = Arc::new(InstrumentedRunner::new(Duration::from_millis(5)));

    let report = BatchDispatcher::from_config(&cfg)
        .with_runner(runner.clone())
        .dispatch()
        .await
        .unwrap();

    assert_eq!(report.total(), 0);
    assert!(report.is_success());
    assert_eq!(runner.peak(), 0);
}

#[tokio::test]
async fn dispatch_discovers_sorted_files_and_summarises() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["out_MIMOSA_2.root", "out_MIMOSA_0.root", "out_MIMOSA_1.root"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    let cfg = BatchConfig {
        pattern: format!("{}/out_MIMOSA_*root", dir.path().display()),
        jobs: 2,
        progress_bar: false,
        ..BatchConfig::default()
    };
    let runner = Arc::new(
        InstrumentedRunner::new(Duration::from_millis(5)).failing_on("out_MIMOSA_1"),
    );

    let dispatcher = BatchDispatcher::from_config(&cfg).with_runner(runner.clone());
    let planned: Vec<String> = dispatcher
        .plan()
        .unwrap()
        .iter()
        .map(|t| t.label().to_string())
        .collect();
    assert_eq!(planned, vec!["out_MIMOSA_0", "out_MIMOSA_1", "out_MIMOSA_2"]);

    let report = dispatcher.dispatch().await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    let failed: Vec<&str> = report.failures().map(|o| o.label.as_str()).collect();
    assert_eq!(failed, vec!["out_MIMOSA_1"]);
}
