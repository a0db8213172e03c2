//! Scheduler protocol tests against a scripted in-memory surface.
//!
//! These cover the pending-set protocol end to end: every submitted capture
//! is collected exactly once, failures stay isolated to their task, and
//! draining interleaves with otherwise idle time.

use profilesnap::capture::{CaptureOptions, CaptureResult};
use profilesnap::pipeline::{CapturePipeline, PendingSet, SectionOutcome, SectionTask};
use profilesnap::snapshot_writer::SnapshotWriter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tempfile::TempDir;

mod common;
use common::{CaptureScript, MockProvider, MockState, MockSurface, capture_ok, fast_config};

fn new_state() -> Arc<Mutex<MockState>> {
    Arc::new(Mutex::new(MockState {
        page_html: "<html>raw dom</html>".to_string(),
        ..MockState::default()
    }))
}

fn pipeline(
    state: &Arc<Mutex<MockState>>,
    dir: &TempDir,
) -> CapturePipeline<MockProvider> {
    let config = fast_config(dir.path());
    CapturePipeline::new(
        MockProvider::new(Arc::clone(state)),
        SnapshotWriter::new(dir.path()),
        &config,
        CaptureOptions::new(),
    )
}

fn direct_tasks(keys: &[&str]) -> Vec<SectionTask> {
    keys.iter()
        .map(|k| SectionTask::direct(*k, format!("https://example.com/{k}"), 0))
        .collect()
}

#[tokio::test]
async fn every_section_is_drained_exactly_once() {
    let state = new_state();
    {
        let mut st = state.lock().unwrap();
        st.script("a", CaptureScript::AfterPolls(0, capture_ok("<html>A</html>")));
        st.script("b", CaptureScript::AfterPolls(1, capture_ok("<html>B</html>")));
        st.script("c", CaptureScript::AfterPolls(0, capture_ok("<html>C</html>")));
    }
    let dir = TempDir::new().unwrap();

    let summary = pipeline(&state, &dir)
        .run(direct_tasks(&["a", "b", "c"]))
        .await;

    assert_eq!(summary.sections.len(), 3);
    assert_eq!(summary.artifacts_written(), 3);
    assert_eq!(summary.navigation_failures(), 0);
    for key in ["a", "b", "c"] {
        let record = summary.section(key).unwrap();
        assert!(record.outcome.is_clean(), "section {key} should be clean");
        let path = record.outcome.artifact_path().unwrap();
        assert!(path.is_file());
    }

    // The default tab (id 0, first task) must never be closed by the
    // pipeline; per-task tabs must be.
    let events = state.lock().unwrap().events.clone();
    assert!(!events.contains(&"close:0".to_string()));
    assert!(events.contains(&"close:1".to_string()));
    assert!(events.contains(&"close:2".to_string()));
}

#[tokio::test]
async fn navigation_failure_skips_the_task_without_an_artifact() {
    let state = new_state();
    {
        let mut st = state.lock().unwrap();
        st.failing_urls.push("https://example.com/b".to_string());
        st.script("a", CaptureScript::AfterPolls(0, capture_ok("<html>A</html>")));
        st.script("c", CaptureScript::AfterPolls(0, capture_ok("<html>C</html>")));
    }
    let dir = TempDir::new().unwrap();

    let summary = pipeline(&state, &dir)
        .run(direct_tasks(&["a", "b", "c"]))
        .await;

    assert_eq!(summary.artifacts_written(), 2);
    assert_eq!(summary.navigation_failures(), 1);
    assert!(matches!(
        summary.section("b").unwrap().outcome,
        SectionOutcome::NavigationFailed { .. }
    ));
    // The failed task's tab is released and never submits a capture.
    let events = state.lock().unwrap().events.clone();
    assert!(events.contains(&"close:1".to_string()));
    assert!(!events.contains(&"submit:b".to_string()));
}

#[tokio::test]
async fn early_capture_is_on_disk_before_later_submission() {
    // With no scrolling anywhere, a capture that resolves immediately is
    // drained during the maintenance sweep after its own submission, so its
    // artifact exists before the third task submits.
    let state = new_state();
    let dir = TempDir::new().unwrap();
    let a_existed = Arc::new(AtomicBool::new(false));
    {
        let mut st = state.lock().unwrap();
        st.script("a", CaptureScript::AfterPolls(0, capture_ok("<html>A</html>")));
        st.script("b", CaptureScript::AfterPolls(0, capture_ok("<html>B</html>")));
        st.script("c", CaptureScript::AfterPolls(0, capture_ok("<html>C</html>")));

        let flag = Arc::clone(&a_existed);
        let a_path = dir.path().join("a.html");
        st.on_submit = Some(Arc::new(move |key: &str| {
            if key == "c" {
                flag.store(a_path.is_file(), Ordering::SeqCst);
            }
        }));
    }

    let summary = pipeline(&state, &dir)
        .run(direct_tasks(&["a", "b", "c"]))
        .await;

    assert_eq!(summary.artifacts_written(), 3);
    assert!(
        a_existed.load(Ordering::SeqCst),
        "task a's artifact should exist before task c is submitted"
    );
}

#[tokio::test]
async fn pending_results_drain_during_scroll_pauses() {
    // Task a's capture is not ready at a's own maintenance sweep, but
    // resolves while task b is scrolling; the scroll ticks must collect it
    // before b's capture is even submitted.
    let state = new_state();
    let dir = TempDir::new().unwrap();
    let a_existed = Arc::new(AtomicBool::new(false));
    {
        let mut st = state.lock().unwrap();
        st.script("a", CaptureScript::AfterPolls(2, capture_ok("<html>A</html>")));
        st.script("b", CaptureScript::AfterPolls(0, capture_ok("<html>B</html>")));

        let flag = Arc::clone(&a_existed);
        let a_path = dir.path().join("a.html");
        st.on_submit = Some(Arc::new(move |key: &str| {
            if key == "b" {
                flag.store(a_path.is_file(), Ordering::SeqCst);
            }
        }));
    }

    let tasks = vec![
        SectionTask::direct("a", "https://example.com/a", 0),
        SectionTask::direct("b", "https://example.com/b", 4),
    ];
    let summary = pipeline(&state, &dir).run(tasks).await;

    assert_eq!(summary.artifacts_written(), 2);
    assert!(
        a_existed.load(Ordering::SeqCst),
        "task a's artifact should be drained during task b's scroll pauses"
    );
}

#[tokio::test]
async fn capture_timeout_is_isolated_and_leaves_a_fallback() {
    // Task a's engine never responds while task b resolves instantly; the
    // run completes with b written cleanly and a abandoned with a raw-DOM
    // fallback.
    let state = new_state();
    {
        let mut st = state.lock().unwrap();
        st.script("a", CaptureScript::Never);
        st.script("b", CaptureScript::AfterPolls(0, capture_ok("<html>B</html>")));
    }
    let dir = TempDir::new().unwrap();

    let summary = pipeline(&state, &dir)
        .run(direct_tasks(&["a", "b"]))
        .await;

    let b = summary.section("b").unwrap();
    assert!(b.outcome.is_clean());
    let b_body = std::fs::read_to_string(b.outcome.artifact_path().unwrap()).unwrap();
    assert_eq!(b_body, "<html>B</html>");

    let a = summary.section("a").unwrap();
    match &a.outcome {
        SectionOutcome::TimedOut { fallback_path } => {
            let path = fallback_path.as_ref().expect("fallback should be written");
            let body = std::fs::read_to_string(path).unwrap();
            assert_eq!(body, "<html>raw dom</html>");
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
    // Both tabs are settled: nothing is left pending and a's tab is closed.
    let events = state.lock().unwrap().events.clone();
    assert!(events.contains(&"close:1".to_string()));
}

#[tokio::test]
async fn engine_error_is_terminal_and_still_written() {
    // The engine answers with an error payload; the drain writes the
    // (empty) artifact and carries the error string verbatim.
    let state = new_state();
    {
        let mut st = state.lock().unwrap();
        st.script(
            "a",
            CaptureScript::AfterPolls(
                0,
                CaptureResult {
                    error: Some("not ready".to_string()),
                    ..CaptureResult::default()
                },
            ),
        );
    }
    let dir = TempDir::new().unwrap();

    let summary = pipeline(&state, &dir).run(direct_tasks(&["a"])).await;

    match &summary.section("a").unwrap().outcome {
        SectionOutcome::EngineError { path, error } => {
            assert_eq!(error, "not ready");
            let body = std::fs::read_to_string(path).unwrap();
            assert!(body.is_empty());
        }
        other => panic!("expected EngineError, got {other:?}"),
    }
    assert_eq!(summary.artifacts_written(), 1);
}

#[tokio::test]
async fn results_may_drain_out_of_order() {
    // A later task's capture may be collected before an earlier one's; the
    // slow first capture is only gathered by the exhaustive drain.
    let state = new_state();
    {
        let mut st = state.lock().unwrap();
        st.script("a", CaptureScript::AfterPolls(10, capture_ok("<html>A</html>")));
        st.script("b", CaptureScript::AfterPolls(0, capture_ok("<html>B</html>")));
        st.script("c", CaptureScript::AfterPolls(0, capture_ok("<html>C</html>")));
    }
    let dir = TempDir::new().unwrap();

    let summary = pipeline(&state, &dir)
        .run(direct_tasks(&["a", "b", "c"]))
        .await;

    assert_eq!(summary.artifacts_written(), 3);
    let order: Vec<&str> = summary.sections.iter().map(|r| r.key.as_str()).collect();
    let pos = |k: &str| order.iter().position(|x| *x == k).unwrap();
    assert!(pos("b") < pos("a"), "b should drain before a: {order:?}");
    assert!(pos("c") < pos("a"), "c should drain before a: {order:?}");
    assert!(summary.section("a").unwrap().outcome.is_clean());
}

#[tokio::test]
async fn exhaustive_drain_terminates_when_nothing_resolves() {
    let state = new_state();
    {
        let mut st = state.lock().unwrap();
        for key in ["a", "b", "c"] {
            st.script(key, CaptureScript::Never);
        }
    }
    let dir = TempDir::new().unwrap();

    let started = Instant::now();
    let summary = pipeline(&state, &dir)
        .run(direct_tasks(&["a", "b", "c"]))
        .await;
    let elapsed = started.elapsed();

    // Bounded by roughly tasks x capture_timeout (100ms each in the test
    // config), far below this ceiling.
    assert!(elapsed.as_secs() < 10, "drain took {elapsed:?}");
    assert_eq!(summary.sections.len(), 3);
    for record in &summary.sections {
        assert!(matches!(record.outcome, SectionOutcome::TimedOut { .. }));
    }
}

#[tokio::test]
async fn pending_set_rejects_duplicate_keys() {
    let state = new_state();
    let dir = TempDir::new().unwrap();
    let writer = SnapshotWriter::new(dir.path());
    let mut pending: PendingSet<MockSurface> = PendingSet::new(writer);

    let surface = MockSurface {
        id: 7,
        state: Arc::clone(&state),
    };
    assert!(pending.register("k".to_string(), surface.clone(), false));
    assert!(!pending.register("k".to_string(), surface, false));
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn opportunistic_drain_is_idempotent() {
    // Once a key has been drained, later sweeps must not poll it again or
    // rewrite its artifact, even though the scripted engine would happily
    // keep answering.
    let state = new_state();
    state
        .lock()
        .unwrap()
        .script("k", CaptureScript::AfterPolls(0, capture_ok("<html>K</html>")));
    let dir = TempDir::new().unwrap();
    let mut pending: PendingSet<MockSurface> = PendingSet::new(SnapshotWriter::new(dir.path()));

    let surface = MockSurface {
        id: 1,
        state: Arc::clone(&state),
    };
    assert!(pending.register("k".to_string(), surface, false));

    assert_eq!(pending.drain_ready().await, 1);
    assert!(pending.is_empty());
    let polls_after_drain = *state.lock().unwrap().poll_counts.get("k").unwrap();

    assert_eq!(pending.drain_ready().await, 0);
    assert_eq!(
        *state.lock().unwrap().poll_counts.get("k").unwrap(),
        polls_after_drain,
        "a drained key must not be polled again"
    );

    let records = pending.take_records();
    assert_eq!(records.len(), 1);
    let body = std::fs::read_to_string(records[0].outcome.artifact_path().unwrap()).unwrap();
    assert_eq!(body, "<html>K</html>");
}
