//! Integration tests for the loop driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fanout_scheduler::{Failure, LoopDone, LoopDriver, Site, Violation, ViolationReporter};
use tokio::sync::oneshot;

#[tokio::test]
async fn synchronous_rounds_resolve_after_the_call_returns() {
    let returned = Arc::new(AtomicBool::new(false));
    let observed = Arc::clone(&returned);
    let (tx, rx) = oneshot::channel();

    let mut count = 0u32;
    LoopDriver::whilst(
        |last: Option<&u32>| last.copied().unwrap_or(0) < 5,
        move |done: LoopDone<u32, ()>| {
            count += 1;
            done.ok(count);
        },
    )
    .spawn(move |outcome| {
        let _ = tx.send((observed.load(Ordering::SeqCst), outcome));
    });
    returned.store(true, Ordering::SeqCst);

    let (was_returned, outcome) = rx.await.unwrap();
    assert!(was_returned);
    assert_eq!(outcome, Ok(Some(5)));
}

#[tokio::test(start_paused = true)]
async fn delayed_rounds_with_tuple_results() {
    let mut round = 0u64;
    let result: Result<Option<(u64, String)>, Failure<String>> = LoopDriver::do_whilst(
        move |done: LoopDone<(u64, String), String>| {
            round += 1;
            let n = round;
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5 * n)).await;
                done.ok((n, format!("round {n}")));
            });
        },
        |last: Option<&(u64, String)>| last.map_or(false, |(n, _)| *n < 3),
    )
    .run()
    .await;

    assert_eq!(result, Ok(Some((3, "round 3".to_string()))));
}

#[tokio::test(start_paused = true)]
async fn late_second_settle_is_reported_after_the_loop_moved_on() {
    let (reporter, mut violations) = ViolationReporter::channel();
    let result: Result<Option<u8>, Failure<()>> = LoopDriver::whilst(
        |last: Option<&u8>| last.is_none(),
        |done: LoopDone<u8, ()>| {
            let again = done.clone();
            done.ok(1);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                again.err(());
            });
        },
    )
    .report_to(reporter)
    .run()
    .await;

    assert_eq!(result, Ok(Some(1)));
    assert_eq!(
        violations.recv().await,
        Some(Violation::AlreadyCalled(Site::Round(0)))
    );
}
