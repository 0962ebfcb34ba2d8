//! Concurrency properties of the session core, verified through an
//! instrumented transport that records every call's execution interval.

mod common;

use common::{logged_in_session, overlaps, RecordingTransport};
use schulnetz_watch::fetch::{pages, CSV_EXPORT};
use schulnetz_watch::WatchError;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn state_changing_fetches_never_overlap() {
    let transport = RecordingTransport::new(Duration::from_millis(40));
    let session = Arc::new(logged_in_session(Arc::clone(&transport)).await);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            session.fetch_page(pages::GRADES, true, &[]).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let calls = transport.calls_matching("pageid=21311");
    assert_eq!(calls.len(), 4);
    for (i, a) in calls.iter().enumerate() {
        for b in &calls[i + 1..] {
            assert!(!overlaps(a, b), "state-changing calls overlapped");
        }
    }
}

#[tokio::test]
async fn state_preserving_fetches_overlap_each_other() {
    let transport = RecordingTransport::new(Duration::from_millis(40));
    let session = Arc::new(logged_in_session(Arc::clone(&transport)).await);

    let mut handles = Vec::new();
    for _ in 0..3 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            session
                .fetch_page(pages::TEACHERS, false, &[CSV_EXPORT])
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let calls = transport.calls_matching("pageid=22350");
    assert_eq!(calls.len(), 3);

    // All three reads were admitted together, so every pair overlaps.
    let mut overlapping_pairs = 0;
    for (i, a) in calls.iter().enumerate() {
        for b in &calls[i + 1..] {
            if overlaps(a, b) {
                overlapping_pairs += 1;
            }
        }
    }
    assert!(overlapping_pairs > 0, "reads were serialized");
}

#[tokio::test]
async fn reads_never_overlap_state_changing_fetches() {
    let transport = RecordingTransport::new(Duration::from_millis(25));
    let session = Arc::new(logged_in_session(Arc::clone(&transport)).await);

    let mut handles = Vec::new();
    for n in 0..6 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            if n % 2 == 0 {
                session.fetch_page(pages::GRADES, true, &[]).await
            } else {
                session
                    .fetch_page(pages::TEACHERS, false, &[CSV_EXPORT])
                    .await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let writes = transport.calls_matching("pageid=21311");
    let reads = transport.calls_matching("pageid=22350");
    assert_eq!(writes.len(), 3);
    assert_eq!(reads.len(), 3);

    for write in &writes {
        for read in &reads {
            assert!(
                !overlaps(write, read),
                "a read overlapped a state-changing call"
            );
        }
    }
    for (i, a) in writes.iter().enumerate() {
        for b in &writes[i + 1..] {
            assert!(!overlaps(a, b), "state-changing calls overlapped");
        }
    }
}

#[tokio::test]
async fn logout_cancels_queued_operations() {
    let transport = RecordingTransport::new(Duration::from_millis(80));
    let session = Arc::new(logged_in_session(Arc::clone(&transport)).await);

    // Occupy the exclusive lock with an in-flight fetch.
    let holder = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.fetch_page(pages::GRADES, true, &[]).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Queue three more state-changing fetches behind it.
    let mut queued = Vec::new();
    for _ in 0..3 {
        let session = Arc::clone(&session);
        queued.push(tokio::spawn(async move {
            session.fetch_page(pages::ABSENCES, true, &[]).await
        }));
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Logout must complete and every queued caller must observe failure.
    session.logout().await.unwrap();
    assert!(!session.logged_in());

    for handle in queued {
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(WatchError::LockCancelled)));
    }

    // The in-flight holder had the lock before logout and finished normally.
    holder.await.unwrap().unwrap();

    // None of the cancelled fetches ever reached the network.
    assert!(transport.calls_matching("pageid=21111").is_empty());
}

#[tokio::test]
async fn transport_failure_logs_the_session_out() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    transport.fail_requests_matching("pageid=21111");

    let err = session
        .fetch_page(pages::ABSENCES, true, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::NoResponse { .. }));
    assert!(!session.logged_in());

    // The precondition now fails immediately, without a network call.
    let err = session
        .fetch_page(pages::GRADES, true, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::NotLoggedIn));
    assert!(transport.calls_matching("pageid=21311").is_empty());
}

#[tokio::test]
async fn fetch_requires_login() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = common::session_with(Arc::clone(&transport), Duration::from_secs(25 * 60));

    let err = session
        .fetch_page(pages::GRADES, true, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::NotLoggedIn));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn login_is_idempotent() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    let calls_after_first = transport.calls().len();
    session.login().await.unwrap();
    assert_eq!(transport.calls().len(), calls_after_first);
}

#[tokio::test]
async fn state_changing_fetch_rotates_transaction_id() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    let before = session.transaction_id().unwrap();
    session.fetch_page(pages::GRADES, true, &[]).await.unwrap();
    let after = session.transaction_id().unwrap();

    assert_ne!(before, after);
    assert!(session.visited_pages().contains(&pages::GRADES));
}
