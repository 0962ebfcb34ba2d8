//! Keep-alive heartbeat behavior, driven with paused tokio time.

mod common;

use common::{logged_in_session, RecordingTransport};
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(25 * 60);

#[tokio::test(start_paused = true)]
async fn heartbeat_fires_after_the_interval() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    assert!(transport.calls_matching("xajax_js.php").is_empty());

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    tokio::task::yield_now().await;

    let keepalives = transport.calls_matching("xajax_js.php");
    assert!(!keepalives.is_empty(), "no keep-alive was sent");
    assert!(session.logged_in());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_repeats_while_logged_in() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    tokio::time::sleep(3 * INTERVAL + Duration::from_secs(3)).await;
    tokio::task::yield_now().await;

    assert!(transport.calls_matching("xajax_js.php").len() >= 3);
    assert!(session.logged_in());
}

#[tokio::test(start_paused = true)]
async fn failed_keepalive_ends_the_session() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    transport.fail_requests_matching("xajax_js.php");

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    tokio::task::yield_now().await;

    assert!(!session.logged_in());

    // The loop ended with the failure; no further keep-alives go out.
    let sent = transport.calls_matching("xajax_js.php").len();
    tokio::time::sleep(2 * INTERVAL).await;
    tokio::task::yield_now().await;
    assert_eq!(transport.calls_matching("xajax_js.php").len(), sent);
}

#[tokio::test(start_paused = true)]
async fn logout_stops_the_heartbeat() {
    let transport = RecordingTransport::new(Duration::ZERO);
    let session = logged_in_session(Arc::clone(&transport)).await;

    session.logout().await.unwrap();

    tokio::time::sleep(2 * INTERVAL).await;
    tokio::task::yield_now().await;
    assert!(transport.calls_matching("xajax_js.php").is_empty());
}
