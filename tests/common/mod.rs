//! Shared test transport: scripted portal behavior plus call-interval
//! recording, so tests can assert which network calls overlapped.

#![allow(dead_code)]

use async_trait::async_trait;
use schulnetz_watch::session::{
    Credentials, Method, Session, Transport, TransportRequest, TransportResponse,
};
use schulnetz_watch::{Result, WatchError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// One transport call with its execution interval.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub url: String,
    pub method: Method,
    pub started: Instant,
    pub finished: Instant,
}

/// True when the two call intervals intersect.
pub fn overlaps(a: &CallRecord, b: &CallRecord) -> bool {
    a.started < b.finished && b.started < a.finished
}

/// In-memory portal double. Every request takes `delay` to answer, answers
/// are generated from the URL, and requests whose URL contains a configured
/// needle fail with a transport error.
pub struct RecordingTransport {
    delay: Duration,
    fail_needle: Mutex<Option<String>>,
    calls: Mutex<Vec<CallRecord>>,
    trans_counter: AtomicU64,
}

impl RecordingTransport {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fail_needle: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            trans_counter: AtomicU64::new(0),
        })
    }

    /// Makes every future request whose URL contains `needle` fail.
    pub fn fail_requests_matching(&self, needle: &str) {
        *self.fail_needle.lock().unwrap() = Some(needle.to_string());
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<CallRecord> {
        self.calls()
            .into_iter()
            .filter(|call| call.url.contains(needle))
            .collect()
    }

    fn respond(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let trans = self.trans_counter.fetch_add(1, Ordering::Relaxed);
        let nav_link = format!(
            r#"<a href="index.php?pageid=1&id=sess-1&transid=trans-{}">Start</a>"#,
            trans
        );

        if request.url.contains("loginto.php") {
            return Ok(match request.method {
                Method::Get => TransportResponse {
                    status: 200,
                    content: r#"<html><body><form>
                        <input type="hidden" name="loginhash" value="h4sh" />
                        </form></body></html>"#
                        .to_string(),
                    headers: vec![(
                        "set-cookie".to_string(),
                        "PHPSESSID=s1; Path=/".to_string(),
                    )],
                },
                Method::Post => TransportResponse {
                    status: 200,
                    content: format!("<html><body>{}</body></html>", nav_link),
                    headers: vec![("set-cookie".to_string(), "sn_role=student".to_string())],
                },
            });
        }

        if request.url.contains("xajax_js.php") {
            return Ok(TransportResponse {
                status: 200,
                content: "ok".to_string(),
                headers: Vec::new(),
            });
        }

        // Any index.php page: answer with a fresh navigation link so
        // state-changing fetches can refresh their identifiers.
        Ok(TransportResponse {
            status: 200,
            content: format!("<html><body>{}<p>page body</p></body></html>", nav_link),
            headers: Vec::new(),
        })
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse> {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = {
            let needle = self.fail_needle.lock().unwrap();
            match needle.as_deref() {
                Some(needle) if request.url.contains(needle) => Err(WatchError::NoResponse {
                    url: request.url.clone(),
                    message: "connection reset".to_string(),
                }),
                _ => self.respond(&request),
            }
        };

        self.calls.lock().unwrap().push(CallRecord {
            url: request.url.clone(),
            method: request.method,
            started,
            finished: Instant::now(),
        });

        result
    }
}

pub fn test_credentials() -> Credentials {
    Credentials {
        username: "jana".to_string(),
        password: "secret".to_string(),
    }
}

pub fn session_with(transport: Arc<RecordingTransport>, heartbeat: Duration) -> Session {
    Session::new(
        Url::parse("https://portal.example.ch/").unwrap(),
        test_credentials(),
        heartbeat,
        transport,
    )
}

/// A session that has already completed the login flow against the
/// scripted transport.
pub async fn logged_in_session(transport: Arc<RecordingTransport>) -> Session {
    let session = session_with(transport, Duration::from_secs(25 * 60));
    session.login().await.expect("login against test transport");
    session
}
