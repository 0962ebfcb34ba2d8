//! Portal session lifecycle and page fetching
//!
//! One [`Session`] owns one logical login to the portal: the cookie jar, the
//! server-assigned session and transaction identifiers, the state-lock
//! coordination, and the keep-alive heartbeat. All mutation of session state
//! happens either inside a held lock/stable slot or immediately after a
//! request completes within such a section.
//!
//! Any request or verification failure inside `login`, `fetch_page` or the
//! heartbeat tears the whole session down; callers treat "no longer logged
//! in" as the universal recovery signal.

use crate::session::coordinator::StateCoordinator;
use crate::session::cookies::CookieJar;
use crate::session::transport::{Transport, TransportRequest, TransportResponse};
use crate::{Result, WatchError};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Numeric identifier of a portal page, as used in the `pageid` query
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(pub u32);

impl PageId {
    /// The page the portal lands on right after login.
    pub const LANDING: PageId = PageId(1);

    /// Requesting this page ends the server-side session.
    pub const LOGOUT: PageId = PageId(9999);
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Portal account credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything the server associates with the login; reset as a whole on
/// logout or failure.
#[derive(Default)]
struct SessionState {
    active: bool,
    session_id: Option<String>,
    trans_id: Option<String>,
    last_page: Option<PageId>,
    visited: HashSet<PageId>,
    cookies: CookieJar,
}

impl SessionState {
    fn logged_in(&self) -> bool {
        self.active
            && self.session_id.is_some()
            && self.trans_id.is_some()
            && self.last_page.is_some()
    }
}

/// A single logical session to the portal.
pub struct Session {
    base_url: Url,
    credentials: Credentials,
    heartbeat_interval: Duration,
    transport: Arc<dyn Transport>,
    coordinator: StateCoordinator,
    state: Arc<Mutex<SessionState>>,
    heartbeat: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Session {
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        heartbeat_interval: Duration,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url,
            credentials,
            heartbeat_interval,
            transport,
            coordinator: StateCoordinator::new(),
            state: Arc::new(Mutex::new(SessionState::default())),
            heartbeat: Arc::new(Mutex::new(None)),
        }
    }

    /// True only while the internal flag is set and the session id,
    /// transaction id and last visited page are all present.
    pub fn logged_in(&self) -> bool {
        self.state.lock().unwrap().logged_in()
    }

    /// Current server-assigned transaction id, if logged in.
    pub fn transaction_id(&self) -> Option<String> {
        self.state.lock().unwrap().trans_id.clone()
    }

    /// Copy of the current cookie jar.
    pub fn cookies(&self) -> CookieJar {
        self.state.lock().unwrap().cookies.clone()
    }

    /// Pages fetched so far in this login.
    pub fn visited_pages(&self) -> HashSet<PageId> {
        self.state.lock().unwrap().visited.clone()
    }

    /// Logs into the portal. A no-op when already logged in.
    ///
    /// Takes the state lock with priority so login never waits behind queued
    /// navigation. On any failure the session state is fully reset and the
    /// error propagated.
    pub async fn login(&self) -> Result<()> {
        if self.logged_in() {
            return Ok(());
        }
        let _guard = self.coordinator.acquire_priority().await?;
        if self.logged_in() {
            return Ok(());
        }

        match self.perform_login().await {
            Ok(()) => {
                self.start_heartbeat();
                tracing::info!("logged in to {}", self.base_url);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("login failed: {}", e);
                self.teardown();
                Err(e)
            }
        }
    }

    async fn perform_login(&self) -> Result<()> {
        let login_url = self.base_url.join("loginto.php")?;

        tracing::debug!("requesting login page");
        let response = self
            .transport
            .request(TransportRequest::get(login_url.as_str()))
            .await?;
        self.absorb_cookies(&response);

        let hash = extract_login_hash(&response.content)?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("login", &self.credentials.username)
            .append_pair("passwort", &self.credentials.password)
            .append_pair("loginhash", &hash)
            .finish();
        let post = TransportRequest::post(login_url.as_str(), body)
            .with_header("Cookie", self.cookie_header())
            .ignoring_status();

        tracing::debug!("posting credentials");
        let response = self.transport.request(post).await?;
        self.absorb_cookies(&response);

        let (session_id, trans_id) = extract_session_ids(&response.content, &self.base_url)
            .ok_or_else(|| {
                WatchError::LoginFailed("no navigation link with session identifiers".to_string())
            })?;

        let mut state = self.state.lock().unwrap();
        state.active = true;
        state.session_id = Some(session_id);
        state.trans_id = Some(trans_id);
        state.last_page = Some(PageId::LANDING);
        state.visited.insert(PageId::LANDING);
        Ok(())
    }

    /// Logs out of the portal.
    ///
    /// Forcefully acquires the state lock, cancelling every queued waiter,
    /// best-effort requests the logout page, and unconditionally resets the
    /// session state. Cleanup happens even when the network request errors.
    pub async fn logout(&self) -> Result<()> {
        if !self.logged_in() {
            self.teardown();
            return Ok(());
        }
        let _guard = self.coordinator.force_acquire().await?;

        if let Some(request) = self.page_request(PageId::LOGOUT, &[]) {
            if let Err(e) = self.transport.request(request.ignoring_status()).await {
                tracing::debug!("logout request failed (ignored): {}", e);
            }
        }

        self.teardown();
        tracing::info!("logged out of {}", self.base_url);
        Ok(())
    }

    /// Fetches a portal page.
    ///
    /// `changes_state` selects the exclusive lock (the server may rotate the
    /// transaction id on such navigation) versus a stable-state read slot.
    /// Any transport failure tears the session down; for state-changing
    /// fetches a page without fresh identifiers is a fatal verification
    /// failure.
    pub async fn fetch_page(
        &self,
        page: PageId,
        changes_state: bool,
        extra_params: &[(&str, &str)],
    ) -> Result<String> {
        if !self.logged_in() {
            return Err(WatchError::NotLoggedIn);
        }

        if changes_state {
            let _guard = self.coordinator.acquire().await?;
            self.fetch_page_locked(page, true, extra_params).await
        } else {
            let _guard = self.coordinator.retain_stable().await?;
            self.fetch_page_locked(page, false, extra_params).await
        }
    }

    async fn fetch_page_locked(
        &self,
        page: PageId,
        changes_state: bool,
        extra_params: &[(&str, &str)],
    ) -> Result<String> {
        let request = self.page_request(page, extra_params).ok_or(WatchError::NotLoggedIn)?;
        let url = request.url.clone();

        tracing::debug!("fetching page {} ({})", page, url);
        let response = match self.transport.request(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("request for page {} failed, ending session: {}", page, e);
                self.teardown();
                return Err(e);
            }
        };
        self.absorb_cookies(&response);

        if changes_state {
            match extract_session_ids(&response.content, &self.base_url) {
                Some((session_id, trans_id)) => {
                    let mut state = self.state.lock().unwrap();
                    if state.active {
                        state.session_id = Some(session_id);
                        state.trans_id = Some(trans_id);
                    }
                }
                None => {
                    tracing::warn!("page {} carried no session identifiers", page);
                    self.teardown();
                    return Err(WatchError::Verification(format!(
                        "page {} carried no refreshed session identifiers",
                        page
                    )));
                }
            }
        }

        let mut state = self.state.lock().unwrap();
        if state.active {
            state.last_page = Some(page);
            state.visited.insert(page);
        }
        drop(state);

        Ok(response.content)
    }

    /// Builds the `index.php` request for a page with the current
    /// identifiers and cookies. `None` when the session fields are gone.
    fn page_request(&self, page: PageId, extra_params: &[(&str, &str)]) -> Option<TransportRequest> {
        let state = self.state.lock().unwrap();
        let session_id = state.session_id.clone()?;
        let trans_id = state.trans_id.clone()?;
        let cookie = state.cookies.header_value();
        drop(state);

        let mut url = self.base_url.join("index.php").ok()?;
        url.query_pairs_mut()
            .append_pair("pageid", &page.0.to_string())
            .append_pair("id", &session_id)
            .append_pair("transid", &trans_id);
        for (name, value) in extra_params {
            url.query_pairs_mut().append_pair(name, value);
        }

        Some(TransportRequest::get(url.as_str()).with_header("Cookie", cookie))
    }

    fn cookie_header(&self) -> String {
        self.state.lock().unwrap().cookies.header_value()
    }

    fn absorb_cookies(&self, response: &TransportResponse) {
        if let Some(header) = response.set_cookie() {
            let mut state = self.state.lock().unwrap();
            state.cookies.update_from_header(&header);
        }
    }

    /// Starts the keep-alive loop; an already running loop is replaced.
    fn start_heartbeat(&self) {
        let mut slot = self.heartbeat.lock().unwrap();
        if let Some(handle) = slot.take() {
            handle.abort();
        }

        let interval = self.heartbeat_interval;
        let state = Arc::clone(&self.state);
        let transport = Arc::clone(&self.transport);
        let heartbeat = Arc::clone(&self.heartbeat);
        let keepalive_url = match self.base_url.join("xajax_js.php") {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("cannot build keep-alive URL: {}", e);
                return;
            }
        };

        *slot = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let request = {
                    let state = state.lock().unwrap();
                    if !state.logged_in() {
                        break;
                    }
                    let mut url = keepalive_url.clone();
                    url.query_pairs_mut()
                        .append_pair("id", state.session_id.as_deref().unwrap_or_default())
                        .append_pair("transid", state.trans_id.as_deref().unwrap_or_default());
                    TransportRequest::post(url.as_str(), "xajax=reset_timeout")
                        .with_header("Cookie", state.cookies.header_value())
                };

                match transport.request(request).await {
                    Ok(response) => {
                        if let Some(header) = response.set_cookie() {
                            state.lock().unwrap().cookies.update_from_header(&header);
                        }
                        tracing::debug!("session timeout reset");
                    }
                    Err(e) => {
                        tracing::warn!("keep-alive failed, ending session: {}", e);
                        *state.lock().unwrap() = SessionState::default();
                        heartbeat.lock().unwrap().take();
                        break;
                    }
                }
            }
        }));
    }

    fn stop_heartbeat(&self) {
        if let Some(handle) = self.heartbeat.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Full logout-state reset: stops the heartbeat and clears every session
    /// field. Safe to call from any failure path; never touches the state
    /// lock.
    fn teardown(&self) {
        self.stop_heartbeat();
        *self.state.lock().unwrap() = SessionState::default();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_heartbeat();
    }
}

/// Pulls the one-time hidden login hash out of the login form.
fn extract_login_hash(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("input[name=loginhash]")
        .map_err(|_| WatchError::LoginFailed("invalid login hash selector".to_string()))?;

    let hash = document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .unwrap_or_default();

    if hash.is_empty() {
        return Err(WatchError::LoginFailed(
            "login page carried no login hash".to_string(),
        ));
    }
    Ok(hash.to_string())
}

/// Finds the first navigation link carrying `id` and `transid` query
/// parameters and returns both values.
fn extract_session_ids(html: &str, base_url: &Url) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;

    for link in document.select(&selector) {
        let href = link.value().attr("href").unwrap_or_default();
        if !href.contains("transid=") {
            continue;
        }
        let Ok(resolved) = base_url.join(href) else {
            continue;
        };
        let mut session_id = None;
        let mut trans_id = None;
        for (name, value) in resolved.query_pairs() {
            match name.as_ref() {
                "id" => session_id = Some(value.into_owned()),
                "transid" => trans_id = Some(value.into_owned()),
                _ => {}
            }
        }
        if let (Some(session_id), Some(trans_id)) = (session_id, trans_id) {
            return Some((session_id, trans_id));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_login_hash() {
        let html = r#"<html><body><form>
            <input type="hidden" name="loginhash" value="abc123" />
            <input type="text" name="login" />
        </form></body></html>"#;
        assert_eq!(extract_login_hash(html).unwrap(), "abc123");
    }

    #[test]
    fn test_extract_login_hash_missing() {
        let html = "<html><body><form></form></body></html>";
        assert!(matches!(
            extract_login_hash(html),
            Err(WatchError::LoginFailed(_))
        ));
    }

    #[test]
    fn test_extract_session_ids() {
        let base = Url::parse("https://portal.example.ch/").unwrap();
        let html = r#"<html><body>
            <a href="index.php?pageid=21311">Grades</a>
            <a href="index.php?pageid=1&id=s-77&transid=t-42">Start</a>
        </body></html>"#;
        let (session_id, trans_id) = extract_session_ids(html, &base).unwrap();
        assert_eq!(session_id, "s-77");
        assert_eq!(trans_id, "t-42");
    }

    #[test]
    fn test_extract_session_ids_requires_both() {
        let base = Url::parse("https://portal.example.ch/").unwrap();
        let html = r#"<a href="index.php?transid=t-42">incomplete</a>"#;
        assert!(extract_session_ids(html, &base).is_none());
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(PageId(21311).to_string(), "21311");
    }
}
