//! Session layer: login lifecycle, state coordination, cookies, transport
//!
//! # Components
//!
//! - [`Session`]: login/logout lifecycle, page fetching, keep-alive heartbeat
//! - [`StateCoordinator`]: serializes state-changing navigation against
//!   state-preserving reads
//! - [`CookieJar`]: the hand-scanned `Set-Cookie` store
//! - [`Transport`]: the HTTP seam, with [`HttpTransport`] as the reqwest
//!   implementation

mod coordinator;
mod cookies;
mod session;
mod transport;

pub use coordinator::{ExclusiveGuard, StableGuard, StateCoordinator};
pub use cookies::CookieJar;
pub use session::{Credentials, PageId, Session};
pub use transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};
