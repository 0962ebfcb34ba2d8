//! schulnetz-watch: a change watcher for schulNetz-style school portals
//!
//! This crate logs into a cookie-based school-administration portal, fetches
//! the grade/absence/transaction report pages plus the teacher and student
//! CSV exports, parses them into structured records, cross-links the records
//! into a consistent in-memory graph, and diffs two snapshots of that graph
//! for change detection.
//!
//! The session layer serializes state-changing navigation against
//! state-preserving reads and keeps the server-side timeout alive with a
//! background heartbeat; see [`session`].

pub mod config;
pub mod diff;
pub mod fetch;
pub mod link;
pub mod parse;
pub mod records;
pub mod session;

use thiserror::Error;

/// Main error type for portal operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session is not logged in")]
    NotLoggedIn,

    #[error("Lock acquisition was cancelled")]
    LockCancelled,

    #[error("No response from {url}: {message}")]
    NoResponse { url: String, message: String },

    #[error("Empty response body from {url}")]
    NoData { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Session verification failed: {0}")]
    Verification(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Snapshot I/O error: {0}")]
    SnapshotIo(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    SnapshotFormat(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for portal operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use diff::{diff_records, diff_snapshots, RecordDiff, SnapshotDiff};
pub use fetch::{fetch_snapshot, Snapshot};
pub use session::{Credentials, PageId, Session};
