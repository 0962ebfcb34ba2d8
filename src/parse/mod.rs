//! Parsers for the portal's report pages and CSV exports
//!
//! Each parser is a pure function from raw document text to structured
//! records plus the list of recoverable issues it hit on the way. Shape
//! violations (missing tables, wrong cell counts) and data failures
//! (unparseable dates or numbers) abort at most the current record; parsing
//! always continues with the next row.

mod absences;
mod csv;
mod grades;
mod markup;
mod students;
mod teachers;
mod transactions;

pub use absences::{parse_absences, AbsencesPage};
pub use csv::parse_csv;
pub use grades::{parse_grades, GradesPage};
pub use markup::{attr_or_empty, inner_text};
pub use students::parse_students;
pub use teachers::parse_teachers;
pub use transactions::parse_transactions;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How bad a parse or link issue is.
///
/// Info is log-only; warn and error abort the current record; fatal aborts
/// the current record too, and in the session's case ends the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        write!(f, "{}", label)
    }
}

/// One recoverable problem encountered while parsing or linking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub severity: Severity,
    pub message: String,
}

impl ParseIssue {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Records produced by one parse pass together with every issue hit.
///
/// A partial result is still a result; the caller inspects the issue list
/// to decide whether it is usable.
#[derive(Debug, Clone, Default)]
pub struct ParserResult<T> {
    pub records: Vec<T>,
    pub issues: Vec<ParseIssue>,
}

impl<T> ParserResult<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn has_fatal(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == Severity::Fatal)
    }
}

/// Date format used throughout the portal.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Parses a portal date (`dd.mm.yyyy`).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Parses a portal decimal, tolerating Swiss apostrophe thousands
/// separators (`1'234.50`).
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace('\'', "");
    cleaned.parse().ok()
}
