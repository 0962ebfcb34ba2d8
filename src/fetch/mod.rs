//! Snapshot orchestration: which pages to fetch and in what order
//!
//! The report pages are ordinary portal navigation and therefore
//! state-changing; they are fetched in sequence. The two CSV exports are
//! state-preserving reads and run concurrently. Parse and link issues never
//! abort a snapshot; they are collected for the caller to judge.

use crate::link::{link, LinkInput};
use crate::parse::{
    parse_absences, parse_grades, parse_students, parse_teachers, parse_transactions, ParseIssue,
};
use crate::records::{
    Absence, AbsenceReport, Grade, LateAbsence, OpenAbsence, Student, Subject, Teacher,
    Transaction,
};
use crate::session::Session;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Numeric page identifiers of the portal.
pub mod pages {
    use crate::session::PageId;

    /// Grade overview, one course table per subject.
    pub const GRADES: PageId = PageId(21311);

    /// Absence overview with the report/open/late tables.
    pub const ABSENCES: PageId = PageId(21111);

    /// Account transaction listing.
    pub const TRANSACTIONS: PageId = PageId(21411);

    /// Teacher list; combined with [`super::CSV_EXPORT`] it answers with the
    /// CSV export instead of the HTML listing.
    pub const TEACHERS: PageId = PageId(22350);

    /// Student list, CSV export as above.
    pub const STUDENTS: PageId = PageId(22250);
}

/// Query parameter that switches a list page to its CSV export.
pub const CSV_EXPORT: (&str, &str) = ("export", "csv");

/// One fully parsed and cross-linked view of the portal data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub teachers: Vec<Teacher>,
    pub students: Vec<Student>,
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
    pub absences: Vec<Absence>,
    pub absence_reports: Vec<AbsenceReport>,
    pub open_absences: Vec<OpenAbsence>,
    pub late_absences: Vec<LateAbsence>,
    pub transactions: Vec<Transaction>,

    /// Every parse and link issue hit while building this snapshot.
    #[serde(default)]
    pub issues: Vec<ParseIssue>,
}

/// Fetches every report page and CSV export through the given session and
/// builds a cross-linked snapshot.
///
/// The session must be logged in; any transport failure ends the session
/// and propagates.
pub async fn fetch_snapshot(session: &Session) -> Result<Snapshot> {
    tracing::info!("fetching grade overview");
    let grades_html = session.fetch_page(pages::GRADES, true, &[]).await?;
    tracing::info!("fetching absence overview");
    let absences_html = session.fetch_page(pages::ABSENCES, true, &[]).await?;
    tracing::info!("fetching account transactions");
    let transactions_html = session.fetch_page(pages::TRANSACTIONS, true, &[]).await?;

    tracing::info!("fetching teacher and student exports");
    let (teachers_csv, students_csv) = tokio::try_join!(
        session.fetch_page(pages::TEACHERS, false, &[CSV_EXPORT]),
        session.fetch_page(pages::STUDENTS, false, &[CSV_EXPORT]),
    )?;

    let grades_page = parse_grades(&grades_html);
    let absences_page = parse_absences(&absences_html);
    let transactions_result = parse_transactions(&transactions_html);
    let teachers_result = parse_teachers(&teachers_csv);
    let students_result = parse_students(&students_csv);

    let mut issues = Vec::new();
    issues.extend(grades_page.issues);
    issues.extend(absences_page.issues);
    issues.extend(transactions_result.issues);
    issues.extend(teachers_result.issues);
    issues.extend(students_result.issues);

    let linked = link(LinkInput {
        teachers: teachers_result.records,
        subjects: grades_page.subjects,
        grades: grades_page.grades,
        absences: absences_page.absences,
        reports: absences_page.reports,
    });
    issues.extend(linked.issues);

    for issue in &issues {
        tracing::debug!("snapshot issue: {}", issue);
    }
    tracing::info!(
        "snapshot complete: {} subjects, {} grades, {} absences, {} issues",
        linked.subjects.len(),
        linked.grades.len(),
        linked.absences.len(),
        issues.len()
    );

    Ok(Snapshot {
        teachers: linked.teachers,
        students: students_result.records,
        subjects: linked.subjects,
        grades: linked.grades,
        absences: linked.absences,
        absence_reports: linked.reports,
        open_absences: absences_page.open_absences,
        late_absences: absences_page.late_absences,
        transactions: transactions_result.records,
        issues,
    })
}
