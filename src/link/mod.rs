//! Cross-references independently parsed record sets
//!
//! A single in-memory pass that resolves natural keys into explicit
//! relationship ids: subject abbreviations carry the teacher abbreviation as
//! their trailing segment, grades reference subjects by abbreviation, and
//! absence reports reference their parent absence by the portal's absence
//! number. Unmatched optional relations are logged and skipped; a report
//! without its parent absence is a fatal integrity failure and is excluded
//! from the result.

use crate::parse::ParseIssue;
use crate::records::{Absence, AbsenceReport, Grade, Subject, Teacher};

/// Record sets entering the link pass.
#[derive(Debug, Clone, Default)]
pub struct LinkInput {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
    pub absences: Vec<Absence>,
    pub reports: Vec<AbsenceReport>,
}

/// Record sets with relationship ids populated, plus every issue hit.
#[derive(Debug, Clone, Default)]
pub struct LinkResult {
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
    pub absences: Vec<Absence>,
    pub reports: Vec<AbsenceReport>,
    pub issues: Vec<ParseIssue>,
}

/// Runs the link pass.
pub fn link(input: LinkInput) -> LinkResult {
    let LinkInput {
        mut teachers,
        mut subjects,
        mut grades,
        mut absences,
        reports,
    } = input;
    let mut issues = Vec::new();

    for subject in &mut subjects {
        let Some(abbreviation) = teacher_abbreviation(&subject.abbreviation) else {
            tracing::debug!("subject {} carries no teacher suffix", subject.abbreviation);
            issues.push(ParseIssue::warn(format!(
                "subject {} carries no teacher abbreviation",
                subject.abbreviation
            )));
            continue;
        };
        match teachers
            .iter_mut()
            .find(|teacher| teacher.abbreviation == abbreviation)
        {
            Some(teacher) => {
                subject.teacher_id = Some(teacher.id);
                teacher.subject_ids.push(subject.id);
            }
            None => {
                tracing::debug!(
                    "no teacher {} for subject {}",
                    abbreviation,
                    subject.abbreviation
                );
                issues.push(ParseIssue::warn(format!(
                    "no teacher {} for subject {}",
                    abbreviation, subject.abbreviation
                )));
            }
        }
    }

    for grade in &mut grades {
        match subjects
            .iter_mut()
            .find(|subject| subject.abbreviation == grade.subject_abbreviation)
        {
            Some(subject) => {
                grade.subject_id = Some(subject.id);
                subject.grade_ids.push(grade.id);
            }
            None => {
                tracing::debug!("no subject for grade in {}", grade.subject_abbreviation);
                issues.push(ParseIssue::warn(format!(
                    "no subject {} for grade on {}",
                    grade.subject_abbreviation, grade.date
                )));
            }
        }
    }

    let mut linked_reports = Vec::with_capacity(reports.len());
    for mut report in reports {
        let Some(absence) = absences
            .iter_mut()
            .find(|absence| absence.number == report.absence_number)
        else {
            tracing::warn!(
                "absence report {} references unknown absence {}",
                report.lesson_date,
                report.absence_number
            );
            issues.push(ParseIssue::fatal(format!(
                "absence report of {} references unknown absence {}",
                report.lesson_date, report.absence_number
            )));
            continue;
        };
        report.absence_id = Some(absence.id);
        absence.report_ids.push(report.id);

        match subjects
            .iter_mut()
            .find(|subject| subject.abbreviation == report.course_abbreviation)
        {
            Some(subject) => {
                if !absence.subject_ids.contains(&subject.id) {
                    absence.subject_ids.push(subject.id);
                }
                if !subject.absence_ids.contains(&absence.id) {
                    subject.absence_ids.push(absence.id);
                }
            }
            None => {
                tracing::debug!(
                    "no subject {} for absence report",
                    report.course_abbreviation
                );
                issues.push(ParseIssue::warn(format!(
                    "no subject {} for absence report of {}",
                    report.course_abbreviation, report.lesson_date
                )));
            }
        }

        linked_reports.push(report);
    }

    LinkResult {
        teachers,
        subjects,
        grades,
        absences,
        reports: linked_reports,
        issues,
    }
}

/// The teacher abbreviation embedded in a subject abbreviation is the
/// segment after the last `-`.
fn teacher_abbreviation(subject_abbreviation: &str) -> Option<&str> {
    subject_abbreviation
        .rsplit_once('-')
        .map(|(_, teacher)| teacher)
        .filter(|teacher| !teacher.is_empty())
}
