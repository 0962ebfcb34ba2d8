//! Change detection between two snapshots of the same record sets
//!
//! Two records are the same entity when their identity-key subset compares
//! equal; a matched pair whose comparison-key subset differs is a
//! modification. Matching is greedy first-match in list order, not optimal
//! bipartite matching: with duplicate identity keys the pairing may be
//! non-minimal. That limitation is deliberate and kept.

use crate::fetch::Snapshot;
use crate::records::{
    Absence, AbsenceReport, Grade, LateAbsence, OpenAbsence, Student, Subject, Teacher,
    Transaction,
};

/// Identity and comparison key subsets of a record type.
pub trait DiffKeys {
    /// Do the two records represent the same real-world entity?
    fn same_entity(&self, other: &Self) -> bool;

    /// Are the watched fields of the two records unchanged?
    fn same_content(&self, other: &Self) -> bool;
}

/// Outcome of diffing one record set.
#[derive(Debug, Clone)]
pub struct RecordDiff<T> {
    pub added: Vec<T>,
    pub modified: Vec<(T, T)>,
    pub removed: Vec<T>,
}

impl<T> RecordDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

// Derived `Default` would demand `T: Default`; the record types have no
// meaningful default value.
impl<T> Default for RecordDiff<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            modified: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// Diffs two snapshots of one record set.
///
/// Records in `before` with no identity match in `after` are removed;
/// unmatched records in `after` are added; ties between duplicate identity
/// keys resolve by list order.
pub fn diff_records<T: DiffKeys + Clone>(before: &[T], after: &[T]) -> RecordDiff<T> {
    let mut matched = vec![false; after.len()];
    let mut diff = RecordDiff {
        added: Vec::new(),
        modified: Vec::new(),
        removed: Vec::new(),
    };

    for old in before {
        let candidate = after
            .iter()
            .enumerate()
            .find(|(index, new)| !matched[*index] && old.same_entity(new));
        match candidate {
            Some((index, new)) => {
                matched[index] = true;
                if !old.same_content(new) {
                    diff.modified.push((old.clone(), new.clone()));
                }
            }
            None => diff.removed.push(old.clone()),
        }
    }

    for (index, new) in after.iter().enumerate() {
        if !matched[index] {
            diff.added.push(new.clone());
        }
    }

    diff
}

/// Per-type diffs between two full snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiff {
    pub teachers: RecordDiff<Teacher>,
    pub students: RecordDiff<Student>,
    pub subjects: RecordDiff<Subject>,
    pub grades: RecordDiff<Grade>,
    pub absences: RecordDiff<Absence>,
    pub absence_reports: RecordDiff<AbsenceReport>,
    pub open_absences: RecordDiff<OpenAbsence>,
    pub late_absences: RecordDiff<LateAbsence>,
    pub transactions: RecordDiff<Transaction>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
            && self.students.is_empty()
            && self.subjects.is_empty()
            && self.grades.is_empty()
            && self.absences.is_empty()
            && self.absence_reports.is_empty()
            && self.open_absences.is_empty()
            && self.late_absences.is_empty()
            && self.transactions.is_empty()
    }
}

/// Diffs every record set of two snapshots.
pub fn diff_snapshots(before: &Snapshot, after: &Snapshot) -> SnapshotDiff {
    SnapshotDiff {
        teachers: diff_records(&before.teachers, &after.teachers),
        students: diff_records(&before.students, &after.students),
        subjects: diff_records(&before.subjects, &after.subjects),
        grades: diff_records(&before.grades, &after.grades),
        absences: diff_records(&before.absences, &after.absences),
        absence_reports: diff_records(&before.absence_reports, &after.absence_reports),
        open_absences: diff_records(&before.open_absences, &after.open_absences),
        late_absences: diff_records(&before.late_absences, &after.late_absences),
        transactions: diff_records(&before.transactions, &after.transactions),
    }
}

impl DiffKeys for Teacher {
    fn same_entity(&self, other: &Self) -> bool {
        self.abbreviation == other.abbreviation
    }

    fn same_content(&self, other: &Self) -> bool {
        self.last_name == other.last_name
            && self.first_name == other.first_name
            && self.email == other.email
    }
}

impl DiffKeys for Student {
    fn same_entity(&self, other: &Self) -> bool {
        self.last_name == other.last_name && self.first_name == other.first_name
    }

    fn same_content(&self, other: &Self) -> bool {
        self.gender == other.gender
            && self.degree == other.degree
            && self.bilingual == other.bilingual
            && self.class == other.class
            && self.street == other.street
            && self.zip == other.zip
            && self.town == other.town
            && self.phone == other.phone
            && self.email == other.email
    }
}

impl DiffKeys for Subject {
    fn same_entity(&self, other: &Self) -> bool {
        self.abbreviation == other.abbreviation
    }

    // The average is derivable from the weighted grades and intentionally
    // not compared.
    fn same_content(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl DiffKeys for Grade {
    fn same_entity(&self, other: &Self) -> bool {
        self.subject_abbreviation == other.subject_abbreviation
            && self.date == other.date
            && self.topic == other.topic
    }

    fn same_content(&self, other: &Self) -> bool {
        self.mark == other.mark && self.weight == other.weight
    }
}

impl DiffKeys for Absence {
    fn same_entity(&self, other: &Self) -> bool {
        self.number == other.number
    }

    fn same_content(&self, other: &Self) -> bool {
        self.start_date == other.start_date
            && self.end_date == other.end_date
            && self.reason == other.reason
            && self.excused == other.excused
            && self.lesson_count == other.lesson_count
    }
}

impl DiffKeys for AbsenceReport {
    fn same_entity(&self, other: &Self) -> bool {
        self.absence_number == other.absence_number
            && self.lesson_date == other.lesson_date
            && self.course_abbreviation == other.course_abbreviation
    }

    fn same_content(&self, other: &Self) -> bool {
        self.comment == other.comment
    }
}

impl DiffKeys for OpenAbsence {
    fn same_entity(&self, other: &Self) -> bool {
        self.lesson_date == other.lesson_date
            && self.course_abbreviation == other.course_abbreviation
    }

    fn same_content(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl DiffKeys for LateAbsence {
    fn same_entity(&self, other: &Self) -> bool {
        self.date == other.date
    }

    fn same_content(&self, other: &Self) -> bool {
        self.reason == other.reason
            && self.duration_minutes == other.duration_minutes
            && self.excused == other.excused
    }
}

impl DiffKeys for Transaction {
    fn same_entity(&self, other: &Self) -> bool {
        self.date == other.date && self.text == other.text
    }

    fn same_content(&self, other: &Self) -> bool {
        self.amount == other.amount
    }
}
