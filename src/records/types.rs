use crate::records::RecordId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Student gender as exported by the portal (`m`/`w` codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "m" => Some(Gender::Male),
            "w" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// A teaching staff member from the teacher CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: RecordId,
    pub last_name: String,
    pub first_name: String,
    /// Short code the portal embeds into subject abbreviations.
    pub abbreviation: String,
    pub email: String,
    pub subject_ids: Vec<RecordId>,
}

/// A class member from the student CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    pub last_name: String,
    pub first_name: String,
    pub gender: Gender,
    pub degree: String,
    pub bilingual: bool,
    pub class: String,
    pub street: String,
    pub zip: String,
    pub town: String,
    pub phone: String,
    pub email: String,
}

/// A course from the grade overview page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RecordId,
    /// Portal course code, e.g. `MA-1a-HUB`; the trailing segment is the
    /// teacher abbreviation.
    pub abbreviation: String,
    pub name: String,
    /// Weighted average as shown by the portal; derivable from the grades,
    /// so excluded from snapshot comparison.
    pub average: Option<f64>,
    pub teacher_id: Option<RecordId>,
    pub grade_ids: Vec<RecordId>,
    pub absence_ids: Vec<RecordId>,
}

/// A single graded assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub id: RecordId,
    pub subject_abbreviation: String,
    pub date: NaiveDate,
    pub topic: String,
    pub mark: f64,
    pub weight: f64,
    pub subject_id: Option<RecordId>,
}

/// A recorded absence period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    pub id: RecordId,
    /// The portal's own absence number; natural key for report linking.
    pub number: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub excused: bool,
    pub lesson_count: u32,
    pub subject_ids: Vec<RecordId>,
    pub report_ids: Vec<RecordId>,
}

/// A per-lesson report belonging to an absence. The parent absence link is
/// mandatory; a report that cannot be matched is a data-integrity failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceReport {
    pub id: RecordId,
    /// Portal absence number of the parent absence.
    pub absence_number: u32,
    pub lesson_date: NaiveDate,
    pub course_abbreviation: String,
    pub comment: String,
    pub absence_id: Option<RecordId>,
}

/// An absence the student still has to excuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAbsence {
    pub id: RecordId,
    pub lesson_date: NaiveDate,
    pub course_abbreviation: String,
    pub deadline: NaiveDate,
}

/// A recorded tardiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateAbsence {
    pub id: RecordId,
    pub date: NaiveDate,
    pub reason: String,
    pub duration_minutes: u32,
    pub excused: bool,
}

/// A booking on the student's portal account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub date: NaiveDate,
    pub text: String,
    pub amount: f64,
}
