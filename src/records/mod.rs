//! Record types for the parsed portal data
//!
//! Every record carries a process-local [`RecordId`] assigned at parse time;
//! the portal's own identifiers (where they exist, like absence numbers) are
//! ordinary data fields. Relationship id lists start empty and are populated
//! only by the linker.

mod ids;
mod types;

pub use ids::RecordId;
pub use types::{
    Absence, AbsenceReport, Gender, Grade, LateAbsence, OpenAbsence, Student, Subject, Teacher,
    Transaction,
};
