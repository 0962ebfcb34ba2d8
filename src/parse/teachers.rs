//! Parser for the teacher list CSV export

use crate::parse::csv::parse_csv;
use crate::parse::{ParseIssue, ParserResult};
use crate::records::{RecordId, Teacher};

/// Expected columns: last name, first name, abbreviation, email.
const COLUMNS: usize = 4;

/// Parses the teacher CSV export. The first row is the header.
pub fn parse_teachers(csv: &str) -> ParserResult<Teacher> {
    let mut result = ParserResult::new();
    let rows = parse_csv(csv);

    if rows.is_empty() {
        result
            .issues
            .push(ParseIssue::fatal("teacher export is empty"));
        return result;
    }

    for (line, row) in rows.iter().enumerate().skip(1) {
        if row.len() != COLUMNS {
            result.issues.push(ParseIssue::error(format!(
                "teacher row {}: expected {} columns, got {}",
                line + 1,
                COLUMNS,
                row.len()
            )));
            continue;
        }

        let abbreviation = row[2].trim();
        if abbreviation.is_empty() {
            result.issues.push(ParseIssue::warn(format!(
                "teacher row {}: empty abbreviation",
                line + 1
            )));
            continue;
        }

        result.records.push(Teacher {
            id: RecordId::next(),
            last_name: row[0].trim().to_string(),
            first_name: row[1].trim().to_string(),
            abbreviation: abbreviation.to_string(),
            email: row[3].trim().to_string(),
            subject_ids: Vec::new(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Name;Vorname;Kürzel;Email\n";

    #[test]
    fn test_parse_teachers() {
        let csv = format!(
            "{}Huber;Anna;HUB;anna.huber@school.example\nStucki;Beat;STU;beat.stucki@school.example\n",
            HEADER
        );
        let result = parse_teachers(&csv);

        assert_eq!(result.records.len(), 2);
        assert!(result.issues.is_empty());
        assert_eq!(result.records[0].abbreviation, "HUB");
        assert_eq!(result.records[1].last_name, "Stucki");
        assert_ne!(result.records[0].id, result.records[1].id);
    }

    #[test]
    fn test_wrong_column_count_skips_row() {
        let csv = format!("{}Huber;Anna;HUB\nStucki;Beat;STU;beat@school.example\n", HEADER);
        let result = parse_teachers(&csv);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.records[0].abbreviation, "STU");
    }

    #[test]
    fn test_empty_abbreviation_skips_row() {
        let csv = format!("{}Huber;Anna; ;anna@school.example\n", HEADER);
        let result = parse_teachers(&csv);

        assert!(result.records.is_empty());
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_empty_export_is_fatal() {
        let result = parse_teachers("");
        assert!(result.records.is_empty());
        assert!(result.has_fatal());
    }
}
