//! Parser for the student list CSV export

use crate::parse::csv::parse_csv;
use crate::parse::{ParseIssue, ParserResult};
use crate::records::{Gender, RecordId, Student};

/// Expected columns: last name, first name, gender, degree, bilingual,
/// class, street, zip, town, phone, email.
const COLUMNS: usize = 11;

/// Parses the student CSV export. The first row is the header.
pub fn parse_students(csv: &str) -> ParserResult<Student> {
    let mut result = ParserResult::new();
    let rows = parse_csv(csv);

    if rows.is_empty() {
        result
            .issues
            .push(ParseIssue::fatal("student export is empty"));
        return result;
    }

    for (line, row) in rows.iter().enumerate().skip(1) {
        if row.len() != COLUMNS {
            result.issues.push(ParseIssue::error(format!(
                "student row {}: expected {} columns, got {}",
                line + 1,
                COLUMNS,
                row.len()
            )));
            continue;
        }

        let Some(gender) = Gender::from_code(&row[2]) else {
            result.issues.push(ParseIssue::error(format!(
                "student row {}: unknown gender code {:?}",
                line + 1,
                row[2]
            )));
            continue;
        };

        let bilingual = match row[4].trim().to_ascii_lowercase().as_str() {
            "ja" => true,
            "nein" | "" => false,
            other => {
                result.issues.push(ParseIssue::error(format!(
                    "student row {}: unknown bilingual flag {:?}",
                    line + 1,
                    other
                )));
                continue;
            }
        };

        result.records.push(Student {
            id: RecordId::next(),
            last_name: row[0].trim().to_string(),
            first_name: row[1].trim().to_string(),
            gender,
            degree: row[3].trim().to_string(),
            bilingual,
            class: row[5].trim().to_string(),
            street: row[6].trim().to_string(),
            zip: row[7].trim().to_string(),
            town: row[8].trim().to_string(),
            phone: row[9].trim().to_string(),
            email: row[10].trim().to_string(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Name;Vorname;Geschlecht;Ausbildung;Bilingual;Klasse;Strasse;PLZ;Ort;Telefon;Email\n";

    fn row(gender: &str, bilingual: &str) -> String {
        format!(
            "Muster;Jana;{};Matura;{};1a;Bahnhofstrasse 7;8000;Zürich;+41 44 000 00 00;jana@example.ch\n",
            gender, bilingual
        )
    }

    #[test]
    fn test_parse_students() {
        let csv = format!("{}{}{}", HEADER, row("w", "ja"), row("m", "nein"));
        let result = parse_students(&csv);

        assert_eq!(result.records.len(), 2);
        assert!(result.issues.is_empty());
        assert_eq!(result.records[0].gender, Gender::Female);
        assert!(result.records[0].bilingual);
        assert!(!result.records[1].bilingual);
        assert_eq!(result.records[0].class, "1a");
    }

    #[test]
    fn test_unknown_gender_skips_row() {
        let csv = format!("{}{}", HEADER, row("x", "ja"));
        let result = parse_students(&csv);

        assert!(result.records.is_empty());
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_unknown_bilingual_flag_skips_row() {
        let csv = format!("{}{}", HEADER, row("m", "maybe"));
        let result = parse_students(&csv);

        assert!(result.records.is_empty());
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_quoted_address_field() {
        let csv = format!(
            "{}Muster;Jana;w;Matura;ja;1a;\"Im Feld 3; Haus B\";8000;Zürich;;jana@example.ch\n",
            HEADER
        );
        let result = parse_students(&csv);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].street, "Im Feld 3; Haus B");
    }
}
