//! Parser for the grade overview page
//!
//! The page carries one `table.kurs` per course: a `th.titel` header cell
//! with `Course Name (ABBREVIATION)`, one `tr.note` row per grade with
//! exactly four cells (date, topic, mark, weight), and an optional
//! `tr.schnitt` row whose last cell is the weighted average.

use crate::parse::markup::inner_text;
use crate::parse::{parse_date, parse_decimal, ParseIssue};
use crate::records::{Grade, RecordId, Subject};
use scraper::{ElementRef, Html, Selector};

/// Subjects and grades extracted from one grade overview page.
#[derive(Debug, Clone, Default)]
pub struct GradesPage {
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
    pub issues: Vec<ParseIssue>,
}

/// Parses the grade overview page.
pub fn parse_grades(html: &str) -> GradesPage {
    let mut page = GradesPage::default();
    let document = Html::parse_document(html);

    let Ok(table_selector) = Selector::parse("table.kurs") else {
        page.issues.push(ParseIssue::fatal("invalid course selector"));
        return page;
    };

    let mut seen_tables = false;
    for table in document.select(&table_selector) {
        seen_tables = true;
        parse_course_table(&table, &mut page);
    }

    if !seen_tables {
        page.issues
            .push(ParseIssue::fatal("grade page carries no course tables"));
    }
    page
}

fn parse_course_table(table: &ElementRef, page: &mut GradesPage) {
    let Ok(title_selector) = Selector::parse("th.titel") else {
        return;
    };
    let Ok(note_selector) = Selector::parse("tr.note") else {
        return;
    };
    let Ok(average_selector) = Selector::parse("tr.schnitt td") else {
        return;
    };
    let Ok(cell_selector) = Selector::parse("td") else {
        return;
    };

    let title = match table.select(&title_selector).next() {
        Some(cell) => inner_text(&cell),
        None => {
            page.issues
                .push(ParseIssue::error("course table without a title cell"));
            return;
        }
    };
    let Some((name, abbreviation)) = split_course_title(&title) else {
        page.issues.push(ParseIssue::error(format!(
            "course title {:?} has no abbreviation",
            title
        )));
        return;
    };

    let average = table
        .select(&average_selector)
        .last()
        .and_then(|cell| parse_decimal(&inner_text(&cell)));

    let subject = Subject {
        id: RecordId::next(),
        abbreviation: abbreviation.to_string(),
        name: name.to_string(),
        average,
        teacher_id: None,
        grade_ids: Vec::new(),
        absence_ids: Vec::new(),
    };

    for row in table.select(&note_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() != 4 {
            page.issues.push(ParseIssue::error(format!(
                "course {}: grade row with {} cells, expected 4",
                subject.abbreviation,
                cells.len()
            )));
            continue;
        }

        let date_text = inner_text(&cells[0]);
        let Some(date) = parse_date(&date_text) else {
            page.issues.push(ParseIssue::error(format!(
                "course {}: unparseable grade date {:?}",
                subject.abbreviation, date_text
            )));
            continue;
        };
        let mark_text = inner_text(&cells[2]);
        let Some(mark) = parse_decimal(&mark_text) else {
            page.issues.push(ParseIssue::error(format!(
                "course {}: unparseable mark {:?}",
                subject.abbreviation, mark_text
            )));
            continue;
        };
        let weight_text = inner_text(&cells[3]);
        let Some(weight) = parse_decimal(&weight_text) else {
            page.issues.push(ParseIssue::error(format!(
                "course {}: unparseable weight {:?}",
                subject.abbreviation, weight_text
            )));
            continue;
        };

        page.grades.push(Grade {
            id: RecordId::next(),
            subject_abbreviation: subject.abbreviation.clone(),
            date,
            topic: inner_text(&cells[1]),
            mark,
            weight,
            subject_id: None,
        });
    }

    page.subjects.push(subject);
}

/// Splits `Course Name (ABBR)` into name and abbreviation.
fn split_course_title(title: &str) -> Option<(&str, &str)> {
    let title = title.trim();
    let open = title.rfind('(')?;
    let close = title.rfind(')')?;
    if close <= open + 1 {
        return None;
    }
    let name = title[..open].trim();
    let abbreviation = title[open + 1..close].trim();
    if name.is_empty() || abbreviation.is_empty() {
        return None;
    }
    Some((name, abbreviation))
}
