//! Parser for the absence overview page
//!
//! One page carries four tables: `#absenzen` (absence periods, row id
//! `absenz_<number>`, five cells), `#absenzmeldungen` (per-lesson reports,
//! four cells, first cell references the parent absence number),
//! `#offene_absenzen` (three cells) and `#verspaetungen` (four cells).
//! Header rows use `th` cells and scan as empty rows.

use crate::parse::markup::{attr_or_empty, inner_text};
use crate::parse::{parse_date, ParseIssue};
use crate::records::{Absence, AbsenceReport, LateAbsence, OpenAbsence, RecordId};
use scraper::{Html, Selector};

/// Everything extracted from one absence overview page.
#[derive(Debug, Clone, Default)]
pub struct AbsencesPage {
    pub absences: Vec<Absence>,
    pub reports: Vec<AbsenceReport>,
    pub open_absences: Vec<OpenAbsence>,
    pub late_absences: Vec<LateAbsence>,
    pub issues: Vec<ParseIssue>,
}

/// Parses the absence overview page. A missing table is a fatal issue for
/// that table only; the remaining tables are still parsed.
pub fn parse_absences(html: &str) -> AbsencesPage {
    let mut page = AbsencesPage::default();
    let document = Html::parse_document(html);

    match table_rows(&document, "table#absenzen tr") {
        Some(rows) => {
            for (line, cells, row) in rows {
                parse_absence_row(line, &cells, &row, &mut page);
            }
        }
        None => page
            .issues
            .push(ParseIssue::fatal("absence table is missing")),
    }

    match table_rows(&document, "table#absenzmeldungen tr") {
        Some(rows) => {
            for (line, cells, _) in rows {
                parse_report_row(line, &cells, &mut page);
            }
        }
        None => page
            .issues
            .push(ParseIssue::fatal("absence report table is missing")),
    }

    match table_rows(&document, "table#offene_absenzen tr") {
        Some(rows) => {
            for (line, cells, _) in rows {
                parse_open_row(line, &cells, &mut page);
            }
        }
        None => page
            .issues
            .push(ParseIssue::fatal("open absence table is missing")),
    }

    match table_rows(&document, "table#verspaetungen tr") {
        Some(rows) => {
            for (line, cells, _) in rows {
                parse_late_row(line, &cells, &mut page);
            }
        }
        None => page
            .issues
            .push(ParseIssue::fatal("late absence table is missing")),
    }

    page
}

type Row = (usize, Vec<String>, String);

/// Collects the data rows of one table as (line, cell texts, row id).
/// Returns `None` when the table itself is absent; header rows (`th` only)
/// are dropped.
fn table_rows(document: &Html, row_css: &str) -> Option<Vec<Row>> {
    let row_selector = Selector::parse(row_css).ok()?;
    let cell_selector = Selector::parse("td").ok()?;

    let mut any_row = false;
    let mut rows = Vec::new();
    for (line, row) in document.select(&row_selector).enumerate() {
        any_row = true;
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| inner_text(&cell))
            .collect();
        if cells.is_empty() {
            continue;
        }
        rows.push((line + 1, cells, attr_or_empty(&row, "id").to_string()));
    }

    if any_row {
        Some(rows)
    } else {
        None
    }
}

fn parse_absence_row(line: usize, cells: &[String], row_id: &str, page: &mut AbsencesPage) {
    if cells.len() != 5 {
        page.issues.push(ParseIssue::error(format!(
            "absence row {}: expected 5 cells, got {}",
            line,
            cells.len()
        )));
        return;
    }
    let Some(number) = row_id
        .strip_prefix("absenz_")
        .and_then(|n| n.parse::<u32>().ok())
    else {
        page.issues.push(ParseIssue::error(format!(
            "absence row {}: missing or malformed row id {:?}",
            line, row_id
        )));
        return;
    };
    let (Some(start_date), Some(end_date)) = (parse_date(&cells[0]), parse_date(&cells[1]))
    else {
        page.issues.push(ParseIssue::error(format!(
            "absence {}: unparseable date range {:?} – {:?}",
            number, cells[0], cells[1]
        )));
        return;
    };
    let Some(excused) = parse_flag(&cells[3]) else {
        page.issues.push(ParseIssue::error(format!(
            "absence {}: unknown excused flag {:?}",
            number, cells[3]
        )));
        return;
    };
    let Ok(lesson_count) = cells[4].trim().parse::<u32>() else {
        page.issues.push(ParseIssue::error(format!(
            "absence {}: unparseable lesson count {:?}",
            number, cells[4]
        )));
        return;
    };

    page.absences.push(Absence {
        id: RecordId::next(),
        number,
        start_date,
        end_date,
        reason: cells[2].clone(),
        excused,
        lesson_count,
        subject_ids: Vec::new(),
        report_ids: Vec::new(),
    });
}

fn parse_report_row(line: usize, cells: &[String], page: &mut AbsencesPage) {
    if cells.len() != 4 {
        page.issues.push(ParseIssue::error(format!(
            "absence report row {}: expected 4 cells, got {}",
            line,
            cells.len()
        )));
        return;
    }
    let Ok(absence_number) = cells[0].trim().parse::<u32>() else {
        page.issues.push(ParseIssue::error(format!(
            "absence report row {}: unparseable absence number {:?}",
            line, cells[0]
        )));
        return;
    };
    let Some(lesson_date) = parse_date(&cells[1]) else {
        page.issues.push(ParseIssue::error(format!(
            "absence report row {}: unparseable date {:?}",
            line, cells[1]
        )));
        return;
    };

    page.reports.push(AbsenceReport {
        id: RecordId::next(),
        absence_number,
        lesson_date,
        course_abbreviation: cells[2].trim().to_string(),
        comment: cells[3].clone(),
        absence_id: None,
    });
}

fn parse_open_row(line: usize, cells: &[String], page: &mut AbsencesPage) {
    if cells.len() != 3 {
        page.issues.push(ParseIssue::error(format!(
            "open absence row {}: expected 3 cells, got {}",
            line,
            cells.len()
        )));
        return;
    }
    let (Some(lesson_date), Some(deadline)) = (parse_date(&cells[0]), parse_date(&cells[2]))
    else {
        page.issues.push(ParseIssue::error(format!(
            "open absence row {}: unparseable dates",
            line
        )));
        return;
    };

    page.open_absences.push(OpenAbsence {
        id: RecordId::next(),
        lesson_date,
        course_abbreviation: cells[1].trim().to_string(),
        deadline,
    });
}

fn parse_late_row(line: usize, cells: &[String], page: &mut AbsencesPage) {
    if cells.len() != 4 {
        page.issues.push(ParseIssue::error(format!(
            "late absence row {}: expected 4 cells, got {}",
            line,
            cells.len()
        )));
        return;
    }
    let Some(date) = parse_date(&cells[0]) else {
        page.issues.push(ParseIssue::error(format!(
            "late absence row {}: unparseable date {:?}",
            line, cells[0]
        )));
        return;
    };
    let Ok(duration_minutes) = cells[2].trim().parse::<u32>() else {
        page.issues.push(ParseIssue::error(format!(
            "late absence row {}: unparseable duration {:?}",
            line, cells[2]
        )));
        return;
    };
    let Some(excused) = parse_flag(&cells[3]) else {
        page.issues.push(ParseIssue::error(format!(
            "late absence row {}: unknown excused flag {:?}",
            line, cells[3]
        )));
        return;
    };

    page.late_absences.push(LateAbsence {
        id: RecordId::next(),
        date,
        reason: cells[1].clone(),
        duration_minutes,
        excused,
    });
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "ja" => Some(true),
        "nein" => Some(false),
        _ => None,
    }
}
