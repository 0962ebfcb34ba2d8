//! Parser for the account transaction page

use crate::parse::markup::inner_text;
use crate::parse::{parse_date, parse_decimal, ParseIssue, ParserResult};
use crate::records::{RecordId, Transaction};
use scraper::{Html, Selector};

/// Parses the account page: `table#konto`, three cells per booking row
/// (date, booking text, amount).
pub fn parse_transactions(html: &str) -> ParserResult<Transaction> {
    let mut result = ParserResult::new();
    let document = Html::parse_document(html);

    let (Ok(row_selector), Ok(cell_selector)) =
        (Selector::parse("table#konto tr"), Selector::parse("td"))
    else {
        result
            .issues
            .push(ParseIssue::fatal("invalid transaction selector"));
        return result;
    };

    let mut any_row = false;
    for (line, row) in document.select(&row_selector).enumerate() {
        any_row = true;
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| inner_text(&cell))
            .collect();
        if cells.is_empty() {
            // Header row.
            continue;
        }
        if cells.len() != 3 {
            result.issues.push(ParseIssue::error(format!(
                "transaction row {}: expected 3 cells, got {}",
                line + 1,
                cells.len()
            )));
            continue;
        }

        let Some(date) = parse_date(&cells[0]) else {
            result.issues.push(ParseIssue::error(format!(
                "transaction row {}: unparseable date {:?}",
                line + 1,
                cells[0]
            )));
            continue;
        };
        let Some(amount) = parse_decimal(&cells[2]) else {
            result.issues.push(ParseIssue::error(format!(
                "transaction row {}: unparseable amount {:?}",
                line + 1,
                cells[2]
            )));
            continue;
        };

        result.records.push(Transaction {
            id: RecordId::next(),
            date,
            text: cells[1].clone(),
            amount,
        });
    }

    if !any_row {
        result
            .issues
            .push(ParseIssue::fatal("transaction table is missing"));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_transactions() {
        let html = r#"<table id="konto">
            <tr><th>Datum</th><th>Buchungstext</th><th>Betrag</th></tr>
            <tr><td>01.08.2025</td><td>Semestergebühr</td><td>-1'250.00</td></tr>
            <tr><td>15.08.2025</td><td>Einzahlung</td><td>500.00</td></tr>
        </table>"#;
        let result = parse_transactions(html);

        assert!(result.issues.is_empty());
        assert_eq!(result.records.len(), 2);
        assert_eq!(
            result.records[0].date,
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
        );
        assert_eq!(result.records[0].amount, -1250.0);
        assert_eq!(result.records[1].text, "Einzahlung");
    }

    #[test]
    fn test_bad_amount_skips_row() {
        let html = r#"<table id="konto">
            <tr><td>01.08.2025</td><td>Gebühr</td><td>offen</td></tr>
            <tr><td>02.08.2025</td><td>Einzahlung</td><td>100.00</td></tr>
        </table>"#;
        let result = parse_transactions(html);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let result = parse_transactions("<html><body></body></html>");
        assert!(result.records.is_empty());
        assert!(result.has_fatal());
    }
}
