//! Reader for the portal's CSV exports
//!
//! The exports use semicolons as separators and double quotes around fields
//! that contain separators, line breaks or quotes; quotes inside a quoted
//! field are doubled. Tailored to exactly this dialect rather than pulled
//! from a general CSV library.

/// Splits CSV text into rows of fields. Blank lines are dropped.
pub fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ';' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    push_row(&mut rows, std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row);
    }
    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    // A blank line scans as a single empty field.
    if row.len() == 1 && row[0].is_empty() {
        return;
    }
    rows.push(row);
}
