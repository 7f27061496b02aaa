//! CSV encoding of the phone book table.
//!
//! The on-disk layout is fixed: a `Name,Phone,Email` header followed by one
//! row per record, `\n`-terminated, with RFC 4180 quoting for fields that
//! contain the delimiter, quotes or line breaks.

use thiserror::Error;

use super::models::{Record, Table};

pub const HEADER: [&str; 3] = ["Name", "Phone", "Email"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
    #[error("line {line}: unexpected character after closing quote")]
    CharacterAfterQuote { line: usize },
    #[error("line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Serialize a table in canonical form.
pub fn write_table(table: &Table) -> String {
    let mut out = String::new();
    write_row(&mut out, &HEADER);
    for record in table.records() {
        write_row(
            &mut out,
            &[
                record.name.as_str(),
                record.phone.as_str(),
                record.email.as_str(),
            ],
        );
    }
    out
}

/// Parse CSV text into a table, locating columns by header name.
///
/// Empty text is the empty table. Columns other than the three known ones are
/// ignored; short rows are padded with empty fields.
pub fn read_table(text: &str) -> Result<Table, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Ok(Table::new());
    }

    let mut rows = parse_rows(text)?.into_iter();
    let Some((_, header)) = rows.next() else {
        return Ok(Table::new());
    };

    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or(CsvError::MissingColumn(name))
    };
    let name_idx = column("Name")?;
    let phone_idx = column("Phone")?;
    let email_idx = column("Email")?;

    let mut table = Table::new();
    for (line, row) in rows {
        if row.len() > header.len() {
            return Err(CsvError::TooManyFields {
                line,
                expected: header.len(),
                found: row.len(),
            });
        }
        let field = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        table.push(Record {
            name: field(name_idx),
            phone: field(phone_idx),
            email: field(email_idx),
        });
    }

    Ok(table)
}

fn write_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push('\n');
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split text into rows of fields, tagged with the 1-based line each row starts on.
/// Blank lines are skipped.
fn parse_rows(text: &str) -> Result<Vec<(usize, Vec<String>)>, CsvError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line = 1;
    let mut row_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            ',' => {
                row.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if !row.is_empty() || !field.is_empty() || quoted {
                    row.push(std::mem::take(&mut field));
                    rows.push((row_line, std::mem::take(&mut row)));
                }
                quoted = false;
                line += 1;
                row_line = line;
            }
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            _ if quoted => return Err(CsvError::CharacterAfterQuote { line }),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: row_line });
    }
    if !row.is_empty() || !field.is_empty() || quoted {
        row.push(field);
        rows.push((row_line, row));
    }

    Ok(rows)
}
