// ── Delimited-text reader ──
//
// A quote toggles "inside quotes"; a delimiter inside quotes is part of
// the cell. Quote characters themselves are dropped. Escaped quotes are
// not supported.

use indexmap::IndexMap;

use super::ParseError;
use super::schema::{RawCell, RawRecord};

pub const QUOTE: char = '"';

/// Delimiters that would make lines ambiguous.
pub fn check_delimiter(delimiter: char) -> Result<(), ParseError> {
    if delimiter == QUOTE || delimiter == '\n' || delimiter == '\r' {
        return Err(ParseError::Delimiter(delimiter));
    }
    Ok(())
}

/// Split one line into cells.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == QUOTE {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    cells.push(current);
    cells
}

/// First non-blank line is the header; every later non-blank line is a
/// record. Missing trailing cells read as empty, surplus cells are ignored.
pub fn parse(raw: &str, delimiter: char) -> Result<Vec<RawRecord>, ParseError> {
    check_delimiter(delimiter)?;

    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.lines().filter(|line| !line.trim().is_empty());

    let header = lines.next().ok_or(ParseError::MissingRows)?;
    let columns: Vec<String> = split_line(header, delimiter)
        .into_iter()
        .map(|name| name.trim().to_owned())
        .collect();
    // Header lookup is case-insensitive, so `code` and `CODE` collide too.
    for (idx, name) in columns.iter().enumerate() {
        if !name.is_empty()
            && columns[..idx]
                .iter()
                .any(|earlier| earlier.eq_ignore_ascii_case(name))
        {
            return Err(ParseError::DuplicateColumn(name.clone()));
        }
    }

    let records: Vec<RawRecord> = lines
        .enumerate()
        .map(|(idx, line)| {
            let mut cells = split_line(line, delimiter).into_iter();
            let mut map = IndexMap::with_capacity(columns.len());
            for column in &columns {
                let cell = cells.next().unwrap_or_default();
                if !column.is_empty() {
                    map.insert(column.clone(), RawCell::Text(cell));
                }
            }
            RawRecord {
                row: idx + 1,
                cells: map,
            }
        })
        .collect();

    if records.is_empty() {
        return Err(ParseError::MissingRows);
    }
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quoted_delimiter_is_not_a_boundary() {
        assert_eq!(
            split_line(r#"A_1,"daily, promo",50"#, ','),
            vec!["A_1", "daily, promo", "50"]
        );
    }

    #[test]
    fn empty_cells_are_kept() {
        assert_eq!(split_line("a,,c,", ','), vec!["a", "", "c", ""]);
    }

    #[test]
    fn custom_delimiter() {
        assert_eq!(split_line("a;b,c;d", ';'), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn short_and_long_rows() {
        let raw = "code,packageKey,valueKES\n\nA_1,daily\nB_2,weekly,20,extra\n";
        let records = parse(raw, ',').unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 1);
        assert_eq!(
            records[0].cells.get("valueKES"),
            Some(&RawCell::Text(String::new()))
        );
        assert_eq!(records[1].cells.len(), 3);
        assert_eq!(
            records[1].cells.get("valueKES"),
            Some(&RawCell::Text("20".into()))
        );
    }

    #[test]
    fn repeated_header_is_fatal() {
        assert_eq!(
            parse("code,packageKey,CODE
A_1,daily,B_2
", ','),
            Err(ParseError::DuplicateColumn("CODE".into()))
        );
    }

    #[test]
    fn header_only_is_fatal() {
        assert_eq!(parse("code,packageKey\n\n  \n", ','), Err(ParseError::MissingRows));
        assert_eq!(parse("", ','), Err(ParseError::MissingRows));
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let raw = "\u{feff}packageKey,code\r\ndaily,A_1\r\n";
        let records = parse(raw, ',').unwrap();
        assert_eq!(
            records[0].cells.get("packageKey"),
            Some(&RawCell::Text("daily".into()))
        );
        assert_eq!(records[0].cells.get("code"), Some(&RawCell::Text("A_1".into())));
    }

    #[test]
    fn quote_delimiter_is_rejected() {
        assert_eq!(parse("a\nb", '"'), Err(ParseError::Delimiter('"')));
    }
}
