//! Minimal CSV reading for catalog and prompt files.
//!
//! Cells may be quoted. Inside quotes, commas and newlines are literal and a
//! doubled quote stands for one quote character. Carriage returns outside
//! quotes are ignored, and rows whose cells are all blank are dropped.

use serde_json::{Map, Value};

/// Splits CSV text into rows of raw cells.
#[must_use]
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    cell.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' => quoted = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            '\r' => {}
            _ => cell.push(c),
        }
    }

    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    rows.retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    rows
}

/// Reads CSV text as one JSON object per data row, keyed by the header row.
///
/// Header names and cells are trimmed. Short rows are padded with empty
/// strings.
#[must_use]
pub fn records(text: &str) -> Vec<Map<String, Value>> {
    let mut rows = parse(text).into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<_> = header.iter().map(|name| name.trim().to_string()).collect();

    rows.map(|row| {
        header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cell = row.get(i).map_or("", |cell| cell.trim());
                (name.clone(), Value::String(cell.to_string()))
            })
            .collect()
    })
    .collect()
}

/// Reads the `prompt` column of CSV text, or the first column if there is no
/// such header. Blank cells are dropped.
#[must_use]
pub fn prompt_column(text: &str) -> Vec<String> {
    let mut rows = parse(text).into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let column = header
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case("prompt"))
        .unwrap_or(0);

    rows.filter_map(|row| {
        let cell = row.get(column)?.trim();
        (!cell.is_empty()).then(|| cell.to_string())
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("a,b\n1,2\n", &[&["a", "b"], &["1", "2"]]; "plain")]
    #[test_case("a,b\r\n1,2\r\n", &[&["a", "b"], &["1", "2"]]; "crlf")]
    #[test_case("a,b\n1,2", &[&["a", "b"], &["1", "2"]]; "no trailing newline")]
    #[test_case("a\n\"x, y\"\n", &[&["a"], &["x, y"]]; "quoted comma")]
    #[test_case("a\n\"say \"\"hi\"\"\"\n", &[&["a"], &["say \"hi\""]]; "escaped quote")]
    #[test_case("a\n\"two\nlines\"\n", &[&["a"], &["two\nlines"]]; "quoted newline")]
    #[test_case("a,b\n\n , \n1,2\n", &[&["a", "b"], &["1", "2"]]; "blank rows dropped")]
    #[test_case("", &[]; "empty")]
    fn parses(text: &str, expected: &[&[&str]]) {
        assert_eq!(parse(text), expected);
    }

    #[test]
    fn records_are_keyed_by_trimmed_header() {
        let records = records(" Title ,Minutes\n Walk , 10 \nNap\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Title"], "Walk");
        assert_eq!(records[0]["Minutes"], "10");
        assert_eq!(records[1]["Minutes"], "");
    }

    #[test]
    fn prompt_column_prefers_named_column() {
        let prompts = prompt_column("id,Prompt\n1,Mime a chef\n2,\n3, Juggle \n");
        assert_eq!(prompts, ["Mime a chef", "Juggle"]);
    }

    #[test]
    fn prompt_column_falls_back_to_first_column() {
        let prompts = prompt_column("question\nFavourite food?\nBest trip?\n");
        assert_eq!(prompts, ["Favourite food?", "Best trip?"]);
    }

    #[test]
    fn prompt_column_of_header_only_is_empty() {
        assert!(prompt_column("prompt\n").is_empty());
    }
}
