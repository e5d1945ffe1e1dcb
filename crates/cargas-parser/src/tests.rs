use rust_xlsxwriter::Workbook;

use crate::errors::{ParserAttempt, ParserError};
use crate::model::{Cell, RawTable};
use crate::registry::TableParser;
use crate::{decode::Decoder, load_table, load_with_parsers, DelimitedParser, TextEncoding};

const WIDTH: usize = 17;

fn fixture_rows() -> Vec<Vec<String>> {
    (0..4)
        .map(|row| {
            (0..WIDTH)
                .map(|col| match (row, col) {
                    (_, 3) => format!("{}.5", row * 10 + col),
                    (_, 5) => format!("0012{row}"),
                    (_, 6) => format!("3524011234567800019055001000001234100001234{row}"),
                    (1, 7) => String::new(),
                    (_, 11) => format!("0{}/01/2024 18:00", row + 1),
                    _ => format!("R{row}C{col}"),
                })
                .collect()
        })
        .collect()
}

/// Every non-blank value goes in as a string cell, the way reports store codes and keys.
fn xlsx_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r as u32, c as u16, value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn html_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut html = String::from("<html><head><meta charset=\"utf-8\"></head><body><table>");
    for row in rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str(&format!("<td>{value}</td>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table></body></html>");
    html.into_bytes()
}

fn delimited_bytes(rows: &[Vec<String>], delimiter: &str) -> Vec<u8> {
    rows.iter()
        .map(|row| row.join(delimiter))
        .collect::<Vec<_>>()
        .join("\r\n")
        .into_bytes()
}

fn expected_table() -> RawTable {
    RawTable::from_rows(
        fixture_rows()
            .iter()
            .map(|row| row.iter().map(|value| Cell::from_text(value)).collect())
            .collect(),
    )
}

#[test]
fn every_format_converges_on_the_same_table() {
    let rows = fixture_rows();
    let expected = expected_table();

    let inputs = [
        ("XLSX", xlsx_bytes(&rows)),
        ("HTML_TABLE", html_bytes(&rows)),
        ("DELIMITED", delimited_bytes(&rows, "\t")),
        ("DELIMITED", delimited_bytes(&rows, ";")),
    ];

    for (parser, bytes) in inputs {
        let parsed = load_table(&bytes, 16).expect("load failed");
        assert_eq!(parsed.parser, parser);
        assert_eq!(parsed.table, expected, "{parser} table differs");
    }
}

#[test]
fn text_formats_keep_leading_zeros_and_long_keys() {
    let rows = fixture_rows();
    let from_xlsx = load_table(&xlsx_bytes(&rows), 16).unwrap();
    let from_tsv = load_table(&delimited_bytes(&rows, "\t"), 16).unwrap();

    assert_eq!(from_tsv.table.cell(0, 5), Some(&Cell::Text("00120".into())));
    assert_eq!(
        from_tsv.table.cell(2, 6),
        Some(&Cell::Text("35240112345678000190550010000012341000012342".into()))
    );
    assert_eq!(from_tsv.table.cell(1, 3), Some(&Cell::Text("13.5".into())));
    assert_eq!(from_xlsx.table, from_tsv.table);
}

#[test]
fn first_accepted_strategy_stops_the_cascade() {
    let parsed = load_table(&xlsx_bytes(&fixture_rows()), 16).unwrap();
    assert_eq!(parsed.parser, "XLSX");
    assert!(parsed.attempts.is_empty());
}

#[test]
fn rejected_strategies_are_recorded_in_order() {
    let parsed = load_table(&delimited_bytes(&fixture_rows(), ";"), 16).unwrap();
    let names: Vec<&str> = parsed.attempts.iter().map(|attempt| attempt.parser).collect();
    assert_eq!(names, vec!["XLSX", "XLS", "HTML_TABLE"]);
}

#[test]
fn utf16_tab_export_loads() {
    let text = String::from_utf8(delimited_bytes(&fixture_rows(), "\t")).unwrap();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }

    let parsed = load_table(&bytes, 16).unwrap();
    assert_eq!(parsed.parser, "DELIMITED");
    assert_eq!(parsed.table, expected_table());
}

#[test]
fn narrow_tables_are_rejected_by_every_strategy() {
    let bytes = b"a\tb\n1\t2\n";
    let err = load_table(bytes, 16).unwrap_err();
    match err {
        ParserError::NoMatchingParser { attempts } => {
            assert_eq!(attempts.len(), 4);
            assert!(attempts[3].message.contains("2 columns, at least 16 required"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn stray_tab_in_a_semicolon_report_falls_through_to_semicolon() {
    let mut rows = fixture_rows();
    rows[1][4] = "\"RUA A\tNUM 5\"".to_string();

    let parsed = load_table(&delimited_bytes(&rows, ";"), 16).unwrap();
    assert_eq!(parsed.parser, "DELIMITED");
    assert_eq!(parsed.table.width(), WIDTH);
    assert_eq!(parsed.table.cell(1, 4), Some(&Cell::Text("RUA A\tNUM 5".into())));

    let rejected = parsed.attempts.last().unwrap();
    assert_eq!(rejected.parser, "DELIMITED");
    assert!(rejected.message.contains("2 columns, at least 16 required"));
}

#[test]
fn relaxed_minimum_accepts_narrow_tables() {
    let parsed = load_table(b"a\tb\n1\t2\n", 2).unwrap();
    assert_eq!(parsed.table.width(), 2);
    assert_eq!(parsed.table.cell(1, 1), Some(&Cell::Text("2".into())));
}

#[test]
fn empty_input_is_unrecognized() {
    let err = load_table(b"", 1).unwrap_err();
    assert!(matches!(err, ParserError::NoMatchingParser { .. }));
}

#[test]
fn undecodable_text_is_reported_as_unreadable() {
    let decoder = Decoder::new([TextEncoding::Utf8]);
    let parser = DelimitedParser::new(decoder, vec![b'\t']);
    let parsers: [&dyn TableParser; 1] = [&parser];

    let err = load_with_parsers(b"caf\xE9\tb", &parsers, 1).unwrap_err();
    match err {
        ParserError::Unreadable { source, attempts } => {
            assert_eq!(source.tried, vec!["utf-8"]);
            assert_eq!(attempts.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct Failing;

impl TableParser for Failing {
    fn name(&self) -> &'static str {
        "FAILING"
    }

    fn parse(&self, _content: &[u8]) -> Result<RawTable, ParserError> {
        Err(ParserError::FormatMismatch {
            parser: "FAILING",
            reason: "never matches".to_string(),
        })
    }
}

#[test]
fn failures_do_not_leak_into_later_strategies() {
    let delimited = DelimitedParser::default();
    let parsers: [&dyn TableParser; 3] = [&Failing, &Failing, &delimited];

    let parsed = load_with_parsers(b"x;y;z\n", &parsers, 3).unwrap();
    assert_eq!(parsed.parser, "DELIMITED");
    assert_eq!(
        parsed.attempts,
        vec![
            ParserAttempt::new("FAILING", "never matches"),
            ParserAttempt::new("FAILING", "never matches"),
        ]
    );
}
