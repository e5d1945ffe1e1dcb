use crate::errors::{DecodeError, ParserAttempt, ParserError};
use crate::formats::{DelimitedParser, HtmlTableParser, XlsParser, XlsxParser};
use crate::model::RawTable;

/// Default minimum width: the highest default role column (15) plus one.
pub const DEFAULT_MIN_COLUMNS: usize = 16;

pub trait TableParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &[u8]) -> Result<RawTable, ParserError>;

    /// Every reading of `content` this parser can offer, most likely first. The cascade takes
    /// the first one that passes acceptance.
    fn candidates(&self, content: &[u8]) -> Result<Vec<RawTable>, ParserError> {
        self.parse(content).map(|table| vec![table])
    }

    /// Whether the parser decodes the bytes to text before parsing.
    fn reads_text(&self) -> bool {
        false
    }
}

/// A table accepted by the cascade.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub parser: &'static str,
    pub table: RawTable,
    /// Strategies tried and rejected before `parser` succeeded.
    pub attempts: Vec<ParserAttempt>,
}

pub fn default_parsers() -> Vec<Box<dyn TableParser>> {
    vec![
        Box::new(XlsxParser),
        Box::new(XlsParser),
        Box::new(HtmlTableParser::default()),
        Box::new(DelimitedParser::default()),
    ]
}

pub fn load_table(content: &[u8], min_columns: usize) -> Result<ParsedTable, ParserError> {
    let parsers = default_parsers();
    let refs: Vec<&dyn TableParser> = parsers.iter().map(|parser| parser.as_ref()).collect();
    load_with_parsers(content, &refs, min_columns)
}

/// Run `parsers` in order against the same bytes and keep the first table that is non-empty
/// and at least `min_columns` wide.
pub fn load_with_parsers(
    content: &[u8],
    parsers: &[&dyn TableParser],
    min_columns: usize,
) -> Result<ParsedTable, ParserError> {
    let mut attempts = Vec::new();
    let mut decode_failure: Option<DecodeError> = None;
    let mut decode_failures = 0usize;
    let text_parsers = parsers.iter().filter(|parser| parser.reads_text()).count();

    for parser in parsers {
        match parser.candidates(content) {
            Ok(tables) => {
                for table in tables {
                    match check_acceptance(&table, min_columns) {
                        Ok(()) => {
                            return Ok(ParsedTable {
                                parser: parser.name(),
                                table,
                                attempts,
                            })
                        }
                        Err(reason) => attempts.push(ParserAttempt::new(parser.name(), reason)),
                    }
                }
            }
            Err(ParserError::Decode { parser: name, source }) => {
                decode_failures += 1;
                attempts.push(ParserAttempt::new(name, source.to_string()));
                decode_failure.get_or_insert(source);
            }
            Err(err) => {
                let name = err.parser_name().unwrap_or(parser.name());
                attempts.push(ParserAttempt::new(name, reason_of(err)));
            }
        }
    }

    // Every text strategy choked on the encoding: the file is unreadable rather than
    // merely unrecognized.
    if let Some(source) = decode_failure {
        if decode_failures == text_parsers {
            return Err(ParserError::Unreadable { source, attempts });
        }
    }

    Err(ParserError::NoMatchingParser { attempts })
}

fn check_acceptance(table: &RawTable, min_columns: usize) -> Result<(), String> {
    if table.is_empty() {
        return Err("table is empty".to_string());
    }
    if table.width() < min_columns {
        return Err(format!(
            "table has {} columns, at least {min_columns} required",
            table.width()
        ));
    }
    Ok(())
}

fn reason_of(err: ParserError) -> String {
    match err {
        ParserError::FormatMismatch { reason, .. } => reason,
        other => other.to_string(),
    }
}
