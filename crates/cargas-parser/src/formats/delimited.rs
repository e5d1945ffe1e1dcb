use csv::ReaderBuilder;

use crate::decode::Decoder;
use crate::errors::ParserError;
use crate::model::{Cell, RawTable};
use crate::registry::TableParser;

/// Delimited text; delimiters are tried in order and the first one that splits rows into more
/// than one column wins.
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    decoder: Decoder,
    delimiters: Vec<u8>,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self {
            decoder: Decoder::default(),
            delimiters: vec![b'\t', b';'],
        }
    }
}

impl DelimitedParser {
    const NAME: &'static str = "DELIMITED";

    pub fn new(decoder: Decoder, delimiters: impl Into<Vec<u8>>) -> Self {
        Self {
            decoder,
            delimiters: delimiters.into(),
        }
    }

    fn parse_with(text: &str, delimiter: u8) -> Result<RawTable, ParserError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| ParserError::Csv {
                parser: Self::NAME,
                source,
            })?;
            rows.push(record.iter().map(Cell::from_text).collect());
        }

        Ok(RawTable::from_rows(rows))
    }

    fn no_delimiter(&self) -> ParserError {
        let tried = self
            .delimiters
            .iter()
            .map(|&delimiter| delimiter_name(delimiter))
            .collect::<Vec<_>>()
            .join(", ");
        ParserError::FormatMismatch {
            parser: Self::NAME,
            reason: format!("no delimiter produced more than one column (tried {tried})"),
        }
    }
}

fn delimiter_name(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "tab".to_string(),
        b';' => "semicolon".to_string(),
        b',' => "comma".to_string(),
        other => format!("'{}'", char::from(other)),
    }
}

impl TableParser for DelimitedParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reads_text(&self) -> bool {
        true
    }

    fn parse(&self, content: &[u8]) -> Result<RawTable, ParserError> {
        self.candidates(content)?
            .into_iter()
            .next()
            .ok_or_else(|| self.no_delimiter())
    }

    /// One table per delimiter that splits the text into more than one column, in delimiter
    /// order, so a stray tab inside a semicolon report does not hide the semicolon reading.
    fn candidates(&self, content: &[u8]) -> Result<Vec<RawTable>, ParserError> {
        let decoded = self
            .decoder
            .decode(content)
            .map_err(|source| ParserError::Decode {
                parser: Self::NAME,
                source,
            })?;

        let mut tables = Vec::new();
        for &delimiter in &self.delimiters {
            let table = Self::parse_with(&decoded.text, delimiter)?;
            if table.width() > 1 {
                tables.push(table);
            }
        }

        if tables.is_empty() {
            return Err(self.no_delimiter());
        }
        Ok(tables)
    }
}
