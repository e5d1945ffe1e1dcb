use cargas_parser::{DecodeError, ParserAttempt, ParserError};
use thiserror::Error;

use crate::columns::ColumnRole;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unreadable file: {source}")]
    Decode {
        #[source]
        source: DecodeError,
        attempts: Vec<ParserAttempt>,
    },

    #[error("unrecognized file format; tried {}", format_attempts(.attempts))]
    UnrecognizedFormat { attempts: Vec<ParserAttempt> },

    #[error("{role} column (0-based index {column}) is out of range: the table has {width} columns")]
    Schema {
        role: ColumnRole,
        column: usize,
        width: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration TOML: {0}")]
    ConfigToml(#[from] toml::de::Error),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write workbook: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("output of {rows} rows by {columns} columns exceeds the worksheet limits")]
    OutputTooLarge { rows: usize, columns: usize },
}

impl PipelineError {
    /// Short remediation advice for the operator, keyed by error kind.
    pub fn hint(&self) -> &'static str {
        match self {
            PipelineError::Decode { .. } => {
                "The file is not text in any supported encoding. Re-export it from the source system."
            }
            PipelineError::UnrecognizedFormat { .. } => {
                "Check that the file is a complete spreadsheet, HTML or tab/semicolon separated export."
            }
            PipelineError::Schema { .. } => {
                "The column layout changed. Check the column positions and the numbering base."
            }
            PipelineError::Config(_) | PipelineError::ConfigToml(_) => {
                "Fix the configuration file and run again."
            }
            PipelineError::Io(_) => "Check the input and output paths.",
            PipelineError::Export(_) => "The output workbook could not be produced.",
            PipelineError::OutputTooLarge { .. } => {
                "Split the report or drop more columns before exporting."
            }
        }
    }
}

impl From<ParserError> for PipelineError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::Unreadable { source, attempts } => {
                PipelineError::Decode { source, attempts }
            }
            ParserError::NoMatchingParser { attempts } => {
                PipelineError::UnrecognizedFormat { attempts }
            }
            ParserError::Decode { parser, source } => PipelineError::Decode {
                attempts: vec![ParserAttempt::new(parser, source.to_string())],
                source,
            },
            other => {
                let parser = other.parser_name().unwrap_or("unknown");
                PipelineError::UnrecognizedFormat {
                    attempts: vec![ParserAttempt::new(parser, other.to_string())],
                }
            }
        }
    }
}

fn format_attempts(attempts: &[ParserAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, PipelineError>;
