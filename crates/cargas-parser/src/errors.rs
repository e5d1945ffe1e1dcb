use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserAttempt {
    pub parser: &'static str,
    pub message: String,
}

impl ParserAttempt {
    pub fn new(parser: &'static str, message: impl Into<String>) -> Self {
        Self {
            parser,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParserAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parser, self.message)
    }
}

/// No candidate encoding produced text from the input bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bytes could not be decoded with any of: {}", .tried.join(", "))]
pub struct DecodeError {
    pub tried: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} format mismatch: {reason}")]
    FormatMismatch {
        parser: &'static str,
        reason: String,
    },

    #[error("{parser} could not decode text: {source}")]
    Decode {
        parser: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} file did not contain any data rows")]
    EmptyData { parser: &'static str },

    #[error("file is unreadable: {source}")]
    Unreadable {
        #[source]
        source: DecodeError,
        attempts: Vec<ParserAttempt>,
    },

    #[error("no parser recognized this file; attempts: {}", format_attempts(.attempts))]
    NoMatchingParser { attempts: Vec<ParserAttempt> },
}

impl ParserError {
    pub fn parser_name(&self) -> Option<&'static str> {
        match self {
            ParserError::FormatMismatch { parser, .. }
            | ParserError::Decode { parser, .. }
            | ParserError::Csv { parser, .. }
            | ParserError::EmptyData { parser } => Some(parser),
            ParserError::Unreadable { .. } | ParserError::NoMatchingParser { .. } => None,
        }
    }

    /// Attempts recorded by the cascade, empty for single-parser errors.
    pub fn attempts(&self) -> &[ParserAttempt] {
        match self {
            ParserError::Unreadable { attempts, .. }
            | ParserError::NoMatchingParser { attempts } => attempts,
            _ => &[],
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
