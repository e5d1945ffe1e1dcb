pub mod decode;
pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use decode::{decode, DecodedText, Decoder, TextEncoding, DEFAULT_ENCODINGS};
pub use errors::{DecodeError, ParserAttempt, ParserError};
pub use formats::{DelimitedParser, HtmlTableParser, XlsParser, XlsxParser};
pub use model::{Cell, RawTable};
pub use registry::{
    default_parsers, load_table, load_with_parsers, ParsedTable, TableParser, DEFAULT_MIN_COLUMNS,
};

#[cfg(test)]
mod tests;
