mod delimited;
mod html;
mod spreadsheet;

pub use delimited::DelimitedParser;
pub use html::HtmlTableParser;
pub use spreadsheet::{XlsParser, XlsxParser};
