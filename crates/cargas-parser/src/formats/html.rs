use scraper::{ElementRef, Html, Selector};

use crate::decode::Decoder;
use crate::errors::ParserError;
use crate::model::{Cell, RawTable};
use crate::registry::TableParser;

/// Reads the first `<table>` of an HTML document, which is what many report generators
/// emit under an `.xls` name.
#[derive(Debug, Clone, Default)]
pub struct HtmlTableParser {
    decoder: Decoder,
}

impl HtmlTableParser {
    const NAME: &'static str = "HTML_TABLE";

    fn selector(css: &str) -> Result<Selector, ParserError> {
        Selector::parse(css).map_err(|err| ParserError::FormatMismatch {
            parser: Self::NAME,
            reason: format!("invalid selector '{css}': {err}"),
        })
    }

    fn row_cells(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<Cell> {
        let mut cells = Vec::new();
        for cell in row
            .select(cell_selector)
            .filter(|cell| owned_by(*cell, "tr", row))
        {
            let text = cell.text().collect::<Vec<_>>().join(" ");
            let value = Cell::from_text(&text.split_whitespace().collect::<Vec<_>>().join(" "));
            let span = cell
                .value()
                .attr("colspan")
                .and_then(|span| span.trim().parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            cells.extend(std::iter::repeat(value).take(span));
        }
        cells
    }
}

impl TableParser for HtmlTableParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reads_text(&self) -> bool {
        true
    }

    fn parse(&self, content: &[u8]) -> Result<RawTable, ParserError> {
        let decoded = self
            .decoder
            .decode(content)
            .map_err(|source| ParserError::Decode {
                parser: Self::NAME,
                source,
            })?;

        let document = Html::parse_document(&decoded.text);
        let table_selector = Self::selector("table")?;
        let row_selector = Self::selector("tr")?;
        let cell_selector = Self::selector("td, th")?;

        let table = document
            .select(&table_selector)
            .next()
            .ok_or_else(|| ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: "no <table> element found".to_string(),
            })?;

        let rows: Vec<Vec<Cell>> = table
            .select(&row_selector)
            .filter(|row| owned_by(*row, "table", table))
            .map(|row| Self::row_cells(row, &cell_selector))
            .filter(|cells| !cells.is_empty())
            .collect();

        if rows.is_empty() {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        }

        Ok(RawTable::from_rows(rows))
    }
}

/// Whether the closest enclosing `tag` of `element` is `owner`. Rows and cells of nested
/// tables belong to the nested table.
fn owned_by(element: ElementRef<'_>, tag: &str, owner: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .find(|node| {
            node.value()
                .as_element()
                .is_some_and(|parent| parent.name() == tag)
        })
        .is_some_and(|node| node.id() == owner.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_table_only() {
        let html = "<html><body>\
            <table><tr><td>a</td><td> 1 </td></tr><tr><th>b</th><td></td></tr></table>\
            <table><tr><td>other</td></tr></table>\
            </body></html>";
        let table = HtmlTableParser::default().parse(html.as_bytes()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.cell(0, 1), Some(&Cell::Text("1".into())));
        assert_eq!(table.cell(1, 0), Some(&Cell::Text("b".into())));
        assert_eq!(table.cell(1, 1), Some(&Cell::Empty));
    }

    #[test]
    fn nested_tables_do_not_add_rows_or_cells() {
        let html = "<table>\
            <tr><td>a</td><td><table><tr><td>x</td><td>y</td><td>z</td></tr></table></td></tr>\
            <tr><td>b</td><td>c</td></tr>\
            </table>";
        let table = HtmlTableParser::default().parse(html.as_bytes()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.cell(1, 1), Some(&Cell::Text("c".into())));
    }

    #[test]
    fn colspan_repeats_the_value() {
        let html = "<table><tr><td colspan=\"3\">x</td><td>y</td></tr></table>";
        let table = HtmlTableParser::default().parse(html.as_bytes()).unwrap();
        assert_eq!(table.width(), 4);
        assert_eq!(table.cell(0, 2), Some(&Cell::Text("x".into())));
        assert_eq!(table.cell(0, 3), Some(&Cell::Text("y".into())));
    }

    #[test]
    fn document_without_table_is_a_mismatch() {
        let err = HtmlTableParser::default()
            .parse(b"a\tb\tc\n1\t2\t3\n")
            .unwrap_err();
        assert!(matches!(err, ParserError::FormatMismatch { .. }));
    }
}
