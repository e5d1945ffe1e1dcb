use blake3::Hasher;
use cargas_parser::{load_table, ParserAttempt, RawTable};
use tracing::{debug, info, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct FileInput<'a> {
    /// Upload name, used for logging only; content decides the parser.
    pub name: Option<&'a str>,
    pub contents: &'a [u8],
}

impl<'a> FileInput<'a> {
    pub fn new(contents: &'a [u8]) -> Self {
        Self {
            name: None,
            contents,
        }
    }

    pub fn named(name: &'a str, contents: &'a [u8]) -> Self {
        Self {
            name: Some(name),
            contents,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub hash: String,
    pub parser: &'static str,
    pub table: RawTable,
    pub attempts: Vec<ParserAttempt>,
}

pub fn load_file(input: &FileInput<'_>, min_columns: usize) -> Result<LoadedTable> {
    let hash = compute_hash(input.contents);
    let file = input.name.unwrap_or("<upload>");

    let parsed = match load_table(input.contents, min_columns) {
        Ok(parsed) => parsed,
        Err(err) => {
            for attempt in err.attempts() {
                debug!(file, parser = attempt.parser, reason = %attempt.message, "parser rejected file");
            }
            warn!(file, %hash, error = %err, "file could not be loaded");
            return Err(err.into());
        }
    };

    for attempt in &parsed.attempts {
        debug!(file, parser = attempt.parser, reason = %attempt.message, "parser rejected file");
    }
    info!(
        file,
        %hash,
        parser = parsed.parser,
        rows = parsed.table.height(),
        columns = parsed.table.width(),
        "table loaded"
    );

    Ok(LoadedTable {
        hash,
        parser: parsed.parser,
        table: parsed.table,
        attempts: parsed.attempts,
    })
}

fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}
