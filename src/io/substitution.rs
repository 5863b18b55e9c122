//! Substitution matrices in the NCBI text format, e.g.
//!
//! ```text
//! # Comment lines start with '#'
//!    A  C  G  T  *
//! A  1 -1 -1 -1 -2
//! C -1  1 -1 -1 -2
//! G -1 -1  1 -1 -2
//! T -1 -1 -1  1 -2
//! * -2 -2 -2 -2 -2
//! ```
//!
//! The header line lists the column symbols. Each following line starts with the row symbol,
//! in the same order as the header, followed by one score per column. Errors carry the
//! 1-based line number; a missing header or missing rows are reported at the last line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::GpsaError;
use crate::scoring::{CharacterMap, SubstitutionTable};

fn parse_error(line: usize, reason: impl Into<String>) -> GpsaError {
    GpsaError::MatrixParse { line, reason: reason.into() }
}

fn parse_symbol(token: &str, line: usize) -> Result<u8, GpsaError> {
    match token.as_bytes() {
        [symbol] => Ok(*symbol),
        _ => Err(parse_error(line, format!("expected a single character symbol, got {token:?}"))),
    }
}

pub fn parse_substitution_matrix(reader: impl BufRead) -> Result<(SubstitutionTable, CharacterMap), GpsaError> {
    let mut lines = Vec::new();
    let mut last_line = 1;
    for (ix, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        last_line = ix + 1;

        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            lines.push((ix + 1, trimmed.to_string()));
        }
    }

    let mut lines = lines.into_iter();
    let Some((header_line, header)) = lines.next() else {
        return Err(parse_error(last_line, "no header line"));
    };

    let symbols = header.split_whitespace()
        .map(|token| parse_symbol(token, header_line))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = 0;
    let mut scores = Vec::with_capacity(symbols.len() * symbols.len());
    for (line_no, line) in lines {
        let mut tokens = line.split_whitespace();
        let row_symbol = tokens.next()
            .map(|token| parse_symbol(token, line_no))
            .transpose()?;

        match (row_symbol, symbols.get(rows)) {
            (Some(row_symbol), Some(&expected)) if row_symbol == expected => (),
            (Some(row_symbol), Some(&expected)) => return Err(parse_error(line_no,
                format!("row {:?} does not match header column {:?}", row_symbol as char, expected as char))),
            _ => return Err(parse_error(line_no, "more rows than header columns")),
        }

        let row = tokens
            .map(|token| token.parse::<f32>()
                .map_err(|_| parse_error(line_no, format!("invalid score {token:?}"))))
            .collect::<Result<Vec<_>, _>>()?;

        if row.len() != symbols.len() {
            return Err(parse_error(line_no, format!("expected {} scores, got {}", symbols.len(), row.len())));
        }

        scores.extend(row);
        rows += 1;
    }

    if rows != symbols.len() {
        return Err(parse_error(last_line, format!("expected {} rows, got {rows}", symbols.len())));
    }

    let cmap = CharacterMap::from_symbols(&symbols)?;
    let table = SubstitutionTable::new(symbols.len(), scores)?;

    Ok((table, cmap))
}

pub fn load_substitution_matrix(path: impl AsRef<Path>) -> Result<(SubstitutionTable, CharacterMap), GpsaError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|source| GpsaError::FileRead { path: path.to_path_buf(), source })?;

    parse_substitution_matrix(BufReader::new(file))
}
