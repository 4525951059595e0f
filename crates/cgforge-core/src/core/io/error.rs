use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Model {requested} not found (file has {available} model(s))")]
    ModelNotFound { requested: usize, available: usize },
    #[error("The {format} format has no concept of multiple models")]
    ModelsUnsupported { format: &'static str },
    #[error("Unsupported structure format for '{path}' (expected .pdb, .ent or .gro)")]
    UnsupportedFormat { path: String },
    #[error("Node {name} of residue {resname}{resid} (chain '{chain}') has no coordinates")]
    UndefinedPosition {
        name: String,
        resname: String,
        resid: isize,
        chain: char,
    },
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for an atom record (must be at least {min} chars)")]
    LineTooShort { min: usize },
    #[error("Expected {expected} atom records, found {found}")]
    AtomCountMismatch { expected: usize, found: usize },
}

pub(crate) fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

pub(crate) fn parse_int(
    line: &str,
    start: usize,
    end: usize,
    line_num: usize,
) -> Result<isize, IoError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| IoError::Parse {
        line: line_num,
        kind: ParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

pub(crate) fn parse_float(
    line: &str,
    start: usize,
    end: usize,
    line_num: usize,
) -> Result<f64, IoError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| IoError::Parse {
        line: line_num,
        kind: ParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}
