use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::error::{IsopretError, Result};

pub const CONFIG_ENV: &str = "ISOPRET_CONFIG";

/// Config path from the first CLI argument, else `ISOPRET_CONFIG`, else `./isopret.json`.
pub fn config_path() -> PathBuf {
    if let Some(arg) = env::args_os().nth(1) {
        return PathBuf::from(arg);
    }
    match env::var_os(CONFIG_ENV) {
        Some(val) => PathBuf::from(val),
        None => PathBuf::from("isopret.json"),
    }
}

/// Tab-separated reader with a header row. Records are flexible so the loaders report field-count
/// errors themselves, with the offending line.
pub fn read_tsv(path: &Path) -> Result<Reader<File>> {
    let file = File::open(path).map_err(|e| IsopretError::io(e, path))?;
    Ok(ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(file))
}

/// 1-based line number of a record, for error messages.
pub fn line_of(record: &StringRecord) -> usize {
    record.position().map_or(0, |p| p.line() as usize)
}

/// Display name of an input file.
pub fn source_name(path: &Path) -> String {
    path.display().to_string()
}

/// Fetch field `idx` or fail with the line of the record.
pub fn field<'r>(record: &'r StringRecord, idx: usize, path: &Path) -> Result<&'r str> {
    record.get(idx).map(str::trim).ok_or_else(|| {
        IsopretError::malformed(
            source_name(path),
            line_of(record),
            format!("expected at least {} fields, found {}", idx + 1, record.len()),
        )
    })
}

pub fn parse_f64(value: &str, record: &StringRecord, path: &Path) -> Result<f64> {
    value.parse::<f64>().map_err(|_| {
        IsopretError::malformed(source_name(path), line_of(record), format!("not a number: \"{value}\""))
    })
}
