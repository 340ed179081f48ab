//! JSONL catalog loading.
//!
//! One record per line. Blank lines are skipped; any other line that fails to
//! decode aborts the load with its line number.

use crate::model::{Identified, SourceError};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Load every record from a JSONL file.
///
/// # Errors
///
/// Returns `SourceError::FileNotFound` if the file does not exist,
/// `SourceError::InvalidRecord` for a line that does not decode,
/// `SourceError::DuplicateKey` if two records share an identity key and
/// `SourceError::Io` for other I/O errors.
pub fn load_catalog<T>(path: impl AsRef<Path>) -> Result<Vec<T>, SourceError>
where
    T: DeserializeOwned + Identified,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(SourceError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut keys = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: T =
            serde_json::from_str(&line).map_err(|e| SourceError::InvalidRecord {
                line: line_number,
                message: e.to_string(),
            })?;

        let key = record.identity_key();
        if !keys.insert(key.clone()) {
            return Err(SourceError::DuplicateKey {
                line: line_number,
                key: format!("{:?}", key),
            });
        }
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "catalog loaded");
    Ok(records)
}
