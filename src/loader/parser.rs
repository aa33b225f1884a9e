use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;

use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed or does not match `T`.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path).map_err(Error::IoError)?;

    let parsed_data: T = serde_json::from_str(&data).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

/// Writes `value` as pretty printed JSON, replacing the file.
pub fn write_json_file<T: Serialize>(file_path: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value).map_err(Error::DeserializationError)?;
    fs::write(file_path, data).map_err(Error::IoError)?;

    log::debug!("Wrote {}", file_path);
    Ok(())
}
