//! Generic TOML file helpers shared by every phase.

use crate::SchemaError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read and parse a TOML file.
pub fn read_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, SchemaError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Serialize a value and write it to a TOML file, creating parent
/// directories as needed.
pub fn write_toml<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), SchemaError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string(value)?;
    fs::write(path, content)?;
    Ok(())
}
