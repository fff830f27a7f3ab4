use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::ConfigFile;

const DEFAULT_TOML: &str = "loadwire.toml";
const DEFAULT_JSON: &str = "loadwire.json";

/// Loads a configuration file from the provided path or default locations.
///
/// Without a path, `loadwire.toml` and then `loadwire.json` in the working
/// directory are tried; `Ok(None)` means neither exists.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = path {
        return load_config_file(Path::new(path)).map(Some);
    }

    for candidate in [DEFAULT_TOML, DEFAULT_JSON] {
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            return load_config_file(&candidate).map(Some);
        }
    }

    Ok(None)
}

/// Parses one file, choosing the format by extension.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has an unknown extension,
/// or does not parse.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source,
        }),
        Some(ext) => Err(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        }),
        None => Err(ConfigError::MissingExtension),
    }
}
