//! Config file discovery and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "reframe.yaml";

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "REFRAME_CONFIG";

/// Resolve the Reframe config directory: `~/.reframe/`.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".reframe"))
        .unwrap_or_else(|| PathBuf::from(".reframe"))
}

/// Pick the config file to load.
///
/// Priority: explicit path > `REFRAME_CONFIG` > `./reframe.yaml` >
/// `~/.reframe/reframe.yaml`. Implicit locations are only used if they exist;
/// an explicit path is returned as-is so a typo is reported, not ignored.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    [PathBuf::from(CONFIG_FILE_NAME), config_dir().join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|p| p.exists())
}

/// Read a YAML config file into a JSON value tree for env substitution.
pub async fn load_config(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        debug!(path = %path.display(), "Config file is empty; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

/// Load `.env` from the working directory (or a parent) if present.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded .env");
            Some(path)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_yaml_into_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model:\n  name: gpt-4o\nstorage:\n  dbPath: /tmp/x.db").unwrap();

        let value = load_config(file.path()).await.unwrap();
        assert_eq!(value["model"]["name"], "gpt-4o");
        assert_eq!(value["storage"]["dbPath"], "/tmp/x.db");
    }

    #[tokio::test]
    async fn empty_file_is_empty_object() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let value = load_config(file.path()).await.unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model: [unclosed").unwrap();
        assert!(load_config(file.path()).await.is_err());
    }

    #[test]
    fn explicit_path_is_returned_even_if_missing() {
        let p = Path::new("/definitely/not/here.yaml");
        assert_eq!(resolve_config_path(Some(p)), Some(p.to_path_buf()));
    }
}
