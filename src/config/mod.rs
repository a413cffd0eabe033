//! Persisted configuration: API key, default model, and base URL.
//!
//! Stored as `config.toml` under the platform config directory. Edits go
//! through toml_edit so hand-written comments and formatting survive the
//! `config … set` subcommands.

use std::fs;
use std::path::{Path, PathBuf};

use toml_edit::DocumentMut;

use crate::error::ConfigError;

/// Model used when neither the flag nor the config names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Endpoint used when neither the flag nor the config names one.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Values of the `[api]` table in config.toml. Absent keys are empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub key: String,
    pub model: String,
    pub base_url: String,
}

/// Path of the config file under the platform config directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("quill").join("config.toml"))
}

/// Load settings from `path`. A missing file yields default (empty) settings.
pub fn load(path: &Path) -> Result<ApiSettings, ConfigError> {
    if !path.exists() {
        return Ok(ApiSettings::default());
    }

    let text = fs::read_to_string(path).map_err(ConfigError::ReadFailed)?;
    let doc: DocumentMut = text.parse().map_err(ConfigError::ParseFailed)?;
    let get = |key: &str| {
        doc.get("api")
            .and_then(|table| table.get(key))
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string()
    };

    Ok(ApiSettings {
        key: get("key"),
        model: get("model"),
        base_url: get("baseurl"),
    })
}

/// Set one `[api]` key, preserving unrelated content and formatting. The
/// file and its parent directories are created on demand.
pub fn set_value(path: &Path, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = if path.exists() {
        fs::read_to_string(path).map_err(ConfigError::ReadFailed)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = text.parse().map_err(ConfigError::ParseFailed)?;
    doc["api"][key] = toml_edit::value(value);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
    }
    fs::write(path, doc.to_string()).map_err(ConfigError::WriteFailed)?;

    Ok(())
}

/// Resolve the effective model: an explicit flag beats the config, which
/// beats the built-in default.
pub fn resolve_model(flag: &str, settings: &ApiSettings) -> String {
    if flag != DEFAULT_MODEL || settings.model.is_empty() {
        flag.to_string()
    } else {
        settings.model.clone()
    }
}

/// Resolve the effective base URL, same precedence as [`resolve_model`].
pub fn resolve_base_url(flag: &str, settings: &ApiSettings) -> String {
    if flag != DEFAULT_BASE_URL || settings.base_url.is_empty() {
        flag.to_string()
    } else {
        settings.base_url.clone()
    }
}

/// Resolve the API key: the QUILL_API_KEY environment variable beats the
/// config file. An empty key is an error with setup guidance.
pub fn resolve_api_key(settings: &ApiSettings) -> Result<String, ConfigError> {
    if let Ok(key) = std::env::var("QUILL_API_KEY")
        && !key.is_empty()
    {
        return Ok(key);
    }

    if settings.key.is_empty() {
        Err(ConfigError::MissingApiKey)
    } else {
        Ok(settings.key.clone())
    }
}
