//! Log path resolution and template loading.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable overriding the default log location.
pub const LOG_FILE_ENV: &str = "PT_ANALYZER_LOG_FILE";

const LOCAL_APP_DATA_ENV: &str = "LOCALAPPDATA";

/// Picks the log to read: the explicit path, then [`LOG_FILE_ENV`], then
/// the game's default location.
///
/// `lookup` reads environment variables.
///
/// # Errors
///
/// Returns [`ConfigError::LogPathUnavailable`] if none of them is set.
pub fn resolve_log_path(
    explicit: Option<&Path>,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let from_env: String = env_or(lookup, LOG_FILE_ENV, String::new());
    if !from_env.is_empty() {
        return Ok(PathBuf::from(from_env));
    }
    default_log_path(lookup)
}

/// `%LOCALAPPDATA%/Warframe/EE.log`.
///
/// # Errors
///
/// Returns [`ConfigError::LogPathUnavailable`] if `LOCALAPPDATA` is unset.
pub fn default_log_path(
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    let local: String = env_or(lookup, LOCAL_APP_DATA_ENV, String::new());
    if local.is_empty() {
        return Err(ConfigError::LogPathUnavailable {
            reason: format!("{LOCAL_APP_DATA_ENV} is not set"),
        });
    }
    Ok(Path::new(&local).join("Warframe").join("EE.log"))
}

/// Loads the run template, or an empty object when none is configured.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidTemplate`] if the file cannot be read or
/// is not a JSON object.
pub fn load_template(path: Option<&Path>) -> Result<Value, ConfigError> {
    let Some(path) = path else {
        return Ok(Value::Object(Map::new()));
    };
    let invalid = |message: String| ConfigError::InvalidTemplate {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let template: Value = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    if !template.is_object() {
        return Err(invalid("expected a JSON object".to_owned()));
    }
    debug!(path = %path.display(), "loaded run template");
    Ok(template)
}

fn env_or<T: FromStr>(lookup: &dyn Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
