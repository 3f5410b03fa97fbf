//! Configuration loading and settings resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable overriding the backend base URL
pub const ENV_BACKEND_URL: &str = "GCDA_BACKEND_URL";

/// Compiled default backend base URL
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// TOML configuration file model
///
/// All fields are optional; anything absent falls through to the next
/// resolution layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Backend base URL, e.g. "http://127.0.0.1:8000"
    pub backend_url: Option<String>,
    /// API key forwarded to the AI preselection endpoint
    pub api_key: Option<String>,
    /// Path to the indicator catalog TOML file
    pub catalog_path: Option<String>,
}

/// Resolve the platform configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/gcda/config.toml first, then /etc/gcda/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("gcda").join("config.toml"));
        let system_config = PathBuf::from("/etc/gcda/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("gcda").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Load the TOML config file, falling back to defaults when absent or unreadable
///
/// A malformed file is logged and ignored rather than aborting startup; the
/// remaining resolution layers still apply.
pub fn load_file_config() -> FileConfig {
    let path = match config_file_path() {
        Ok(p) => p,
        Err(_) => return FileConfig::default(),
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring malformed config file {:?}: {}", path, e);
                FileConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Could not read config file {:?}: {}", path, e);
            FileConfig::default()
        }
    }
}

/// Parse a TOML config document
///
/// Split out of [`load_file_config`] so tests can exercise parsing without
/// touching the platform config path.
pub fn parse_file_config(content: &str) -> Result<FileConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
}

/// Resolve the backend base URL following the priority order
pub fn resolve_backend_url(cli_arg: Option<&str>, file: &FileConfig) -> String {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg {
        return url.trim_end_matches('/').to_string();
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
        if !url.is_empty() {
            return url.trim_end_matches('/').to_string();
        }
    }

    // Priority 3: TOML config file
    if let Some(url) = &file.backend_url {
        return url.trim_end_matches('/').to_string();
    }

    // Priority 4: Compiled default
    DEFAULT_BACKEND_URL.to_string()
}

/// Platform directory for locally persisted client state (session file)
pub fn state_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/gcda
        dirs::data_local_dir()
            .map(|d| d.join("gcda"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/gcda"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/gcda
        dirs::data_dir()
            .map(|d| d.join("gcda"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/gcda"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\gcda
        dirs::data_local_dir()
            .map(|d| d.join("gcda"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\gcda"))
    } else {
        PathBuf::from("./gcda_data")
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_backend_url_default_when_nothing_set() {
        std::env::remove_var(ENV_BACKEND_URL);
        let url = resolve_backend_url(None, &FileConfig::default());
        assert_eq!(url, DEFAULT_BACKEND_URL);
    }

    #[test]
    #[serial]
    fn test_backend_url_cli_wins_over_env_and_file() {
        std::env::set_var(ENV_BACKEND_URL, "http://env:9000");
        let file = FileConfig {
            backend_url: Some("http://file:9001".to_string()),
            ..Default::default()
        };
        let url = resolve_backend_url(Some("http://cli:9002/"), &file);
        assert_eq!(url, "http://cli:9002");
        std::env::remove_var(ENV_BACKEND_URL);
    }

    #[test]
    #[serial]
    fn test_backend_url_env_wins_over_file() {
        std::env::set_var(ENV_BACKEND_URL, "http://env:9000");
        let file = FileConfig {
            backend_url: Some("http://file:9001".to_string()),
            ..Default::default()
        };
        let url = resolve_backend_url(None, &file);
        assert_eq!(url, "http://env:9000");
        std::env::remove_var(ENV_BACKEND_URL);
    }

    #[test]
    #[serial]
    fn test_backend_url_file_used_when_no_overrides() {
        std::env::remove_var(ENV_BACKEND_URL);
        let file = FileConfig {
            backend_url: Some("http://file:9001".to_string()),
            ..Default::default()
        };
        let url = resolve_backend_url(None, &file);
        assert_eq!(url, "http://file:9001");
    }

    #[test]
    fn test_parse_file_config() {
        let config = parse_file_config(
            r#"
            backend_url = "http://localhost:8000"
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert!(config.catalog_path.is_none());

        assert!(parse_file_config("backend_url = [1]").is_err());
    }
}
