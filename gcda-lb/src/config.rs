//! Settings resolution for the labeler client
//!
//! Assembles the effective runtime settings from the command line, the
//! environment, and the shared TOML config file, following the
//! workspace-wide priority order (CLI > ENV > file > default).

use std::path::PathBuf;

use tracing::{debug, info, warn};

use gcda_common::config::{self, FileConfig};

/// Environment variable carrying the scoring API key
pub const ENV_API_KEY: &str = "GCDA_API_KEY";

/// Environment variable overriding the indicator catalog path
pub const ENV_CATALOG_PATH: &str = "GCDA_CATALOG";

/// Effective runtime settings for one labeler process
#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend base URL without trailing slash
    pub backend_url: String,

    /// Optional scoring key forwarded with preselection requests; the
    /// backend falls back to its own configured key when absent
    pub api_key: Option<String>,

    /// Indicator catalog file; compiled defaults apply when absent
    pub catalog_path: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from all configuration layers
    pub fn resolve(
        cli_backend_url: Option<&str>,
        cli_api_key: Option<&str>,
        cli_catalog_path: Option<&str>,
    ) -> Settings {
        let file = config::load_file_config();
        let backend_url = config::resolve_backend_url(cli_backend_url, &file);
        let api_key = resolve_api_key(cli_api_key, &file);
        let catalog_path = resolve_catalog_path(cli_catalog_path, &file);
        info!(backend_url = %backend_url, "Settings resolved");
        Settings {
            backend_url,
            api_key,
            catalog_path,
        }
    }
}

/// Resolve the scoring API key from 3-tier configuration
///
/// **Priority:** CLI > ENV > TOML. The key is optional; `None` means the
/// backend's own key configuration applies.
fn resolve_api_key(cli_arg: Option<&str>, file: &FileConfig) -> Option<String> {
    let mut sources = Vec::new();

    // Tier 1: Command line
    let cli_key = cli_arg.filter(|k| is_valid_key(k));
    if cli_key.is_some() {
        sources.push("command line");
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(ENV_API_KEY).ok().filter(|k| is_valid_key(k));
    if env_key.is_some() {
        sources.push("environment");
    }

    // Tier 3: TOML config
    let file_key = file.api_key.as_ref().filter(|k| is_valid_key(k));
    if file_key.is_some() {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Scoring API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = cli_key {
        info!("Scoring API key loaded from command line");
        return Some(key.to_string());
    }
    if let Some(key) = env_key {
        info!("Scoring API key loaded from environment variable");
        return Some(key);
    }
    if let Some(key) = file_key {
        info!("Scoring API key loaded from TOML config");
        return Some(key.clone());
    }

    debug!("No scoring API key configured; backend default applies");
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the indicator catalog path (CLI > ENV > TOML)
fn resolve_catalog_path(cli_arg: Option<&str>, file: &FileConfig) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var(ENV_CATALOG_PATH) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    file.catalog_path.as_ref().map(PathBuf::from)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_api_key_cli_wins_over_env_and_file() {
        std::env::set_var(ENV_API_KEY, "env-key");
        let file = FileConfig {
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_api_key(Some("cli-key"), &file).as_deref(),
            Some("cli-key")
        );
        std::env::remove_var(ENV_API_KEY);
    }

    #[test]
    #[serial]
    fn test_api_key_env_wins_over_file() {
        std::env::set_var(ENV_API_KEY, "env-key");
        let file = FileConfig {
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(None, &file).as_deref(), Some("env-key"));
        std::env::remove_var(ENV_API_KEY);
    }

    #[test]
    #[serial]
    fn test_api_key_absent_everywhere_is_none() {
        std::env::remove_var(ENV_API_KEY);
        assert_eq!(resolve_api_key(None, &FileConfig::default()), None);
    }

    #[test]
    #[serial]
    fn test_whitespace_only_key_is_ignored() {
        std::env::remove_var(ENV_API_KEY);
        let file = FileConfig {
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        // A blank CLI value falls through to the next tier
        assert_eq!(
            resolve_api_key(Some("   "), &file).as_deref(),
            Some("file-key")
        );
    }

    #[test]
    #[serial]
    fn test_catalog_path_priority() {
        std::env::set_var(ENV_CATALOG_PATH, "/env/catalog.toml");
        let file = FileConfig {
            catalog_path: Some("/file/catalog.toml".to_string()),
            ..Default::default()
        };

        assert_eq!(
            resolve_catalog_path(Some("/cli/catalog.toml"), &file),
            Some(PathBuf::from("/cli/catalog.toml"))
        );
        assert_eq!(
            resolve_catalog_path(None, &file),
            Some(PathBuf::from("/env/catalog.toml"))
        );

        std::env::remove_var(ENV_CATALOG_PATH);
        assert_eq!(
            resolve_catalog_path(None, &file),
            Some(PathBuf::from("/file/catalog.toml"))
        );
        assert_eq!(resolve_catalog_path(None, &FileConfig::default()), None);
    }
}
