//! Application configuration for grafana-build.
//!
//! User config lives at `~/.grafana-build/grafana-build.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GrafanaBuildError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "grafana-build.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".grafana-build";

// ---------------------------------------------------------------------------
// Config structs (matching grafana-build.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// GitHub credential settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Clone URLs for the base and enterprise repositories.
    #[serde(default)]
    pub repos: ReposConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default ref to clone for the base repository.
    #[serde(default = "default_ref")]
    pub grafana_ref: String,

    /// Default ref to clone for the enterprise repository.
    #[serde(default = "default_ref")]
    pub enterprise_ref: String,

    /// Default local source path checked before cloning.
    #[serde(default = "default_source_path")]
    pub source_path: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            grafana_ref: default_ref(),
            enterprise_ref: default_ref(),
            source_path: default_source_path(),
        }
    }
}

fn default_ref() -> String {
    "main".into()
}
fn default_source_path() -> String {
    ".grafana".into()
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Name of the env var holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Fallback token value, consulted after the flag and the env var.
    /// Prefer the env var; this exists for CI setups that template the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            token: None,
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// `[repos]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReposConfig {
    /// Base repository clone URL.
    #[serde(default = "default_grafana_repo")]
    pub grafana: String,

    /// Enterprise repository clone URL (requires a token).
    #[serde(default = "default_enterprise_repo")]
    pub enterprise: String,
}

impl Default for ReposConfig {
    fn default() -> Self {
        Self {
            grafana: default_grafana_repo(),
            enterprise: default_enterprise_repo(),
        }
    }
}

fn default_grafana_repo() -> String {
    "https://github.com/grafana/grafana.git".into()
}
fn default_enterprise_repo() -> String {
    "https://github.com/grafana/grafana-enterprise.git".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.grafana-build/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GrafanaBuildError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.grafana-build/grafana-build.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GrafanaBuildError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GrafanaBuildError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| GrafanaBuildError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| GrafanaBuildError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GrafanaBuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
