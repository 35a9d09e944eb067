//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The backend URL has no compiled default; startup fails without one.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for mrv-dash
pub const DEFAULT_PORT: u16 = 5740;

/// Default object storage bucket holding digest documents
pub const DEFAULT_STORAGE_BUCKET: &str = "movie-reviews";

pub const ENV_BACKEND_URL: &str = "MRV_BACKEND_URL";
pub const ENV_BACKEND_KEY: &str = "MRV_BACKEND_KEY";
pub const ENV_STORAGE_BUCKET: &str = "MRV_STORAGE_BUCKET";
pub const ENV_PORT: &str = "MRV_PORT";
pub const ENV_CONFIG: &str = "MRV_CONFIG";

/// Configuration as read from the TOML file
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub backend_url: Option<String>,

    #[serde(default)]
    pub backend_key: Option<String>,

    #[serde(default)]
    pub storage_bucket: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub workflows: WorkflowIds,

    #[serde(default)]
    pub digests: DigestNaming,
}

/// Workflow identifiers recorded in the `workflow_executions` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkflowIds {
    /// Movies ingestion workflow (single level, no sub-executions)
    pub movies_workflow_id: String,
    /// Top-level reviews ingestion workflow
    pub reviews_workflow_id: String,
    /// Sub-workflow spawned by each reviews execution; reviews link to these
    pub reviews_sub_workflow_id: String,
}

impl Default for WorkflowIds {
    fn default() -> Self {
        Self {
            movies_workflow_id: "eTbtW2WLgxa6ZqXS".to_string(),
            reviews_workflow_id: "WF065Cx7idbo2R9C".to_string(),
            reviews_sub_workflow_id: "cPANQaWH3eoCy3FZ".to_string(),
        }
    }
}

/// Naming convention for digest documents in object storage
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DigestNaming {
    /// Stage prefix a digest file name must start with
    pub stage_prefix: String,
    /// Extension a digest file name must end with
    pub extension: String,
}

impl Default for DigestNaming {
    fn default() -> Self {
        Self {
            stage_prefix: "stage5.".to_string(),
            extension: ".md".to_string(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend_url: Option<String>,
    pub backend_key: Option<String>,
    pub storage_bucket: Option<String>,
    pub port: Option<u16>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved dashboard configuration
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub backend_url: String,
    pub backend_key: String,
    pub storage_bucket: String,
    pub port: u16,
    pub workflows: WorkflowIds,
    pub digests: DigestNaming,
}

impl DashConfig {
    /// Resolve configuration from CLI → environment → TOML → defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let toml_config = match config_file_path(cli.config_path.as_deref()) {
            Some(path) => load_toml_config(&path)?,
            None => {
                info!("No config file found, using environment and defaults");
                TomlConfig::default()
            }
        };

        Self::from_sources(cli, toml_config)
    }

    /// Merge already-loaded sources (environment is read here)
    pub fn from_sources(cli: &CliOverrides, toml_config: TomlConfig) -> Result<Self> {
        let backend_url = pick(
            cli.backend_url.clone(),
            ENV_BACKEND_URL,
            toml_config.backend_url,
        )
        .ok_or_else(|| {
            Error::Config(format!(
                "Backend URL not configured (use --backend-url, {} or backend_url in config.toml)",
                ENV_BACKEND_URL
            ))
        })?;

        let backend_key = pick(
            cli.backend_key.clone(),
            ENV_BACKEND_KEY,
            toml_config.backend_key,
        )
        .unwrap_or_else(|| {
            warn!("No backend key configured; requests will be sent unauthenticated");
            String::new()
        });

        let storage_bucket = pick(
            cli.storage_bucket.clone(),
            ENV_STORAGE_BUCKET,
            toml_config.storage_bucket,
        )
        .unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => match std::env::var(ENV_PORT) {
                Ok(raw) => raw
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("{} is not a valid port: {}", ENV_PORT, raw)))?,
                Err(_) => toml_config.port.unwrap_or(DEFAULT_PORT),
            },
        };

        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            backend_key,
            storage_bucket,
            port,
            workflows: toml_config.workflows,
            digests: toml_config.digests,
        })
    }
}

/// First non-empty value of CLI, environment, TOML
fn pick(cli: Option<String>, env_name: &str, toml_value: Option<String>) -> Option<String> {
    cli.filter(|v| !v.is_empty())
        .or_else(|| std::env::var(env_name).ok().filter(|v| !v.is_empty()))
        .or_else(|| toml_value.filter(|v| !v.is_empty()))
}

/// Locate the config file: explicit path, then MRV_CONFIG, then the platform config dir
///
/// Returns None when no candidate exists on disk.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("mrv").join("config.toml"))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Default location of persisted display preferences
pub fn preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mrv").join("preferences.toml"))
}

/// Load and parse a TOML config file
///
/// A missing file degrades to defaults; a malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file not found: {}, using defaults", path.display());
            return Ok(TomlConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_defaults() {
        let ids = WorkflowIds::default();
        assert_eq!(ids.movies_workflow_id, "eTbtW2WLgxa6ZqXS");
        assert_eq!(ids.reviews_workflow_id, "WF065Cx7idbo2R9C");
        assert_eq!(ids.reviews_sub_workflow_id, "cPANQaWH3eoCy3FZ");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            backend_url = "https://example.test"

            [workflows]
            movies_workflow_id = "custom"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend_url.as_deref(), Some("https://example.test"));
        assert_eq!(config.workflows.movies_workflow_id, "custom");
        assert_eq!(config.workflows.reviews_workflow_id, "WF065Cx7idbo2R9C");
        assert_eq!(config.digests, DigestNaming::default());
    }
}
