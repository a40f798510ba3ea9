use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project-local config file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "tasker.toml";

/// Environment variable overriding the database path.
pub const DB_ENV_VAR: &str = "TASKER_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrackerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Config pointing at a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

/// Read and parse a config file, returning `None` when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not valid
/// TOML for [`TrackerConfig`].
pub fn load_config_file(path: &Path) -> Result<Option<TrackerConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<TrackerConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
        .map(Some)
}

/// Load `tasker.toml` from the project root.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<Option<TrackerConfig>> {
    load_config_file(&project_root.join(PROJECT_CONFIG_FILE))
}

/// Load `tasker/config.toml` from the user config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<TrackerConfig>> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };
    load_config_file(&config_dir.join("tasker/config.toml"))
}

/// Resolve the effective config for a working directory and an optional
/// `--db` flag value.
///
/// # Errors
///
/// Returns an error if the project or user config file is unreadable or
/// malformed.
pub fn resolve_config(project_root: &Path, flag_db: Option<PathBuf>) -> Result<TrackerConfig> {
    let project = load_project_config(project_root)?;
    let user = if project.is_some() {
        None
    } else {
        load_user_config()?
    };
    let env_db = env::var_os(DB_ENV_VAR).map(PathBuf::from);

    Ok(resolve_config_inner(project, user, env_db, flag_db))
}

fn resolve_config_inner(
    project: Option<TrackerConfig>,
    user: Option<TrackerConfig>,
    env_db: Option<PathBuf>,
    flag_db: Option<PathBuf>,
) -> TrackerConfig {
    let mut config = project.or(user).unwrap_or_default();

    if let Some(path) = env_db.filter(|p| !p.as_os_str().is_empty()) {
        config.database.path = path;
    }
    if let Some(path) = flag_db {
        config.database.path = path;
    }

    config
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tasks.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

const fn default_limit() -> u32 {
    100
}
