//! Layered configuration loading.
//!
//! Configurations are loaded from three levels with increasing priority:
//!
//! 1. **User** - `<config dir>/mrgate/config.toml`
//! 2. **Project** - `mrgate.toml` in the project root
//! 3. **Explicit** - the file passed with `--config`
//!
//! Tables are merged key by key; scalars and arrays from a higher level
//! replace the lower level's value.
//!
//! # Example
//!
//! ```rust,ignore
//! use mrgate::config::ConfigLoader;
//! use std::path::Path;
//!
//! let (config, chain) = ConfigLoader::new().load_with_chain(Path::new("."))?;
//! println!("{}", chain.describe());
//! ```

use std::path::{Path, PathBuf};
use tracing::debug;

use super::GateConfig;
use crate::error::{GateError, Result};

// ============================================================================
// Configuration Level
// ============================================================================

/// Configuration level in the inheritance hierarchy.
///
/// ```rust
/// use mrgate::config::ConfigLevel;
///
/// assert!(ConfigLevel::User < ConfigLevel::Project);
/// assert!(ConfigLevel::Project < ConfigLevel::Explicit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigLevel {
    /// Per-user defaults (lowest priority).
    User,
    /// `mrgate.toml` in the project root.
    Project,
    /// File named on the command line (highest priority).
    Explicit,
}

impl std::fmt::Display for ConfigLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Project => write!(f, "project"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

// ============================================================================
// Inheritance Chain
// ============================================================================

/// A file that was (or could have been) loaded.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub level: ConfigLevel,
    pub path: PathBuf,
    /// `false` when the file does not exist.
    pub loaded: bool,
}

impl ConfigSource {
    #[must_use]
    pub fn new(level: ConfigLevel, path: PathBuf, loaded: bool) -> Self {
        Self {
            level,
            path,
            loaded,
        }
    }
}

/// Every file consulted while resolving a configuration, in merge order.
#[derive(Debug, Clone, Default)]
pub struct InheritanceChain {
    pub sources: Vec<ConfigSource>,
}

impl InheritanceChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, level: ConfigLevel, path: PathBuf, loaded: bool) {
        self.sources.push(ConfigSource::new(level, path, loaded));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of sources that existed and were merged.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.sources.iter().filter(|s| s.loaded).count()
    }

    /// Multi-line listing with `+` for loaded and `-` for absent files.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut lines = vec!["Configuration inheritance chain:".to_string()];
        for source in &self.sources {
            let status = if source.loaded { "+" } else { "-" };
            lines.push(format!(
                "  {} [{}] {}",
                status,
                source.level,
                source.path.display()
            ));
        }
        lines.join("\n")
    }
}

// ============================================================================
// Config Loader
// ============================================================================

/// Loads and merges the configuration levels.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    user_config_path: Option<PathBuf>,
    explicit_path: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with the platform user config path and no explicit file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_config_path: Self::default_user_path(),
            explicit_path: None,
        }
    }

    /// `{config_dir}/mrgate/config.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mrgate").join("config.toml"))
    }

    #[must_use]
    pub fn with_user_config_path(mut self, path: PathBuf) -> Self {
        self.user_config_path = Some(path);
        self
    }

    /// Skip the user level entirely.
    #[must_use]
    pub fn without_user_config(mut self) -> Self {
        self.user_config_path = None;
        self
    }

    /// Merge `path` last. The file must exist.
    #[must_use]
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    #[must_use]
    pub fn user_config_path(&self) -> Option<&PathBuf> {
        self.user_config_path.as_ref()
    }

    /// Load the merged configuration for `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a file cannot be parsed or the
    /// explicit file is missing.
    pub fn load(&self, project_dir: &Path) -> Result<GateConfig> {
        let (config, chain) = self.load_with_chain(project_dir)?;
        debug!("{}", chain.describe());
        Ok(config)
    }

    /// Load the merged configuration and report which files took part.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a file cannot be parsed or the
    /// explicit file is missing.
    pub fn load_with_chain(&self, project_dir: &Path) -> Result<(GateConfig, InheritanceChain)> {
        let mut chain = InheritanceChain::new();
        let mut merged = toml::Value::Table(toml::Table::new());

        if let Some(ref user_path) = self.user_config_path {
            let loaded = load_and_merge(&mut merged, user_path)?;
            chain.add_source(ConfigLevel::User, user_path.clone(), loaded);
        }

        let project_path = GateConfig::project_path(project_dir);
        let loaded = load_and_merge(&mut merged, &project_path)?;
        chain.add_source(ConfigLevel::Project, project_path, loaded);

        if let Some(ref explicit) = self.explicit_path {
            if !explicit.exists() {
                return Err(GateError::config_with_path(
                    format!("Config file not found: {}", explicit.display()),
                    explicit.clone(),
                ));
            }
            load_and_merge(&mut merged, explicit)?;
            chain.add_source(ConfigLevel::Explicit, explicit.clone(), true);
        }

        let config: GateConfig = merged.try_into().map_err(|e: toml::de::Error| {
            let path = chain
                .sources
                .iter()
                .rev()
                .find(|s| s.loaded)
                .map(|s| s.path.clone())
                .unwrap_or_else(|| project_dir.to_path_buf());
            GateError::config_with_path(format!("Invalid configuration: {}", e.message()), path)
        })?;

        Ok((config, chain))
    }
}

/// Merge the file at `path` into `accumulated`. Returns whether it existed.
fn load_and_merge(accumulated: &mut toml::Value, path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        GateError::config_with_path(format!("Failed to read {}: {}", path.display(), e), path.to_path_buf())
    })?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| {
        GateError::config_with_path(
            format!("Failed to parse {}: {}", path.display(), e.message()),
            path.to_path_buf(),
        )
    })?;

    deep_merge(accumulated, toml::Value::Table(table));
    Ok(true)
}

fn deep_merge(parent: &mut toml::Value, child: toml::Value) {
    match (parent, child) {
        (toml::Value::Table(parent_map), toml::Value::Table(child_map)) => {
            for (key, child_value) in child_map {
                match parent_map.get_mut(&key) {
                    Some(parent_value) => deep_merge(parent_value, child_value),
                    None => {
                        parent_map.insert(key, child_value);
                    }
                }
            }
        }
        (parent, child) => {
            *parent = child;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
