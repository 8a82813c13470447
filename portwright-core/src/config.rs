//! Registry configuration.
//!
//! # Lookup order
//!
//! 1. `<registry>/portwright.yaml`
//! 2. `<config_dir>/portwright/config.yaml` (per-user defaults)
//! 3. built-in defaults
//!
//! # API pattern
//!
//! - `load_at(registry, config_home)` — explicit user config directory; used
//!   in tests with `TempDir`
//! - `load(registry)` — derives the user directory from `dirs::config_dir()`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, RegistryError};

pub const REGISTRY_CONFIG_FILE: &str = "portwright.yaml";
pub const USER_CONFIG_DIR: &str = "portwright";
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Registry URL shown when the registry has no remote configured.
pub const PLACEHOLDER_URL: &str = "https://github.com/my-username/my-vcpkg-registry";

/// Settings that shape generated artifacts and external calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Git remote whose URL identifies the registry.
    pub remote: String,
    /// Source host for archives and manifest homepages.
    pub host: String,
    /// `HEAD_REF` used when none is given on the command line.
    pub default_branch: String,
    /// Environment variable consulted for the archive download token.
    pub token_env: String,
    /// Directory (relative to the registry root) holding template overrides.
    pub template_dir: Option<PathBuf>,
    pub placeholder_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            host: "github.com".to_string(),
            default_branch: "main".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            template_dir: None,
            placeholder_url: PLACEHOLDER_URL.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Absolute template override directory, if configured.
    pub fn template_dir_in(&self, registry: &Path) -> Option<PathBuf> {
        self.template_dir.as_ref().map(|dir| registry.join(dir))
    }

    /// Token from the configured environment variable, if set and non-empty.
    pub fn env_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}

/// Load configuration for `registry`, consulting `config_home` for per-user
/// defaults.
pub fn load_at(registry: &Path, config_home: Option<&Path>) -> Result<RegistryConfig, RegistryError> {
    let registry_file = registry.join(REGISTRY_CONFIG_FILE);
    if registry_file.exists() {
        return parse(&registry_file);
    }
    if let Some(home) = config_home {
        let user_file = home.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
        if user_file.exists() {
            return parse(&user_file);
        }
    }
    Ok(RegistryConfig::default())
}

/// `load_at` convenience wrapper.
pub fn load(registry: &Path) -> Result<RegistryConfig, RegistryError> {
    load_at(registry, dirs::config_dir().as_deref())
}

fn parse(path: &Path) -> Result<RegistryConfig, RegistryError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(RegistryConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| RegistryError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_nothing_configured() {
        let registry = TempDir::new().unwrap();
        let config = load_at(registry.path(), None).unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.remote, "origin");
        assert_eq!(config.default_branch, "main");
    }

    #[test]
    fn registry_file_overrides_defaults_partially() {
        let registry = TempDir::new().unwrap();
        std::fs::write(
            registry.path().join(REGISTRY_CONFIG_FILE),
            "host: gitlab.example.com\ndefault_branch: trunk\n",
        )
        .unwrap();
        let config = load_at(registry.path(), None).unwrap();
        assert_eq!(config.host, "gitlab.example.com");
        assert_eq!(config.default_branch, "trunk");
        assert_eq!(config.remote, "origin");
    }

    #[test]
    fn user_file_used_when_registry_has_none() {
        let registry = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let dir = home.path().join(USER_CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(USER_CONFIG_FILE), "remote: upstream\n").unwrap();
        let config = load_at(registry.path(), Some(home.path())).unwrap();
        assert_eq!(config.remote, "upstream");
    }

    #[test]
    fn registry_file_wins_over_user_file() {
        let registry = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let dir = home.path().join(USER_CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(USER_CONFIG_FILE), "remote: upstream\n").unwrap();
        std::fs::write(registry.path().join(REGISTRY_CONFIG_FILE), "remote: mine\n").unwrap();
        let config = load_at(registry.path(), Some(home.path())).unwrap();
        assert_eq!(config.remote, "mine");
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let registry = TempDir::new().unwrap();
        std::fs::write(registry.path().join(REGISTRY_CONFIG_FILE), "remote: [unclosed").unwrap();
        let err = load_at(registry.path(), None).unwrap_err();
        assert!(matches!(err, RegistryError::ConfigParse { .. }));
        assert!(err.to_string().contains(REGISTRY_CONFIG_FILE));
    }

    #[test]
    fn template_dir_is_relative_to_registry() {
        let config = RegistryConfig {
            template_dir: Some(PathBuf::from("templates")),
            ..RegistryConfig::default()
        };
        assert_eq!(
            config.template_dir_in(Path::new("/reg")),
            Some(PathBuf::from("/reg/templates"))
        );
    }
}
