// SPDX-License-Identifier: AGPL-3.0-or-later
//! Navigator configuration
//!
//! Read from TOML, by default `config.toml` in the platform config directory:
//!
//! ```toml
//! cache_ids = false
//!
//! [gdrive]
//! client_id = "1234.apps.googleusercontent.com"
//! redirect_port = 8080
//! ```

use dpn_core::{DpnError, DpnResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[cfg(feature = "gdrive")]
use dpn_providers::GoogleDriveConfig;

const CONFIG_FILE: &str = "config.toml";
#[cfg(feature = "gdrive")]
const TOKEN_FILE: &str = "tokens.json";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "hyperpolymath", "drive-path-navigator")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Cache (parent, title) → id lookups between calls
    #[serde(default)]
    pub cache_ids: bool,

    #[cfg(feature = "gdrive")]
    #[serde(default)]
    pub gdrive: Option<GoogleDriveConfig>,
}

impl NavigatorConfig {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
    }

    pub fn parse(raw: &str) -> DpnResult<Self> {
        toml::from_str(raw).map_err(|e| DpnError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> DpnResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DpnError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&raw)?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config.with_default_token_file())
    }

    /// Load the default file, falling back to defaults when it is absent
    pub fn load_default() -> DpnResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default().with_default_token_file()),
        }
    }

    pub fn to_toml(&self) -> DpnResult<String> {
        toml::to_string_pretty(self).map_err(|e| DpnError::Config(e.to_string()))
    }

    #[cfg(feature = "gdrive")]
    fn with_default_token_file(mut self) -> Self {
        if let Some(ref mut gdrive) = self.gdrive {
            if gdrive.token_file.is_none() {
                gdrive.token_file = project_dirs().map(|d| d.data_dir().join(TOKEN_FILE));
            }
        }
        self
    }

    #[cfg(not(feature = "gdrive"))]
    fn with_default_token_file(self) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavigatorConfig::parse("").unwrap();
        assert!(!config.cache_ids);
    }

    #[test]
    fn test_parse_cache_flag() {
        let config = NavigatorConfig::parse("cache_ids = true").unwrap();
        assert!(config.cache_ids);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = NavigatorConfig::parse("cache_ids = \"maybe\"").unwrap_err();
        assert!(matches!(err, DpnError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache_ids = true\n").unwrap();

        let config = NavigatorConfig::load(&path).unwrap();
        assert!(config.cache_ids);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NavigatorConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, DpnError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = NavigatorConfig { cache_ids: true, ..Default::default() };
        let raw = config.to_toml().unwrap();
        assert!(NavigatorConfig::parse(&raw).unwrap().cache_ids);
    }

    #[cfg(feature = "gdrive")]
    #[test]
    fn test_gdrive_section() {
        let config = NavigatorConfig::parse(
            "[gdrive]\nclient_id = \"abc\"\nredirect_port = 9000\n",
        )
        .unwrap();
        let gdrive = config.gdrive.unwrap();
        assert_eq!(gdrive.client_id, "abc");
        assert_eq!(gdrive.redirect_port, 9000);
    }
}
