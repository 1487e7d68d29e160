use crate::manifest::AssetManifest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
///
/// Loaded from a TOML file in the platform config directory; missing file
/// just means defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub site: SiteConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from the default location or fall back to defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Get the config file path
    /// Uses XDG on Linux/macOS, AppData on Windows
    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("offsite");

        Ok(config_dir.join("config.toml"))
    }
}

/// Everything about the site the worker serves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin the worker fronts, e.g. https://business-consulting.example
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Short site identifier baked into store names
    #[serde(default = "default_slug")]
    pub slug: String,

    /// Site version; bumping it triggers a fresh install and a GC of
    /// every older store on activation
    #[serde(default = "default_version")]
    pub version: String,

    /// Served instead of a document the network can't deliver
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Served instead of an image the network can't deliver
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    #[serde(default)]
    pub assets: AssetManifest,
}

impl SiteConfig {
    /// Store name for the configured version
    pub fn store_name(&self) -> String {
        format!("{}-v{}", self.slug, self.version)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            slug: default_slug(),
            version: default_version(),
            offline_page: default_offline_page(),
            placeholder_image: default_placeholder_image(),
            assets: AssetManifest::default(),
        }
    }
}

fn default_origin() -> String {
    "https://business-consulting.example".to_string()
}

fn default_slug() -> String {
    "business-consulting".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_offline_page() -> String {
    "/offline.html".to_string()
}

fn default_placeholder_image() -> String {
    "/images/placeholder.svg".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Where the SQLite database lives
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offsite")
        .join("cache.db")
        .to_string_lossy()
        .to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_name_embeds_slug_and_version() {
        let config = Config::default();
        assert_eq!(config.site.store_name(), "business-consulting-v1.0.0");
    }

    #[test]
    fn test_version_bump_changes_the_store_name() {
        let mut site = SiteConfig::default();
        site.version = "1.1.0".to_string();
        assert_eq!(site.store_name(), "business-consulting-v1.1.0");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("business-consulting"));
        assert!(toml.contains("offline.html"));
        assert!(toml.contains("db_path"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let parsed: Config = toml::from_str(&toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(parsed.site.store_name(), config.site.store_name());
        assert_eq!(parsed.site.assets.core.len(), config.site.assets.core.len());
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let parsed: Config = toml::from_str(
            "[site]\nversion = \"2.0.0\"\n\n[cache]\ndb_path = \"/tmp/test.db\"\n",
        )
        .unwrap();
        assert_eq!(parsed.site.store_name(), "business-consulting-v2.0.0");
        assert_eq!(parsed.site.offline_page, "/offline.html");
        assert!(!parsed.site.assets.core.is_empty());
    }
}
