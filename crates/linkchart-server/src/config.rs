use linkchart_core::{EngineConfig, LayoutConfig, ResolutionConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// `[server]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 9191)),
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Contents of `linkchart.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkchartConfig {
    pub server: ServerConfig,
    pub resolution: ResolutionConfig,
    pub layout: LayoutConfig,
}

impl LinkchartConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or fall back to defaults if it is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.server.data_dir = dir;
        }
        self
    }

    /// Every problem found, as human-readable messages. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.server.data_dir.as_os_str().is_empty() {
            errors.push("[server] data_dir must not be empty".to_string());
        }
        if let Err(e) = self.resolution.validate() {
            errors.push(format!("[resolution] {}", e));
        }
        if let Err(e) = self.layout.validate() {
            errors.push(format!("[layout] {}", e));
        }
        errors
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.server.http_addr
    }

    pub fn db_path(&self) -> PathBuf {
        self.server.data_dir.join("linkchart.redb")
    }

    /// Report archive file read by the server.
    pub fn reports_path(&self) -> PathBuf {
        self.server.data_dir.join("reports.json")
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            resolution: self.resolution.clone(),
            layout: self.layout.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("linkchart.toml");
        std::fs::write(
            &path,
            "[server]\ndata_dir = \"/var/lib/linkchart\"\n\n[resolution]\nmax_universe = 200\n",
        )
        .unwrap();

        let config = LinkchartConfig::load(&path).unwrap();
        assert_eq!(config.server.data_dir, PathBuf::from("/var/lib/linkchart"));
        assert_eq!(config.server.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.resolution.max_universe, 200);
        assert_eq!(config.resolution.jaccard_threshold, 0.60);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_every_section() {
        let mut config = LinkchartConfig::default();
        config.resolution.max_universe = 0;
        config.layout.width = 0.0;

        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("[resolution]"));
        assert!(errors[1].starts_with("[layout]"));
    }

    #[test]
    fn test_missing_or_broken_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(LinkchartConfig::load(&missing).is_err());
        assert_eq!(LinkchartConfig::load_or_default(&missing).layout, LayoutConfig::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[server\n").unwrap();
        assert!(matches!(
            LinkchartConfig::load(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_data_dir_override() {
        let config = LinkchartConfig::default().with_data_dir(Some(PathBuf::from("/tmp/lc")));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/lc/linkchart.redb"));
        assert_eq!(config.reports_path(), PathBuf::from("/tmp/lc/reports.json"));
    }
}
