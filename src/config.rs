//! Configuration for matchboard

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matchboard")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for the SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Bind address for the HTTP API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Default role granted when a request offers no roles
    #[serde(default = "default_fallback_role")]
    pub fallback_role: String,

    /// Default role for a project owner when none is chosen
    #[serde(default = "default_owner_role")]
    pub default_owner_role: String,
}

fn default_http_port() -> u16 {
    8085
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_fallback_role() -> String {
    "Member".to_string()
}

fn default_owner_role() -> String {
    "Leader".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            http_port: default_http_port(),
            bind_addr: default_bind_addr(),
            fallback_role: default_fallback_role(),
            default_owner_role: default_owner_role(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get database file path
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("matchboard.db")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http_port, 8085);
        assert_eq!(config.fallback_role, "Member");
        assert_eq!(config.default_owner_role, "Leader");
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.http_port = 9000;
        let path = dir.path().join("config.toml");
        config.save(&path).expect("save");
        let loaded = Config::load(&path).expect("load");
        assert_eq!(loaded.http_port, 9000);
    }
}
