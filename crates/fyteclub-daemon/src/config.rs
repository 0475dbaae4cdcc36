//! Daemon configuration (§2.1/§6).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FyteclubConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Network-facing settings. The daemon's own transport is external per the
/// component's contract; these are defaults handed to that substrate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// 0 = OS-assigned ephemeral port.
    #[serde(default)]
    pub listen_port: u16,
    #[serde(default = "default_bootstrap_nodes")]
    pub bootstrap_nodes: Vec<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Profile data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Content store capacity in bytes, before LRU eviction kicks in.
    #[serde(default = "default_store_capacity_bytes")]
    pub store_capacity_bytes: u64,
}

/// Local-identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Log level for the `tracing` `EnvFilter` fallback directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bootstrap_nodes() -> Vec<String> {
    Vec::new()
}

fn default_max_connections() -> u32 {
    256
}

fn default_store_capacity_bytes() -> u64 {
    fyteclub_types::DEFAULT_STORE_CAPACITY_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_port: 0,
            bootstrap_nodes: default_bootstrap_nodes(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            store_capacity_bytes: default_store_capacity_bytes(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl FyteclubConfig {
    /// Load configuration from the default config file location, falling
    /// back to defaults if it does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-conventional data directory, overridable via `FYTECLUB_DATA_DIR`.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("FYTECLUB_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            home_subpath("Library/Application Support/FyteClub")
        }
        #[cfg(target_os = "windows")]
        {
            home_subpath("FyteClub")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            home_subpath(".fyteclub")
        }
    }
}

fn home_subpath(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/fyteclub"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FyteclubConfig::default();
        assert_eq!(config.network.listen_port, 0);
        assert_eq!(config.network.max_connections, 256);
        assert_eq!(config.identity.log_level, "info");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = FyteclubConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed: FyteclubConfig = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.storage.store_capacity_bytes, config.storage.store_capacity_bytes);
    }

    #[test]
    fn test_data_dir_env_override() {
        std::env::set_var("FYTECLUB_DATA_DIR", "/tmp/fyteclub-test-profile");
        let config = FyteclubConfig::default();
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/fyteclub-test-profile"));
        std::env::remove_var("FYTECLUB_DATA_DIR");
    }
}
