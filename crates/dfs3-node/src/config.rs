use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// Full node configuration, loaded from an optional TOML file on disk and
/// then overridden field-by-field from `DFS3_*` environment variables —
/// the file supplies a baseline, the environment always wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            ledger: LedgerConfig::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub api_port: u16,
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_topic: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_port: 8443,
            mqtt_broker: "mqtt.dfs3.net".to_string(),
            mqtt_port: 1883,
            mqtt_topic: "dfs3/events".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub config_path: String,
    pub db_file: String,
    pub storage_dir: String,
    pub meta_dir: String,
    pub users_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = "data".to_string();
        Self {
            config_path: format!("{data_dir}/node.json"),
            db_file: format!("{data_dir}/dfs3.db"),
            storage_dir: format!("{data_dir}/.storage"),
            meta_dir: format!("{data_dir}/.meta"),
            users_dir: format!("{data_dir}/.users"),
            data_dir,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub iota_node_url: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            iota_node_url: "https://iota.dfs3.net/api/core/v2/blocks".to_string(),
        }
    }
}

/// Seed-node sync is opt-in: an empty `seed_node_url` means a brand new
/// node starts with only the events it observes from here on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub seed_node_url: Option<String>,
    pub update_status_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            seed_node_url: None,
            update_status_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbosity: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbosity: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Loads `path` as TOML if present, falling back to defaults, then
    /// applies any `DFS3_*` environment overrides on top.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            NodeConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DFS3_MQTT_BROKER") {
            self.network.mqtt_broker = v;
        }
        if let Ok(v) = std::env::var("DFS3_MQTT_PORT") {
            if let Ok(port) = v.parse() {
                self.network.mqtt_port = port;
            }
        }
        if let Ok(v) = std::env::var("DFS3_MQTT_TOPIC") {
            self.network.mqtt_topic = v;
        }
        if let Ok(v) = std::env::var("DFS3_API_PORT") {
            if let Ok(port) = v.parse() {
                self.network.api_port = port;
            }
        }
        if let Ok(v) = std::env::var("DFS3_DATA_DIR") {
            self.storage.data_dir = v;
        }
        if let Ok(v) = std::env::var("DFS3_CONFIG_PATH") {
            self.storage.config_path = v;
        }
        if let Ok(v) = std::env::var("DFS3_DB_FILE") {
            self.storage.db_file = v;
        }
        if let Ok(v) = std::env::var("DFS3_STORAGE_DIR") {
            self.storage.storage_dir = v;
        }
        if let Ok(v) = std::env::var("DFS3_META_DIR") {
            self.storage.meta_dir = v;
        }
        if let Ok(v) = std::env::var("DFS3_USERS_DIR") {
            self.storage.users_dir = v;
        }
        if let Ok(v) = std::env::var("DFS3_IOTA_NODE_URL") {
            self.ledger.iota_node_url = v;
        }
        if let Ok(v) = std::env::var("DFS3_SEED_NODE_URL") {
            self.sync.seed_node_url = Some(v);
        }
        if let Ok(v) = std::env::var("DFS3_UPDATE_STATUS_INTERVAL") {
            if let Ok(secs) = v.parse() {
                self.sync.update_status_interval_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("DFS3_VERBOSITY_LEVEL") {
            self.logging.verbosity = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.network.mqtt_broker, "mqtt.dfs3.net");
        assert_eq!(config.network.mqtt_port, 1883);
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.storage.db_file, "data/dfs3.db");
        assert!(config.sync.seed_node_url.is_none());
        assert_eq!(config.sync.update_status_interval_secs, 300);
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        let config = NodeConfig::load(&path).unwrap();
        assert_eq!(config.network.api_port, 8443);
    }

    #[test]
    fn load_parses_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        fs::write(&path, "[network]\napi_port = 9000\n").unwrap();
        let config = NodeConfig::load(&path).unwrap();
        assert_eq!(config.network.api_port, 9000);
        assert_eq!(config.network.mqtt_broker, "mqtt.dfs3.net");
    }
}
