use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::ThrottleConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const DEFAULT_API_URL: &str = "https://streamora-backend.onrender.com/api";
pub const API_URL_ENV: &str = "STREAM_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bootstrap_nodes: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// Port the relay node listens on. Chat clients always pick a free port.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_viewer_publish_secs")]
    pub viewer_publish_secs: u64,
    #[serde(default = "default_max_chat_messages")]
    pub max_chat_messages: usize,
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

fn default_api_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_display_name() -> String {
    "You".to_string()
}

fn default_listen_port() -> u16 {
    4001
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_viewer_publish_secs() -> u64 {
    5
}

fn default_max_chat_messages() -> usize {
    200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bootstrap_nodes: Vec::new(),
            api_base_url: default_api_base_url(),
            display_name: default_display_name(),
            listen_port: default_listen_port(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            viewer_publish_secs: default_viewer_publish_secs(),
            max_chat_messages: default_max_chat_messages(),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.max(100))
    }

    pub fn viewer_publish_interval(&self) -> Duration {
        Duration::from_secs(self.viewer_publish_secs.max(1))
    }

    /// `STREAM_API_URL` (possibly from `.env`) wins over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.api_base_url = url.to_string();
            }
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

/// Moves `entry` to the front of the bootstrap list and saves the file.
pub fn persist_bootstrap_node(path: &str, entry: &str) {
    let mut config = load_config(path);
    config.bootstrap_nodes.retain(|node| node != entry);
    config.bootstrap_nodes.insert(0, entry.to_string());

    if let Err(err) = save_config(path, &config) {
        log::error!("Failed to write config {}: {err}", path);
    } else {
        log::info!("Persisted bootstrap node {} to {}", entry, path);
    }
}
