use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for reno
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub sanitizer: SanitizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// SQLite file; the platform data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default = "default_messages_per_minute")]
    pub messages_per_minute: usize,

    #[serde(default = "default_messages_per_five_minutes")]
    pub messages_per_five_minutes: usize,

    #[serde(default = "default_max_proposed_slots")]
    pub max_proposed_slots: usize,
}

/// Terms added on top of the built-in lexicons
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SanitizerConfig {
    #[serde(default)]
    pub extra_keywords: Vec<String>,

    #[serde(default)]
    pub extra_names: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            messages_per_minute: default_messages_per_minute(),
            messages_per_five_minutes: default_messages_per_five_minutes(),
            max_proposed_slots: default_max_proposed_slots(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8370
}

fn default_max_message_chars() -> usize {
    1000
}

fn default_messages_per_minute() -> usize {
    5
}

fn default_messages_per_five_minutes() -> usize {
    20
}

fn default_max_proposed_slots() -> usize {
    5
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("nl", "reno", "reno") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.reno/config.toml")
        }
    }
}
