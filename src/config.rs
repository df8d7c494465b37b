//! Client configuration: where the backend lives and how often we poll it.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use log::{info, warn};
use serde::Deserialize;

/// Default location on disk where the client looks for its JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/client.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "KSOT_CLIENT_CONFIG_PATH";
/// Environment variable that overrides the REST base URL.
const API_URL_ENV: &str = "KSOT_API_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL every REST path is appended to.
    pub api_base_url: String,
    /// Websocket endpoint of the channel service.
    pub push_url: String,
    /// Where the bearer token and cached profile are persisted.
    pub token_cache_path: PathBuf,
    pub lobby_poll_interval_ms: u64,
    pub game_poll_interval_ms: u64,
    pub notifications_enabled: bool,
    /// Seconds pre-selected in the create wizard.
    pub default_time_per_question: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_owned(),
            push_url: "ws://localhost:6001/app/ksot".to_owned(),
            token_cache_path: PathBuf::from(".ksot/auth.json"),
            lobby_poll_interval_ms: 2000,
            game_poll_interval_ms: 1000,
            notifications_enabled: true,
            default_time_per_question: 20,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded client config from {}", path.display());
                    config
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {}: {}; falling back to defaults",
                        path.display(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No config at {}; using built-in defaults", path.display());
                Self::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {}: {}; falling back to defaults",
                    path.display(),
                    err
                );
                Self::default()
            }
        };

        if let Some(url) = env::var(API_URL_ENV).ok().filter(|url| !url.is_empty()) {
            info!("API base URL overridden by {}", API_URL_ENV);
            config.api_base_url = url;
        }
        config
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn lobby_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lobby_poll_interval_ms.max(1))
    }

    pub fn game_poll_interval(&self) -> Duration {
        Duration::from_millis(self.game_poll_interval_ms.max(1))
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
