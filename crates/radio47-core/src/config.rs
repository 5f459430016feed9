use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Stream endpoints the station publishes. The daemon never plays these
/// itself; it resolves which one a client player should consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub url: String,
    /// Alternate audio stream tried once when the primary fails to answer.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    /// Video simulcast page, passed through to clients untouched.
    #[serde(default = "default_video_url")]
    pub video_url: String,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

/// Where the broadcast schedule comes from. When the file is missing or
/// malformed the built-in lineup is used instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_schedule_toml")]
    pub schedule_toml: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            fallback_url: default_fallback_url(),
            video_url: default_video_url(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            schedule_toml: default_schedule_toml(),
        }
    }
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8947
}

fn default_stream_url() -> String {
    "https://streaming.shoutcast.com/radio-47".to_string()
}

fn default_fallback_url() -> String {
    "https://radio47.radioca.st/stream".to_string()
}

fn default_video_url() -> String {
    "https://player.restream.io/?token=85a050dea0e3494d97933e93ec53aeb7".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_schedule_toml() -> PathBuf {
    platform::config_dir().join("schedule.toml")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8947);
        assert_eq!(config.http.bind_address, "127.0.0.1");
        assert!(config.stream.url.starts_with("https://"));
        assert!(config.stream.fallback_url.contains("radio47"));
        assert!(config.schedule.schedule_toml.ends_with("radio47/schedule.toml"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [http]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.http.port, 9000);
        assert!(config.http.enabled);
        assert_eq!(config.stream.url, default_stream_url());
    }
}
