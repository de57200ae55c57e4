use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub anti_cheat: AntiCheatConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    #[serde(default = "default_peer_timeout")]
    pub peer_timeout: i64,
}

/// Site settings consumed on the announce hot path.
///
/// The orchestrator takes one snapshot of these at the top of each request
/// so every check within the request sees a consistent configuration; a
/// reload swaps the whole snapshot atomically.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSettings {
    #[serde(default = "default_announce_interval")]
    pub announce_interval_secs: i64,
    #[serde(default = "default_min_announce_interval")]
    pub min_announce_interval_secs: i64,
    #[serde(default = "default_enforced_min_interval")]
    pub enforced_min_announce_interval_secs: i64,
    #[serde(default)]
    pub global_freeleech: bool,
    #[serde(default = "default_numwant")]
    pub default_numwant: u32,
    #[serde(default = "default_max_numwant")]
    pub max_numwant: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AntiCheatConfig {
    #[serde(default = "default_max_upload_speed_kibps")]
    pub max_upload_speed_kibps: f64,
    #[serde(default = "default_min_speed_check_interval")]
    pub min_speed_check_interval_secs: i64,
    #[serde(default)]
    pub multi_location_enabled: bool,
    #[serde(default = "default_multi_location_window")]
    pub multi_location_window_minutes: i64,
    #[serde(default = "default_multi_location_threshold")]
    pub multi_location_threshold: usize,
    #[serde(default)]
    pub multi_location_hard_reject: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub data_endpoint: String,
    pub api_key: String,
    /// How often the peer/counter snapshot is pushed to the backend
    #[serde(default = "default_push_interval")]
    pub push_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    /// Banned client peer-id prefixes, e.g. "-XL0012-"
    #[serde(default)]
    pub banned_peer_prefixes: Vec<String>,
    /// Banned User-Agent substrings
    #[serde(default)]
    pub banned_user_agents: Vec<String>,
}

// Default value functions

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_peer_timeout() -> i64 {
    3600 // 1 hour
}

fn default_announce_interval() -> i64 {
    1800
}

fn default_min_announce_interval() -> i64 {
    900
}

fn default_enforced_min_interval() -> i64 {
    60
}

fn default_numwant() -> u32 {
    50
}

fn default_max_numwant() -> u32 {
    200
}

fn default_max_upload_speed_kibps() -> f64 {
    102_400.0 // 100 MiB/s
}

fn default_min_speed_check_interval() -> i64 {
    10
}

fn default_multi_location_window() -> i64 {
    60
}

fn default_multi_location_threshold() -> usize {
    3
}

fn default_push_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for AntiCheatConfig {
    fn default() -> Self {
        Self {
            max_upload_speed_kibps: default_max_upload_speed_kibps(),
            min_speed_check_interval_secs: default_min_speed_check_interval(),
            multi_location_enabled: false,
            multi_location_window_minutes: default_multi_location_window(),
            multi_location_threshold: default_multi_location_threshold(),
            multi_location_hard_reject: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config =
            toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.server.cleanup_interval == 0 {
            bail!("cleanup_interval must be greater than 0");
        }

        if self.server.peer_timeout <= self.server.cleanup_interval as i64 {
            bail!(
                "peer_timeout ({}) must be greater than cleanup_interval ({})",
                self.server.peer_timeout,
                self.server.cleanup_interval
            );
        }

        if self.tracker.announce_interval_secs <= 0 {
            bail!("announce_interval_secs must be greater than 0");
        }

        if self.tracker.min_announce_interval_secs <= 0
            || self.tracker.min_announce_interval_secs > self.tracker.announce_interval_secs
        {
            bail!("min_announce_interval_secs must be in (0, announce_interval_secs]");
        }

        if self.tracker.enforced_min_announce_interval_secs < 0
            || self.tracker.enforced_min_announce_interval_secs
                > self.tracker.min_announce_interval_secs
        {
            bail!("enforced_min_announce_interval_secs must be in [0, min_announce_interval_secs]");
        }

        if self.tracker.default_numwant == 0 {
            bail!("default_numwant must be greater than 0");
        }

        if self.tracker.max_numwant < self.tracker.default_numwant {
            bail!("max_numwant must be at least default_numwant");
        }

        if self.anti_cheat.max_upload_speed_kibps <= 0.0 {
            bail!("max_upload_speed_kibps must be greater than 0");
        }

        if self.anti_cheat.min_speed_check_interval_secs <= 0 {
            bail!("min_speed_check_interval_secs must be greater than 0");
        }

        if self.anti_cheat.multi_location_window_minutes <= 0 {
            bail!("multi_location_window_minutes must be greater than 0");
        }

        if self.anti_cheat.multi_location_threshold < 2 {
            bail!("multi_location_threshold must be at least 2");
        }

        if self.sync.data_endpoint.is_empty() {
            bail!("data_endpoint must not be empty");
        }

        if self.sync.api_key.is_empty() {
            bail!("api_key must not be empty");
        }

        if self.sync.push_interval_secs == 0 {
            bail!("push_interval_secs must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(body.as_bytes()).expect("write config");
        file
    }

    const MINIMAL: &str = r#"
[server]
port = 6969

[tracker]

[sync]
data_endpoint = "http://localhost:8000/api"
api_key = "test-key"

[logging]
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let file = write_config(MINIMAL);
        let config = Config::from_file(file.path()).expect("load config");

        assert_eq!(config.tracker.announce_interval_secs, 1800);
        assert_eq!(config.tracker.min_announce_interval_secs, 900);
        assert_eq!(config.tracker.enforced_min_announce_interval_secs, 60);
        assert_eq!(config.tracker.default_numwant, 50);
        assert_eq!(config.tracker.max_numwant, 200);
        assert!(!config.tracker.global_freeleech);
        assert!(!config.anti_cheat.multi_location_enabled);
        assert!(!config.anti_cheat.multi_location_hard_reject);
        assert_eq!(config.anti_cheat.multi_location_threshold, 3);
        assert!(config.security.banned_peer_prefixes.is_empty());
    }

    #[test]
    fn test_missing_listener_rejected() {
        let file = write_config(
            r#"
[server]

[tracker]

[sync]
data_endpoint = "http://localhost:8000/api"
api_key = "k"

[logging]
"#,
        );
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_interval_ordering_enforced() {
        let file = write_config(
            r#"
[server]
port = 6969

[tracker]
announce_interval_secs = 600
min_announce_interval_secs = 900

[sync]
data_endpoint = "http://localhost:8000/api"
api_key = "k"

[logging]
"#,
        );
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let file = write_config(
            r#"
[server]
port = 6969

[tracker]

[sync]
data_endpoint = "http://localhost:8000/api"
api_key = "k"

[logging]
level = "verbose"
"#,
        );
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_security_section_parsed() {
        let file = write_config(
            r#"
[server]
port = 6969

[tracker]
global_freeleech = true

[sync]
data_endpoint = "http://localhost:8000/api"
api_key = "k"

[logging]

[security]
banned_peer_prefixes = ["-XL0012-", "-SD0100-"]
banned_user_agents = ["FakeTorrent"]
"#,
        );
        let config = Config::from_file(file.path()).expect("load config");
        assert!(config.tracker.global_freeleech);
        assert_eq!(config.security.banned_peer_prefixes.len(), 2);
        assert_eq!(config.security.banned_user_agents, vec!["FakeTorrent"]);
    }
}
