use crate::error::ConfigError;
use crate::{client, logstream};
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service configuration, read from a TOML file.
///
/// ```toml
/// [server]
/// log_level = "info"
/// handlers = ["logfile", "headshots"]
///
/// [rcon]
/// host = "192.0.2.10"
/// password = "hunter2"
///
/// [log]
/// port = 1776
///
/// [handler.logfile]
/// filename = "stream.log"
///
/// [handler.headshots]
/// when_reset = "round"
/// count_bots = false
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub rcon: RconConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub handler: HandlerConfigs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
    /// Which log handlers to attach, by registry name. The default is none,
    /// which makes for a service that does nothing visible.
    pub handlers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RconConfig {
    pub host: String,
    #[serde(default = "default_rcon_port")]
    pub port: u16,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HandlerConfigs {
    pub logfile: Option<LogFileConfig>,
    pub headshots: Option<HeadshotConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogFileConfig {
    /// Where to write the log stream.
    pub filename: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeadshotConfig {
    pub when_reset: ResetPolicy,
    pub count_bots: bool,
}

/// When the headshot counter forgets what it has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    #[default]
    Never,
    Round,
    Map,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

impl ServerConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            log_level: "warn".to_owned(),
            handlers: Vec::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            port: logstream::DEFAULT_PORT,
        }
    }
}

fn default_rcon_port() -> u16 {
    client::DEFAULT_PORT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_configuration() {
        let config: Config = toml::from_str(
            r#"
            [server]
            log_level = "info"
            handlers = ["logfile", "headshots"]

            [rcon]
            host = "192.0.2.10"
            port = 27016
            password = "hunter2"

            [log]
            port = 15001

            [handler.logfile]
            filename = "stream.log"

            [handler.headshots]
            when_reset = "round"
            count_bots = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.handlers, ["logfile", "headshots"]);
        assert_eq!(config.server.level_filter().unwrap(), LevelFilter::Info);
        assert_eq!(config.rcon.host, "192.0.2.10");
        assert_eq!(config.rcon.port, 27016);
        assert_eq!(config.log.port, 15001);

        let headshots = config.handler.headshots.unwrap();
        assert_eq!(headshots.when_reset, ResetPolicy::Round);
        assert!(headshots.count_bots);
    }

    #[test]
    fn fills_in_the_defaults() {
        let config: Config = toml::from_str(
            r#"
            [rcon]
            host = "192.0.2.10"
            password = "hunter2"
            "#,
        )
        .unwrap();

        assert_eq!(config.rcon.port, 27015);
        assert_eq!(config.log.port, 1776);
        assert_eq!(config.server.level_filter().unwrap(), LevelFilter::Warn);
        assert!(config.server.handlers.is_empty());
        assert!(config.handler.logfile.is_none());

        let headshots = HeadshotConfig::default();
        assert_eq!(headshots.when_reset, ResetPolicy::Never);
        assert!(!headshots.count_bots);
    }

    #[test]
    fn rejects_an_unknown_reset_policy() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [rcon]
            host = "192.0.2.10"
            password = "hunter2"

            [handler.headshots]
            when_reset = "sometimes"
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn rejects_a_bogus_log_level() {
        let config = ServerConfig {
            log_level: "loud".to_owned(),
            handlers: Vec::new(),
        };

        assert!(matches!(
            config.level_filter(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
