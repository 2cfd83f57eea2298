//! Defines the configuration file of `ibc-client`.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;
use tracing::Level;

use crate::cli::GlobalArgs;

/// Genesis file used when neither the configuration nor the flags name one.
pub const DEFAULT_GENESIS_FILE: &str = "genesis.json";
/// Host chain id used when neither the configuration nor the flags name one.
pub const DEFAULT_HOST_CHAIN_ID: &str = "ibc-host-1";

/// The configuration of the command line interface.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// The log level.
    pub log_level: String,
    /// Chain id of the host.
    pub host_chain_id: String,
    /// Genesis file holding the client store.
    pub genesis_file: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO.to_string(),
            host_chain_id: DEFAULT_HOST_CHAIN_ID.to_string(),
            genesis_file: PathBuf::from(DEFAULT_GENESIS_FILE),
        }
    }
}

/// Errors that can occur loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    /// The file is not a valid configuration.
    #[error("invalid JSON in config: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliConfig {
    /// Loads a configuration from a JSON file; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::Io(path_ref.display().to_string(), e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The configuration file named by `args`, or the defaults, with the flags of `args`
    /// applied on top.
    ///
    /// # Errors
    /// Returns an error if the configuration file cannot be loaded.
    pub fn resolve(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(log_level) = &args.log_level {
            config.log_level.clone_from(log_level);
        }
        if let Some(host_chain_id) = &args.host_chain_id {
            config.host_chain_id.clone_from(host_chain_id);
        }
        if let Some(genesis_file) = &args.genesis {
            config.genesis_file.clone_from(genesis_file);
        }
        Ok(config)
    }

    /// Returns the log level, `INFO` if it does not parse.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file = write_config(r#"{ "log_level": "debug" }"#);
        let config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level(), Level::DEBUG);
        assert_eq!(config.host_chain_id, DEFAULT_HOST_CHAIN_ID);
        assert_eq!(config.genesis_file, PathBuf::from(DEFAULT_GENESIS_FILE));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = CliConfig {
            log_level: "chatty".to_string(),
            ..CliConfig::default()
        };
        assert_eq!(config.log_level(), Level::INFO);
    }

    #[test]
    fn flags_override_file() {
        let file = write_config(
            r#"{ "log_level": "warn", "host_chain_id": "host-7", "genesis_file": "a.json" }"#,
        );
        let args = GlobalArgs {
            config: Some(file.path().to_path_buf()),
            genesis: Some(PathBuf::from("b.json")),
            ..GlobalArgs::default()
        };
        let config = CliConfig::resolve(&args).unwrap();
        assert_eq!(config.log_level(), Level::WARN);
        assert_eq!(config.host_chain_id, "host-7");
        assert_eq!(config.genesis_file, PathBuf::from("b.json"));
    }

    #[test]
    fn rejects_invalid_files() {
        assert!(matches!(
            CliConfig::from_file("/nonexistent/ibc-client.json"),
            Err(ConfigError::Io(..))
        ));
        let file = write_config("log_level = 'info'");
        assert!(matches!(
            CliConfig::from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
