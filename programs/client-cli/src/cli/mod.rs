//! The command line interface and its configuration.

pub mod cmd;
pub mod config;

pub use cmd::{ClientCli, Commands, GlobalArgs};
pub use config::{CliConfig, ConfigError};
