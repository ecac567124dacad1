//! Configuration file loading for benchfleet
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./benchfleet.toml` or `./.benchfleet.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/benchfleet/config.toml`
//! 4. Fallback: `~/.config/benchfleet/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat, FileQuorumConfig,
    FileServerConfig,
};
pub use loader::ConfigLoader;
