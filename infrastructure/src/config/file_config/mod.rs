//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Fleet and test descriptors deserialize straight into domain types.

mod output;
mod quorum;
mod server;

pub use output::{FileOutputConfig, FileOutputFormat};
pub use quorum::FileQuorumConfig;
pub use server::FileServerConfig;

use benchfleet_domain::{Agent, DomainError, TestDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("quorum.polling_interval cannot be 0")]
    ZeroPollingInterval,

    #[error("server.bind is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("duplicate agent id: {0}")]
    DuplicateAgent(String),

    #[error("agents: {0}")]
    InvalidAgent(DomainError),

    #[error("tests: {0}")]
    InvalidTest(DomainError),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Coordinator timing
    pub quorum: FileQuorumConfig,
    /// Coordinator listener
    pub server: FileServerConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Static fleet (`[[agents]]`)
    pub agents: Vec<Agent>,
    /// Tests to run, in order (`[[tests]]`)
    pub tests: Vec<TestDefinition>,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.quorum.polling_interval == 0 {
            return Err(ConfigValidationError::ZeroPollingInterval);
        }

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigValidationError::InvalidBind(self.server.bind.clone()));
        }

        let mut seen = BTreeSet::new();
        for agent in &self.agents {
            agent
                .validate()
                .map_err(ConfigValidationError::InvalidAgent)?;
            if !seen.insert(agent.id.as_str()) {
                return Err(ConfigValidationError::DuplicateAgent(agent.id.clone()));
            }
        }

        for test in &self.tests {
            test.validate().map_err(ConfigValidationError::InvalidTest)?;
        }

        Ok(())
    }
}
