//! Coordinator timing from TOML (`[quorum]` section)
//!
//! ```toml
//! [quorum]
//! polling_interval = 10     # seconds between agent polls
//! agent_loss_timeout = 60   # grace after the last message of a working agent
//! agent_join_timeout = 600  # extra grace while the fleet boots
//! ```

use benchfleet_application::QuorumParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[quorum]` section, all values in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQuorumConfig {
    pub polling_interval: u64,
    pub agent_loss_timeout: u64,
    pub agent_join_timeout: u64,
}

impl Default for FileQuorumConfig {
    fn default() -> Self {
        let params = QuorumParams::default();
        Self {
            polling_interval: params.polling_interval.as_secs(),
            agent_loss_timeout: params.agent_loss_timeout.as_secs(),
            agent_join_timeout: params.agent_join_timeout.as_secs(),
        }
    }
}

impl FileQuorumConfig {
    pub fn to_params(&self) -> QuorumParams {
        QuorumParams::default()
            .with_polling_interval(Duration::from_secs(self.polling_interval))
            .with_agent_loss_timeout(Duration::from_secs(self.agent_loss_timeout))
            .with_agent_join_timeout(Duration::from_secs(self.agent_join_timeout))
    }
}
