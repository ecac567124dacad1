//! Agent descriptors
//!
//! An agent is a remote worker process identified by a unique string id.
//! Agents are created and destroyed by the deployment; the coordinator only
//! observes their messages.
//!
//! Ids starting with an underscore are private sentinels used for internal
//! bookkeeping (for example the clean-up operation or the channel heartbeat).
//! They never correspond to real workers and are left out of loss warnings.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prefix marking an internal, non-worker agent id.
pub const PRIVATE_ID_PREFIX: char = '_';

/// Returns `true` if the id belongs to an internal sentinel agent.
pub fn is_private_id(agent_id: &str) -> bool {
    agent_id.starts_with(PRIVATE_ID_PREFIX)
}

/// Role of an agent within a test pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Drives the test against its paired slave
    Master,
    /// Passive endpoint of a master
    Slave,
    /// Runs tests on its own (no pairing)
    #[default]
    Alone,
}

impl AgentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentMode::Master => "master",
            AgentMode::Slave => "slave",
            AgentMode::Alone => "alone",
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "master" => Ok(AgentMode::Master),
            "slave" => Ok(AgentMode::Slave),
            "alone" => Ok(AgentMode::Alone),
            other => Err(DomainError::UnknownAgentMode(other.to_string())),
        }
    }
}

/// A deployed worker as reported by the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub mode: AgentMode,
    /// Address other agents use to reach this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
}

impl Agent {
    pub fn new(id: impl Into<String>, mode: AgentMode) -> Self {
        Self {
            id: id.into(),
            mode,
            ip: None,
            slave_id: None,
            master_id: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_slave(mut self, slave_id: impl Into<String>) -> Self {
        self.slave_id = Some(slave_id.into());
        self
    }

    pub fn with_master(mut self, master_id: impl Into<String>) -> Self {
        self.master_id = Some(master_id.into());
        self
    }

    /// Agents that initiate test traffic (masters and standalone agents).
    pub fn is_selectable(&self) -> bool {
        matches!(self.mode, AgentMode::Master | AgentMode::Alone)
    }

    /// Validate the descriptor.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidAgent("agent id cannot be empty".into()));
        }
        if is_private_id(&self.id) {
            return Err(DomainError::InvalidAgent(format!(
                "agent id '{}' uses the reserved '{}' prefix",
                self.id, PRIVATE_ID_PREFIX
            )));
        }
        if self.mode == AgentMode::Master && self.slave_id.is_none() {
            return Err(DomainError::InvalidAgent(format!(
                "master agent '{}' has no slave_id",
                self.id
            )));
        }
        Ok(())
    }
}
