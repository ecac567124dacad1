//! Per-agent result records.
//!
//! A run produces one [`AgentRecord`] per active agent id, keyed in a
//! [`RunResult`]. Every record carries a terminal [`AgentStatus`] plus
//! operation-specific payload (stdout, samples, ...).

use crate::protocol::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of a single run: agent id → record.
pub type RunResult = BTreeMap<String, AgentRecord>;

/// Terminal state of an agent within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// The agent replied and its reply was processed successfully
    Ok,
    /// The agent replied but processing the reply failed
    Error,
    /// The agent's liveness deadline passed before it replied
    Lost,
    /// The agent was never observed before the run concluded
    Interrupted,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Ok => "ok",
            AgentStatus::Error => "error",
            AgentStatus::Lost => "lost",
            AgentStatus::Interrupted => "interrupted",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AgentStatus::Ok)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one agent in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Synchronized start time of the run (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<f64>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl AgentRecord {
    pub fn new(agent_id: impl Into<String>, status: AgentStatus) -> Self {
        Self {
            agent_id: agent_id.into(),
            status,
            info: None,
            schedule: None,
            payload: Payload::new(),
        }
    }

    pub fn ok(agent_id: impl Into<String>) -> Self {
        Self::new(agent_id, AgentStatus::Ok)
    }

    pub fn error(agent_id: impl Into<String>, info: impl Into<String>) -> Self {
        Self::new(agent_id, AgentStatus::Error).with_info(info)
    }

    pub fn lost(agent_id: impl Into<String>) -> Self {
        Self::new(agent_id, AgentStatus::Lost).with_info("Agent lost before reply")
    }

    pub fn interrupted(agent_id: impl Into<String>) -> Self {
        Self::new(agent_id, AgentStatus::Interrupted).with_info("Agent was never observed")
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Merge payload fields into the record.
    ///
    /// `status`, `info`, `agent_id` and `schedule` are owned by the record
    /// itself and are not overwritten by payload keys of the same name.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        for (key, value) in payload {
            match key.as_str() {
                "status" | "info" | "agent_id" | "schedule" => continue,
                _ => {
                    self.payload.insert(key, value);
                }
            }
        }
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_schedule(mut self, start_at: f64) -> Self {
        self.schedule = Some(start_at);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Payload field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// Collect `agent id → status` for every non-ok record.
pub fn failures(result: &RunResult) -> BTreeMap<String, AgentStatus> {
    result
        .iter()
        .filter(|(_, record)| !record.is_ok())
        .map(|(id, record)| (id.clone(), record.status))
        .collect()
}
