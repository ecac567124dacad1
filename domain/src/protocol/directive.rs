//! Replies sent back to agents.

use super::command::Command;
use serde::{Deserialize, Serialize};

/// Instruction returned to an agent in answer to one of its requests.
///
/// Times are Unix timestamps and durations in seconds, matching what agents
/// put on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Directive {
    /// Nothing to do; keep polling.
    #[default]
    None,
    /// Adopt a polling interval. Sent during rendezvous.
    Configure {
        polling_interval: f64,
        expected_duration: f64,
    },
    /// Run `command` starting at `start_at`.
    Execute {
        command: Command,
        start_at: f64,
        expected_duration: f64,
    },
    /// Back off for a while.
    Sleep { seconds: f64 },
}

impl Directive {
    /// How long the agent is expected to be busy after receiving this directive.
    pub fn expected_duration(&self) -> f64 {
        match self {
            Directive::Configure {
                expected_duration, ..
            }
            | Directive::Execute {
                expected_duration, ..
            } => *expected_duration,
            Directive::None | Directive::Sleep { .. } => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Directive::None => "none",
            Directive::Configure { .. } => "configure",
            Directive::Execute { .. } => "execute",
            Directive::Sleep { .. } => "sleep",
        }
    }
}
