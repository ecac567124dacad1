//! Quorum timing parameters.
//!
//! [`QuorumParams`] groups the three durations that govern liveness in the
//! [`Quorum`](crate::use_cases::quorum::Quorum) run loop:
//!
//! | Parameter | Used for |
//! |-----------|----------|
//! | `polling_interval` | how often agents poll; start-time offset (2×) and clean-up sleep (4×) |
//! | `agent_loss_timeout` | steady-state grace after the last message from a working agent |
//! | `agent_join_timeout` | extra grace during rendezvous, where boot time is unbounded |

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("polling_interval cannot be 0")]
    ZeroPollingInterval,
}

/// Coordinator timing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumParams {
    pub polling_interval: Duration,
    pub agent_loss_timeout: Duration,
    pub agent_join_timeout: Duration,
}

impl Default for QuorumParams {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(10),
            agent_loss_timeout: Duration::from_secs(60),
            agent_join_timeout: Duration::from_secs(600),
        }
    }
}

impl QuorumParams {
    // ==================== Builder Methods ====================

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn with_agent_loss_timeout(mut self, timeout: Duration) -> Self {
        self.agent_loss_timeout = timeout;
        self
    }

    pub fn with_agent_join_timeout(mut self, timeout: Duration) -> Self {
        self.agent_join_timeout = timeout;
        self
    }

    // ==================== Accessors (seconds) ====================

    pub fn polling_interval_secs(&self) -> f64 {
        self.polling_interval.as_secs_f64()
    }

    pub fn agent_loss_timeout_secs(&self) -> f64 {
        self.agent_loss_timeout.as_secs_f64()
    }

    pub fn agent_join_timeout_secs(&self) -> f64 {
        self.agent_join_timeout.as_secs_f64()
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.polling_interval.is_zero() {
            return Err(ParamsError::ZeroPollingInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = QuorumParams::default();
        assert_eq!(params.polling_interval_secs(), 10.0);
        assert_eq!(params.agent_loss_timeout_secs(), 60.0);
        assert_eq!(params.agent_join_timeout_secs(), 600.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let params = QuorumParams::default()
            .with_polling_interval(Duration::from_millis(500))
            .with_agent_loss_timeout(Duration::from_secs(5));
        assert_eq!(params.polling_interval_secs(), 0.5);
        assert_eq!(params.agent_loss_timeout_secs(), 5.0);
    }

    #[test]
    fn test_zero_polling_interval_rejected() {
        let params = QuorumParams::default().with_polling_interval(Duration::ZERO);
        assert_eq!(params.validate(), Err(ParamsError::ZeroPollingInterval));
    }
}
