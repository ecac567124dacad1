//! Quorum factory
//!
//! Builds a [`Quorum`] and runs the join rendezvous against the whole
//! expected fleet. A fleet that does not fully join is a hard error: the
//! caller never proceeds with fewer agents than it asked for.

use crate::config::{ParamsError, QuorumParams};
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::message_channel::MessageChannel;
use crate::ports::progress::{NoQuorumProgress, QuorumProgressNotifier};
use crate::ports::run_event_logger::{NoRunEventLogger, RunEventLogger};
use crate::use_cases::quorum::Quorum;
use benchfleet_domain::AgentStatus;
use benchfleet_domain::record::failures;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run-level failures
#[derive(Error, Debug)]
pub enum QuorumError {
    #[error("No agents to join")]
    NoAgents,

    #[error("Invalid quorum parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Join failed: {}", describe_failures(.failures))]
    JoinFailed {
        failures: BTreeMap<String, AgentStatus>,
    },
}

fn describe_failures(failures: &BTreeMap<String, AgentStatus>) -> String {
    failures
        .iter()
        .map(|(id, status)| format!("{}={}", id, status))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds joined [`Quorum`]s with shared parameters and observers
pub struct QuorumFactory {
    params: QuorumParams,
    clock: Arc<dyn Clock>,
    progress: Arc<dyn QuorumProgressNotifier>,
    logger: Arc<dyn RunEventLogger>,
    cancellation: CancellationToken,
}

impl QuorumFactory {
    pub fn new(params: QuorumParams) -> Self {
        Self {
            params,
            clock: Arc::new(SystemClock),
            progress: Arc::new(NoQuorumProgress),
            logger: Arc::new(NoRunEventLogger),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn QuorumProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn RunEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Build a quorum over `channel` and join every agent in `agent_ids`.
    ///
    /// If any agent does not join `ok`, the quorum is closed and
    /// [`QuorumError::JoinFailed`] lists the failing agents.
    pub async fn create<C, I, S>(&self, channel: C, agent_ids: I) -> Result<Quorum<C>, QuorumError>
    where
        C: MessageChannel,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.validate()?;

        let agent_ids: BTreeSet<String> = agent_ids.into_iter().map(Into::into).collect();
        if agent_ids.is_empty() {
            return Err(QuorumError::NoAgents);
        }

        let mut quorum = Quorum::new(channel, self.params.clone())
            .with_clock(Arc::clone(&self.clock))
            .with_progress(Arc::clone(&self.progress))
            .with_logger(Arc::clone(&self.logger))
            .with_cancellation(self.cancellation.clone());

        let result = quorum.join(agent_ids).await;
        let failures = failures(&result);
        if !failures.is_empty() {
            warn!("{} agent(s) failed to join", failures.len());
            quorum.close().await;
            return Err(QuorumError::JoinFailed { failures });
        }

        info!("All {} agent(s) joined", result.len());
        Ok(quorum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{ManualClock, ScriptedChannel};
    use benchfleet_domain::{InboundMessage, Payload};

    fn factory(clock: &ManualClock) -> QuorumFactory {
        QuorumFactory::new(QuorumParams::default()).with_clock(Arc::new(clock.clone()))
    }

    fn ack(agent_id: &str) -> InboundMessage {
        InboundMessage::reply(agent_id, Payload::new())
    }

    #[tokio::test]
    async fn test_create_with_full_fleet() {
        let clock = ManualClock::default();
        let channel = ScriptedChannel::new(clock.clone())
            .poll(1.0, "alpha")
            .at(2.0, ack("alpha"))
            .poll(3.0, "beta")
            .at(4.0, ack("beta"));

        let quorum = factory(&clock).create(channel, ["alpha", "beta"]).await;
        assert!(quorum.is_ok());
    }

    #[tokio::test]
    async fn test_partial_join_fails() {
        let clock = ManualClock::default();
        let channel = ScriptedChannel::new(clock.clone())
            .poll(1.0, "alpha")
            .at(2.0, ack("alpha"))
            .heartbeat(1000.0);
        let closed = channel.close_count();

        let err = factory(&clock)
            .create(channel, ["alpha", "beta"])
            .await
            .err()
            .unwrap();

        match &err {
            QuorumError::JoinFailed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures["beta"], AgentStatus::Interrupted);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.to_string(), "Join failed: beta=interrupted");
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_agents() {
        let clock = ManualClock::default();
        let channel = ScriptedChannel::new(clock.clone());

        let err = factory(&clock)
            .create(channel, Vec::<String>::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, QuorumError::NoAgents));
    }

    #[tokio::test]
    async fn test_zero_polling_interval_rejected() {
        let clock = ManualClock::default();
        let channel = ScriptedChannel::new(clock.clone());
        let factory = QuorumFactory::new(
            QuorumParams::default().with_polling_interval(std::time::Duration::ZERO),
        );

        let err = factory.create(channel, ["alpha"]).await.err().unwrap();
        assert!(matches!(err, QuorumError::InvalidParams(_)));
    }
}
