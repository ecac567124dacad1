//! Operations: what to tell polling agents and how to read their replies.
//!
//! One [`Operation`] drives one coordinator run. The run loop only ever
//! talks to the operation; it never inspects executors or directives
//! itself beyond the directive's expected duration.
//!
//! | Variant | Active agents | Poll answer | Default answer |
//! |---------|---------------|-------------|----------------|
//! | [`Join`](Operation::Join) | the expected fleet | `configure` | `none` |
//! | [`Execute`](Operation::Execute) | executor keys | `execute` | `none` |
//! | [`Clean`](Operation::Clean) | `_clean` sentinel | `sleep` | `sleep` |
//!
//! Reply processing is total: every call returns an [`AgentRecord`], and
//! executor failures (including panics) become `error` records.

use crate::executor::{ExecutionError, Executor};
use crate::protocol::{Directive, InboundMessage};
use crate::record::AgentRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Sentinel agent id tracked by the clean-up operation.
pub const CLEAN_AGENT_ID: &str = "_clean";

/// Multiple of the polling interval agents are told to sleep during clean-up.
const CLEAN_SLEEP_FACTOR: f64 = 4.0;

/// Discriminant used for logging and progress reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Join,
    Execute,
    Clean,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Join => "join",
            OperationKind::Execute => "execute",
            OperationKind::Clean => "clean",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendezvous: wait for every expected agent to check in.
#[derive(Debug, Clone)]
pub struct JoinOperation {
    agent_ids: BTreeSet<String>,
    polling_interval: f64,
    agent_join_timeout: f64,
}

impl JoinOperation {
    pub fn new<I, S>(agent_ids: I, polling_interval: f64, agent_join_timeout: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agent_ids: agent_ids.into_iter().map(Into::into).collect(),
            polling_interval,
            agent_join_timeout,
        }
    }
}

/// Run one executor per agent with a synchronized start.
pub struct ExecuteOperation {
    executors: BTreeMap<String, Box<dyn Executor>>,
}

impl ExecuteOperation {
    pub fn new(executors: BTreeMap<String, Box<dyn Executor>>) -> Self {
        Self { executors }
    }
}

impl std::fmt::Debug for ExecuteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteOperation")
            .field("agents", &self.executors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Teardown nudge: tell every agent to back off.
#[derive(Debug, Clone)]
pub struct CleanOperation {
    polling_interval: f64,
}

impl CleanOperation {
    pub fn new(polling_interval: f64) -> Self {
        Self { polling_interval }
    }

    fn sleep(&self) -> Directive {
        Directive::Sleep {
            seconds: self.polling_interval * CLEAN_SLEEP_FACTOR,
        }
    }
}

/// Strategy driving a single coordinator run
#[derive(Debug)]
pub enum Operation {
    Join(JoinOperation),
    Execute(ExecuteOperation),
    Clean(CleanOperation),
}

impl Operation {
    pub fn join<I, S>(agent_ids: I, polling_interval: f64, agent_join_timeout: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operation::Join(JoinOperation::new(
            agent_ids,
            polling_interval,
            agent_join_timeout,
        ))
    }

    pub fn execute(executors: BTreeMap<String, Box<dyn Executor>>) -> Self {
        Operation::Execute(ExecuteOperation::new(executors))
    }

    pub fn clean(polling_interval: f64) -> Self {
        Operation::Clean(CleanOperation::new(polling_interval))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Join(_) => OperationKind::Join,
            Operation::Execute(_) => OperationKind::Execute,
            Operation::Clean(_) => OperationKind::Clean,
        }
    }

    /// Agents this operation expects to hear from.
    pub fn active_agent_ids(&self) -> BTreeSet<String> {
        match self {
            Operation::Join(op) => op.agent_ids.clone(),
            Operation::Execute(op) => op.executors.keys().cloned().collect(),
            Operation::Clean(_) => BTreeSet::from([CLEAN_AGENT_ID.to_string()]),
        }
    }

    /// Extra grace (seconds) added to the initial deadline of every agent.
    pub fn agent_join_timeout(&self) -> f64 {
        match self {
            Operation::Join(op) => op.agent_join_timeout,
            Operation::Execute(_) | Operation::Clean(_) => 0.0,
        }
    }

    /// Answer for messages that don't advance the run.
    pub fn default_reply(&self, _agent_id: &str) -> Directive {
        match self {
            Operation::Clean(op) => op.sleep(),
            Operation::Join(_) | Operation::Execute(_) => Directive::None,
        }
    }

    /// Answer for a poll from an active, unresolved agent.
    pub fn reply(&self, agent_id: &str, start_at: f64) -> Directive {
        match self {
            Operation::Join(op) => Directive::Configure {
                polling_interval: op.polling_interval,
                expected_duration: 0.0,
            },
            Operation::Execute(op) => match op.executors.get(agent_id) {
                Some(executor) => Directive::Execute {
                    command: executor.command(),
                    start_at,
                    expected_duration: executor.expected_duration(),
                },
                None => Directive::None,
            },
            Operation::Clean(op) => op.sleep(),
        }
    }

    /// Turn a reply into a record. Never fails.
    ///
    /// An executor panic is caught and recorded as an `error`. This only
    /// holds with unwinding panics; under `panic = "abort"` the process exits.
    pub fn process_reply(&mut self, agent_id: &str, message: &InboundMessage) -> AgentRecord {
        let outcome = match self {
            Operation::Execute(op) => match op.executors.get_mut(agent_id) {
                Some(executor) => {
                    panic::catch_unwind(AssertUnwindSafe(|| executor.process_reply(message)))
                }
                None => return AgentRecord::error(agent_id, "No executor registered for agent"),
            },
            Operation::Join(_) | Operation::Clean(_) => return AgentRecord::ok(agent_id),
        };

        match outcome {
            Ok(Ok(payload)) => AgentRecord::ok(agent_id).with_payload(payload),
            Ok(Err(error)) => self.process_error(agent_id, error),
            Err(_) => {
                warn!("Executor for agent {} panicked while processing reply", agent_id);
                AgentRecord::error(agent_id, "Unexpected error while processing reply")
            }
        }
    }

    /// Record for a reply the executor rejected.
    pub fn process_error(&self, agent_id: &str, error: ExecutionError) -> AgentRecord {
        match error {
            ExecutionError::Failed { message, payload } => {
                AgentRecord::error(agent_id, message).with_payload(payload)
            }
            ExecutionError::Unexpected(message) => {
                AgentRecord::error(agent_id, format!("Unexpected error: {}", message))
            }
        }
    }

    /// Record for an agent whose liveness deadline passed.
    pub fn process_failure(&mut self, agent_id: &str) -> AgentRecord {
        let partial = self.executor_failure(agent_id);
        AgentRecord::lost(agent_id).with_payload(partial)
    }

    /// Record for an agent never observed during the run.
    pub fn process_interrupt(&mut self, agent_id: &str) -> AgentRecord {
        let partial = self.executor_failure(agent_id);
        AgentRecord::interrupted(agent_id).with_payload(partial)
    }

    fn executor_failure(&mut self, agent_id: &str) -> crate::protocol::Payload {
        match self {
            Operation::Execute(op) => op
                .executors
                .get_mut(agent_id)
                .map(|executor| executor.process_failure())
                .unwrap_or_default(),
            Operation::Join(_) | Operation::Clean(_) => Default::default(),
        }
    }
}
