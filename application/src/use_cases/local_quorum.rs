//! In-process quorum for benchmarking the local machine
//!
//! Uses the same [`Operation`] contract as the networked [`Quorum`], so
//! callers get an identically shaped [`RunResult`], but runs each agent's
//! command synchronously through a [`CommandRunner`] instead of
//! dispatching it over a channel.
//!
//! [`Quorum`]: crate::use_cases::quorum::Quorum

use crate::ports::clock::{Clock, SystemClock};
use crate::ports::command_runner::CommandRunner;
use benchfleet_domain::{Directive, Executor, InboundMessage, Operation, Payload, RunResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Time allowed on top of an executor's expected duration
const DEFAULT_TIMEOUT_GRACE: Duration = Duration::from_secs(60);

pub struct LocalQuorum<R: CommandRunner> {
    runner: R,
    clock: Arc<dyn Clock>,
    timeout_grace: Duration,
}

impl<R: CommandRunner> LocalQuorum<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            clock: Arc::new(SystemClock),
            timeout_grace: DEFAULT_TIMEOUT_GRACE,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout_grace(mut self, grace: Duration) -> Self {
        self.timeout_grace = grace;
        self
    }

    /// Run every executor in turn on this machine.
    pub fn execute(&self, executors: BTreeMap<String, Box<dyn Executor>>) -> RunResult {
        let mut operation = Operation::execute(executors);
        self.run(&mut operation)
    }

    /// Resolve every active agent of `operation` one after the other.
    pub fn run(&self, operation: &mut Operation) -> RunResult {
        let start_at = self.clock.now();
        let mut result = RunResult::new();

        for agent_id in operation.active_agent_ids() {
            let record = match operation.reply(&agent_id, start_at) {
                Directive::Execute {
                    command,
                    expected_duration,
                    ..
                } => {
                    info!("Running {} locally for {}", command, agent_id);
                    let timeout = Duration::from_secs_f64(expected_duration.max(0.0))
                        + self.timeout_grace;
                    let output = self.runner.run(&command, timeout);
                    let message = InboundMessage::reply(agent_id.as_str(), output.into_payload());
                    operation.process_reply(&agent_id, &message)
                }
                other => {
                    debug!("Nothing to run for {} ({})", agent_id, other.name());
                    let message = InboundMessage::reply(agent_id.as_str(), Payload::new());
                    operation.process_reply(&agent_id, &message)
                }
            };
            result.insert(agent_id, record.with_schedule(start_at));
        }

        result
    }
}
