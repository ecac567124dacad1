//! Quorum coordinator
//!
//! Drives one [`Operation`] at a time against the agents talking through a
//! [`MessageChannel`], until every active agent has a result record.
//!
//! # Run loop
//!
//! 1. Pick a synchronized `start_at` two polling intervals from now and give
//!    every active agent an initial deadline of `start_at + join_timeout`.
//! 2. For each inbound message from an active, unresolved agent, push its
//!    deadline to `now + 2 × polling_interval + agent_loss_timeout`.
//!    - `poll`: answer with the operation's directive, extend the deadline by
//!      the directive's expected duration and mark the agent working.
//!    - `reply` from a working agent: turn it into a record.
//! 3. Answer every message exactly once, whether or not it advanced the run.
//! 4. Stop once every active agent has either replied or passed its deadline.
//!
//! Deadlines are only checked when a message arrives, so loss detection
//! depends on *some* traffic reaching the channel (see the heartbeat
//! producer of the TCP channel).
//!
//! Agents left without a record when the loop ends (never observed,
//! cancelled, or the channel ended) are resolved as interrupted, so the
//! result always covers the whole active set.

use crate::config::QuorumParams;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::message_channel::{Envelope, MessageChannel};
use crate::ports::progress::{NoQuorumProgress, QuorumProgressNotifier};
use crate::ports::run_event_logger::{NoRunEventLogger, RunEvent, RunEventLogger};
use benchfleet_domain::{
    AgentRecord, Executor, Operation, OperationKind, RunResult, is_private_id,
};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Per-run bookkeeping, owned by a single [`Quorum::run`] call
struct RunState {
    deadlines: BTreeMap<String, f64>,
    observed: BTreeSet<String>,
    working: BTreeSet<String>,
    replied: BTreeSet<String>,
    result: RunResult,
}

impl RunState {
    fn new(current: &BTreeSet<String>, initial_deadline: f64) -> Self {
        Self {
            deadlines: current
                .iter()
                .map(|id| (id.clone(), initial_deadline))
                .collect(),
            observed: BTreeSet::new(),
            working: BTreeSet::new(),
            replied: BTreeSet::new(),
            result: RunResult::new(),
        }
    }

    fn is_open(&self, current: &BTreeSet<String>, agent_id: &str) -> bool {
        current.contains(agent_id) && !self.replied.contains(agent_id)
    }

    /// Unreplied agents whose deadline is behind `now`.
    fn lost(&self, now: f64) -> BTreeSet<String> {
        self.deadlines
            .iter()
            .filter(|(id, deadline)| !self.replied.contains(*id) && **deadline < now)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

/// Coordinator tracking a fleet of agents through join, execute and clean runs
pub struct Quorum<C: MessageChannel> {
    channel: C,
    params: QuorumParams,
    clock: Arc<dyn Clock>,
    progress: Arc<dyn QuorumProgressNotifier>,
    logger: Arc<dyn RunEventLogger>,
    cancellation: CancellationToken,
    closed: bool,
}

impl<C: MessageChannel> Quorum<C> {
    pub fn new(channel: C, params: QuorumParams) -> Self {
        Self {
            channel,
            params,
            clock: Arc::new(SystemClock),
            progress: Arc::new(NoQuorumProgress),
            logger: Arc::new(NoRunEventLogger),
            cancellation: CancellationToken::new(),
            closed: false,
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

    /// Set a cancellation token; a cancelled run resolves every open agent
    /// as interrupted.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn params(&self) -> &QuorumParams {
        &self.params
    }

    /// Wait for every agent in `agent_ids` to check in.
    pub async fn join<I, S>(&mut self, agent_ids: I) -> RunResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut operation = Operation::join(
            agent_ids,
            self.params.polling_interval_secs(),
            self.params.agent_join_timeout_secs(),
        );
        self.run(&mut operation).await
    }

    /// Dispatch one executor per agent and collect their results.
    pub async fn execute(&mut self, executors: BTreeMap<String, Box<dyn Executor>>) -> RunResult {
        let mut operation = Operation::execute(executors);
        self.run(&mut operation).await
    }

    /// Tell agents to back off, then release the channel.
    ///
    /// Best effort and idempotent: only the first call does anything.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut operation = Operation::clean(self.params.polling_interval_secs());
        self.run(&mut operation).await;
        self.channel.close().await;
        debug!("Quorum closed");
    }

    /// Drive `operation` until every active agent is resolved.
    pub async fn run(&mut self, operation: &mut Operation) -> RunResult {
        let kind = operation.kind();
        let current = operation.active_agent_ids();
        let polling_interval = self.params.polling_interval_secs();
        let loss_timeout = self.params.agent_loss_timeout_secs();

        let start_at = self.clock.now() + 2.0 * polling_interval;
        let mut state = RunState::new(&current, start_at + operation.agent_join_timeout());
        self.notify_start(kind, &current, start_at);

        while !current.is_empty() {
            let Envelope { message, reply } = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    info!("{} run cancelled", kind);
                    break;
                }
                received = self.channel.recv() => match received {
                    Ok(Some(envelope)) => envelope,
                    Ok(None) => {
                        warn!("Message channel ended during {} run", kind);
                        break;
                    }
                    Err(e) => {
                        warn!("Message channel failed during {} run: {}", kind, e);
                        break;
                    }
                },
            };

            let agent_id = message.agent_id.as_str();
            let now = self.clock.now();
            let mut directive = operation.default_reply(agent_id);

            if state.is_open(&current, agent_id) {
                state.observed.insert(agent_id.to_string());
                let mut deadline = now + 2.0 * polling_interval + loss_timeout;

                if message.is_poll() {
                    directive = operation.reply(agent_id, start_at);
                    deadline += directive.expected_duration();
                    state.working.insert(agent_id.to_string());
                } else if state.working.contains(agent_id) {
                    let record = operation.process_reply(agent_id, &message);
                    state.replied.insert(agent_id.to_string());
                    self.resolve(kind, &mut state.result, record);
                } else {
                    debug!("Ignoring reply from {} before it polled", agent_id);
                }

                state.deadlines.insert(agent_id.to_string(), deadline);
            }

            trace!("{} -> {}", agent_id, directive.name());
            if !reply.send(directive) && !is_private_id(agent_id) {
                debug!("Agent {} went away before its reply was sent", agent_id);
            }

            let lost = state.lost(now);
            if state.replied.len() + lost.len() < current.len() {
                continue;
            }

            for agent_id in &lost {
                if state.result.contains_key(agent_id) {
                    continue;
                }
                if !state.observed.contains(agent_id) {
                    // Resolved as interrupted below.
                    continue;
                }
                if !is_private_id(agent_id) {
                    warn!("Agent {} lost during {} run", agent_id, kind);
                }
                let record = operation.process_failure(agent_id);
                self.resolve(kind, &mut state.result, record);
            }
            break;
        }

        for agent_id in &current {
            if !state.result.contains_key(agent_id) {
                if !is_private_id(agent_id) {
                    debug!("Agent {} was never observed during {} run", agent_id, kind);
                }
                let record = operation.process_interrupt(agent_id);
                self.resolve(kind, &mut state.result, record);
            }
        }

        for record in state.result.values_mut() {
            record.schedule = Some(start_at);
        }

        self.notify_complete(kind, &state.result);
        state.result
    }

    fn notify_start(&self, kind: OperationKind, current: &BTreeSet<String>, start_at: f64) {
        let public: Vec<&String> = current.iter().filter(|id| !is_private_id(id)).collect();
        info!("Starting {} run for {} agent(s)", kind, public.len());
        self.progress.on_run_start(kind, public.len());
        self.logger.log(RunEvent::new(
            "run_start",
            json!({
                "operation": kind.as_str(),
                "agents": public,
                "start_at": start_at,
            }),
        ));
    }

    fn resolve(&self, kind: OperationKind, result: &mut RunResult, record: AgentRecord) {
        if !is_private_id(&record.agent_id) {
            self.progress
                .on_agent_resolved(kind, &record.agent_id, record.status);
            self.logger.log(RunEvent::new(
                "agent_resolved",
                json!({
                    "operation": kind.as_str(),
                    "agent_id": record.agent_id,
                    "status": record.status.as_str(),
                    "info": record.info,
                }),
            ));
        }
        result.insert(record.agent_id.clone(), record);
    }

    fn notify_complete(&self, kind: OperationKind, result: &RunResult) {
        let public = result.keys().filter(|id| !is_private_id(id));
        let (ok, failed): (Vec<&String>, Vec<&String>) =
            public.partition(|id| result[id.as_str()].is_ok());
        info!(
            "{} run complete: {} ok, {} failed",
            kind,
            ok.len(),
            failed.len()
        );
        self.progress.on_run_complete(kind);
        self.logger.log(RunEvent::new(
            "run_complete",
            json!({
                "operation": kind.as_str(),
                "ok": ok.len(),
                "failed": failed,
            }),
        ));
    }
}
