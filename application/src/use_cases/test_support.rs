//! Deterministic channel and clock for coordinator tests.

use crate::ports::clock::Clock;
use crate::ports::message_channel::{ChannelError, Envelope, MessageChannel};
use crate::ports::progress::QuorumProgressNotifier;
use async_trait::async_trait;
use benchfleet_domain::{AgentStatus, Directive, InboundMessage, OperationKind};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Clock whose time only moves when a test says so
#[derive(Clone, Default)]
pub(crate) struct ManualClock(Arc<Mutex<f64>>);

impl ManualClock {
    pub(crate) fn set(&self, now: f64) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.0.lock().unwrap()
    }
}

/// Replies sent back through a [`ScriptedChannel`], in message order
#[derive(Clone, Default)]
pub(crate) struct DirectiveLog(Arc<Mutex<Vec<(String, oneshot::Receiver<Directive>)>>>);

impl DirectiveLog {
    fn push(&self, agent_id: String, rx: oneshot::Receiver<Directive>) {
        self.0.lock().unwrap().push((agent_id, rx));
    }

    /// Drain every directive answered so far.
    pub(crate) fn take(&self) -> Vec<(String, Directive)> {
        let pending = std::mem::take(&mut *self.0.lock().unwrap());
        pending
            .into_iter()
            .filter_map(|(agent_id, mut rx)| rx.try_recv().ok().map(|d| (agent_id, d)))
            .collect()
    }

    /// Directives answered to one agent.
    pub(crate) fn for_agent(&self, agent_id: &str) -> Vec<Directive> {
        self.take()
            .into_iter()
            .filter(|(id, _)| id == agent_id)
            .map(|(_, directive)| directive)
            .collect()
    }
}

/// What a [`ScriptedChannel`] does once its script runs out
enum Exhausted {
    End,
    Cancel(CancellationToken),
}

/// Channel that replays `(time, message)` steps, moving the clock to each
/// step's time before yielding it.
pub(crate) struct ScriptedChannel {
    clock: ManualClock,
    steps: VecDeque<(f64, InboundMessage)>,
    log: DirectiveLog,
    exhausted: Exhausted,
    closed: Arc<Mutex<usize>>,
}

impl ScriptedChannel {
    pub(crate) fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            steps: VecDeque::new(),
            log: DirectiveLog::default(),
            exhausted: Exhausted::End,
            closed: Arc::new(Mutex::new(0)),
        }
    }

    pub(crate) fn at(mut self, time: f64, message: InboundMessage) -> Self {
        self.steps.push_back((time, message));
        self
    }

    pub(crate) fn poll(self, time: f64, agent_id: &str) -> Self {
        self.at(time, InboundMessage::poll(agent_id))
    }

    pub(crate) fn heartbeat(self, time: f64) -> Self {
        self.poll(time, "_heartbeat")
    }

    /// Cancel `token` and block instead of ending when the script runs out.
    pub(crate) fn cancel_when_exhausted(mut self, token: CancellationToken) -> Self {
        self.exhausted = Exhausted::Cancel(token);
        self
    }

    pub(crate) fn log(&self) -> DirectiveLog {
        self.log.clone()
    }

    /// Number of `close()` calls observed.
    pub(crate) fn close_count(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl MessageChannel for ScriptedChannel {
    async fn recv(&mut self) -> Result<Option<Envelope>, ChannelError> {
        match self.steps.pop_front() {
            Some((time, message)) => {
                self.clock.set(time);
                let agent_id = message.agent_id.clone();
                let (envelope, rx) = Envelope::new(message);
                self.log.push(agent_id, rx);
                Ok(Some(envelope))
            }
            None => match &self.exhausted {
                Exhausted::End => Ok(None),
                Exhausted::Cancel(token) => {
                    token.cancel();
                    std::future::pending::<Result<Option<Envelope>, ChannelError>>().await
                }
            },
        }
    }

    async fn close(&mut self) {
        *self.closed.lock().unwrap() += 1;
    }
}

/// Progress notifier that records every callback
#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub(crate) starts: Mutex<Vec<(OperationKind, usize)>>,
    pub(crate) resolved: Mutex<Vec<(String, AgentStatus)>>,
    pub(crate) completed: Mutex<Vec<OperationKind>>,
}

impl QuorumProgressNotifier for RecordingProgress {
    fn on_run_start(&self, kind: OperationKind, total_agents: usize) {
        self.starts.lock().unwrap().push((kind, total_agents));
    }

    fn on_agent_resolved(&self, _kind: OperationKind, agent_id: &str, status: AgentStatus) {
        self.resolved
            .lock()
            .unwrap()
            .push((agent_id.to_string(), status));
    }

    fn on_run_complete(&self, kind: OperationKind) {
        self.completed.lock().unwrap().push(kind);
    }
}
