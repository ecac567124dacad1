//! Progress notification port
//!
//! Defines the interface for reporting progress while a quorum run is
//! waiting on its agents.

use benchfleet_domain::{AgentStatus, OperationKind};

/// Callback for progress updates during a quorum run
///
/// Implementations live in the presentation layer. Private sentinel agents
/// are never reported.
pub trait QuorumProgressNotifier: Send + Sync {
    /// Called when a run starts waiting on `total_agents` agents
    fn on_run_start(&self, kind: OperationKind, total_agents: usize);

    /// Called once per agent when its outcome is final
    fn on_agent_resolved(&self, kind: OperationKind, agent_id: &str, status: AgentStatus);

    /// Called when the run has produced its result
    fn on_run_complete(&self, kind: OperationKind);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoQuorumProgress;

impl QuorumProgressNotifier for NoQuorumProgress {
    fn on_run_start(&self, _kind: OperationKind, _total_agents: usize) {}
    fn on_agent_resolved(&self, _kind: OperationKind, _agent_id: &str, _status: AgentStatus) {}
    fn on_run_complete(&self, _kind: OperationKind) {}
}
