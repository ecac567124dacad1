//! Application layer for benchfleet
//!
//! This crate contains the quorum coordinator, use cases, port definitions,
//! and coordinator parameters. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ParamsError, QuorumParams};
pub use ports::{
    clock::{Clock, SystemClock},
    command_runner::CommandRunner,
    deployment::{Deployment, DeploymentError},
    message_channel::{ChannelError, Envelope, MessageChannel, ReplyHandle},
    progress::{NoQuorumProgress, QuorumProgressNotifier},
    run_event_logger::{NoRunEventLogger, RunEvent, RunEventLogger},
};
pub use use_cases::local_quorum::LocalQuorum;
pub use use_cases::quorum::Quorum;
pub use use_cases::quorum_factory::{QuorumError, QuorumFactory};
pub use use_cases::run_scenario::{RunScenarioError, RunScenarioUseCase};
