//! Domain layer for benchfleet
//!
//! This crate contains the core vocabulary of distributed benchmark
//! coordination. It performs no I/O and has no dependencies on the
//! application or infrastructure layers.
//!
//! # Core Concepts
//!
//! ## Agents and directives
//!
//! Remote [`Agent`]s poll the coordinator with [`InboundMessage`]s and
//! receive exactly one [`Directive`] per message.
//!
//! ## Operations
//!
//! An [`Operation`] (join / execute / clean) decides what each polling agent
//! is told and how its reply becomes an [`AgentRecord`].
//!
//! ## Executors
//!
//! An [`Executor`] builds the benchmark command for one agent and interprets
//! its output. [`ToolExecutor`] covers the built-in tools
//! (shell, iperf3, netperf, flent).

pub mod agent;
pub mod core;
pub mod executor;
pub mod operation;
pub mod protocol;
pub mod record;
pub mod scenario;

// Re-export commonly used types
pub use agent::{Agent, AgentMode, is_private_id};
pub use core::error::DomainError;
pub use executor::{CommandOutput, ExecutionError, Executor, ToolExecutor};
pub use operation::{CLEAN_AGENT_ID, Operation, OperationKind};
pub use protocol::{Command, CommandKind, Directive, InboundMessage, MessageOperation, Payload};
pub use record::{AgentRecord, AgentStatus, RunResult};
pub use scenario::{IterationRecord, Progression, ScenarioOutcome, TestDefinition, ToolClass};
