//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod clock;
pub mod command_runner;
pub mod deployment;
pub mod message_channel;
pub mod progress;
pub mod run_event_logger;
