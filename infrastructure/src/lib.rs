//! Infrastructure layer for benchfleet
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the TCP agent wire, local command execution,
//! the static fleet, run event logging and configuration file loading.

pub mod config;
pub mod deployment;
pub mod logging;
pub mod process;
pub mod transport;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat,
    FileQuorumConfig, FileServerConfig,
};
pub use deployment::StaticDeployment;
pub use logging::JsonlRunLogger;
pub use process::LocalCommandRunner;
pub use transport::{AgentClient, HEARTBEAT_AGENT_ID, TcpMessageChannel, TransportError};
