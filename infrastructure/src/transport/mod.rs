//! Agent wire transport.
//!
//! Agents and the coordinator exchange JSON documents over TCP, each framed
//! by a `Content-Length` header:
//!
//! ```text
//! Content-Length: 42\r\n
//! \r\n
//! {"agent_id":"alpha","operation":"poll"}
//! ```
//!
//! - [`TcpMessageChannel`] is the coordinator side ([`MessageChannel`] port)
//! - [`AgentClient`] is the worker side
//!
//! [`MessageChannel`]: benchfleet_application::MessageChannel

mod client;
mod error;
pub mod framing;
mod server;

pub use client::AgentClient;
pub use error::{Result, TransportError};
pub use server::{HEARTBEAT_AGENT_ID, TcpMessageChannel};
