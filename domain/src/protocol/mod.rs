//! Coordinator ↔ agent message types.
//!
//! Every exchange is a single request from the agent followed by exactly one
//! reply from the coordinator:
//!
//! ```text
//! agent                              coordinator
//!   │ ── {operation: poll}  ─────────────▶ │
//!   │ ◀──────────── {operation: execute} ─ │   (or configure / sleep / none)
//!   │        ... runs command ...          │
//!   │ ── {operation: reply, stdout, ...} ▶ │
//!   │ ◀─────────────── {operation: none} ─ │
//! ```
//!
//! - [`InboundMessage`]: agent → coordinator request
//! - [`Directive`]: coordinator → agent reply
//! - [`Command`]: opaque command descriptor carried by `execute`

pub mod command;
pub mod directive;
pub mod message;

pub use command::{Command, CommandKind};
pub use directive::Directive;
pub use message::{InboundMessage, MessageOperation, Payload};
