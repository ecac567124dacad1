//! Command runner port
//!
//! Runs a [`Command`] on the local machine. Used by the in-process
//! [`LocalQuorum`](crate::use_cases::local_quorum::LocalQuorum) and by the
//! agent-side worker loop.

use benchfleet_domain::{Command, CommandOutput};
use std::time::Duration;

/// Port for local command execution
///
/// Implementations never fail: spawn errors and timeouts are reported as
/// stderr output with a non-zero exit code so that executors classify them
/// like any other failed run.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &Command, timeout: Duration) -> CommandOutput;
}
