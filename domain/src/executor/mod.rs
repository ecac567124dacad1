//! Executor contract and built-in benchmark tools.
//!
//! An [`Executor`] is bound to one agent for one test. It builds the command
//! the agent runs and interprets the agent's reply. Failures are reported as
//! [`ExecutionError`] values, never by panicking; the owning
//! [`Operation`](crate::operation::Operation) turns them into `error` records.

mod flent;
mod iperf;
mod netperf;
mod shell;
mod tool;

pub use flent::FlentExecutor;
pub use iperf::Iperf3Executor;
pub use netperf::NetperfExecutor;
pub use shell::ShellExecutor;
pub use tool::ToolExecutor;

use crate::protocol::{Command, InboundMessage, Payload};
use serde_json::Value;
use thiserror::Error;

/// Failure while interpreting an agent's reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The tool ran but its output signals a failure. `payload` carries
    /// whatever partial data is worth keeping (stderr, stdout, samples).
    #[error("{message}")]
    Failed { message: String, payload: Payload },

    /// The reply could not be interpreted at all.
    #[error("{0}")]
    Unexpected(String),
}

impl ExecutionError {
    pub fn failed(message: impl Into<String>, payload: Payload) -> Self {
        ExecutionError::Failed {
            message: message.into(),
            payload,
        }
    }
}

/// Per-agent, per-test command builder and reply interpreter
pub trait Executor: Send {
    /// Command the agent should run.
    fn command(&self) -> Command;

    /// How long the command is expected to run, in seconds.
    fn expected_duration(&self) -> f64;

    /// Turn the agent's reply into result fields.
    fn process_reply(&mut self, message: &InboundMessage) -> Result<Payload, ExecutionError>;

    /// Partial result fields for an agent that was lost or interrupted.
    fn process_failure(&mut self) -> Payload {
        Payload::new()
    }
}

/// Raw output of a command as reported in a reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
}

impl CommandOutput {
    /// Reply fields carrying this output.
    pub fn into_payload(self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("stdout".into(), Value::String(self.stdout));
        payload.insert("stderr".into(), Value::String(self.stderr));
        if let Some(code) = self.exit_code {
            payload.insert("exit_code".into(), Value::from(code));
        }
        payload
    }
}

/// Extract stdout/stderr from a reply and reject obviously failed runs.
///
/// A non-zero exit code, or an empty stdout accompanied by stderr output,
/// is reported as [`ExecutionError::Failed`] with both streams attached.
pub fn check_output(message: &InboundMessage) -> Result<CommandOutput, ExecutionError> {
    let output = CommandOutput {
        stdout: message.get_str("stdout").unwrap_or_default().to_string(),
        stderr: message.get_str("stderr").unwrap_or_default().to_string(),
        exit_code: message.get_i64("exit_code"),
    };

    if let Some(code) = output.exit_code
        && code != 0
    {
        return Err(ExecutionError::failed(
            format!("Command exited with code {}", code),
            output.into_payload(),
        ));
    }

    if output.stdout.trim().is_empty() && !output.stderr.trim().is_empty() {
        let mut payload = Payload::new();
        payload.insert("stderr".into(), Value::String(output.stderr));
        return Err(ExecutionError::failed("Empty result", payload));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(stdout: &str, stderr: &str) -> InboundMessage {
        InboundMessage::reply("alpha", Payload::new())
            .with_field("stdout", stdout)
            .with_field("stderr", stderr)
    }

    #[test]
    fn test_check_output_ok() {
        let output = check_output(&reply("hello", "")).unwrap();
        assert_eq!(output.stdout, "hello");
    }

    #[test]
    fn test_check_output_empty_with_stderr() {
        let err = check_output(&reply("", "boom")).unwrap_err();
        match err {
            ExecutionError::Failed { message, payload } => {
                assert_eq!(message, "Empty result");
                assert_eq!(payload["stderr"], "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_output_nonzero_exit() {
        let msg = reply("partial", "").with_field("exit_code", 2);
        let err = check_output(&msg).unwrap_err();
        assert_eq!(err.to_string(), "Command exited with code 2");
    }

    #[test]
    fn test_check_output_silent_success() {
        let output = check_output(&reply("", "")).unwrap();
        assert!(output.stdout.is_empty());
    }
}
