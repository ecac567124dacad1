//! Shell executor: runs an arbitrary program or script.

use super::{Executor, ExecutionError, check_output};
use crate::protocol::{Command, InboundMessage, Payload};
use crate::scenario::TestDefinition;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ShellExecutor {
    test: TestDefinition,
}

impl ShellExecutor {
    pub fn new(test: TestDefinition) -> Self {
        Self { test }
    }
}

impl Executor for ShellExecutor {
    fn command(&self) -> Command {
        match (&self.test.program, &self.test.script) {
            (Some(program), _) => Command::program(program.clone()),
            (None, Some(script)) => Command::script(script.clone()),
            (None, None) => Command::program("true"),
        }
    }

    fn expected_duration(&self) -> f64 {
        self.test.time as f64
    }

    fn process_reply(&mut self, message: &InboundMessage) -> Result<Payload, ExecutionError> {
        let output = check_output(message)?;
        let mut payload = Payload::new();
        payload.insert("stdout".into(), Value::String(output.stdout));
        payload.insert("stderr".into(), Value::String(output.stderr));
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_preferred_over_script() {
        let mut test = TestDefinition::shell_program("uptime");
        test.script = Some("echo hi".into());
        assert_eq!(ShellExecutor::new(test).command(), Command::program("uptime"));
    }

    #[test]
    fn test_script_command() {
        let mut test = TestDefinition::new(crate::scenario::ToolClass::Shell);
        test.script = Some("echo a\necho b".into());
        assert_eq!(
            ShellExecutor::new(test).command(),
            Command::script("echo a\necho b")
        );
    }

    #[test]
    fn test_process_reply_keeps_streams() {
        let mut executor = ShellExecutor::new(TestDefinition::shell_program("uptime"));
        let msg = InboundMessage::reply("alpha", Payload::new())
            .with_field("stdout", "up 3 days")
            .with_field("stderr", "");
        let payload = executor.process_reply(&msg).unwrap();
        assert_eq!(payload["stdout"], "up 3 days");
    }
}
