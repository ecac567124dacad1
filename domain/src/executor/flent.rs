//! flent executor

use super::{Executor, ExecutionError, check_output};
use crate::protocol::{Command, InboundMessage, Payload};
use crate::scenario::TestDefinition;
use serde_json::Value;

const DEFAULT_METHOD: &str = "tcp_download";

#[derive(Debug, Clone)]
pub struct FlentExecutor {
    test: TestDefinition,
    target: String,
}

impl FlentExecutor {
    pub fn new(test: TestDefinition, target: impl Into<String>) -> Self {
        Self {
            test,
            target: target.into(),
        }
    }
}

impl Executor for FlentExecutor {
    fn command(&self) -> Command {
        Command::program(format!(
            "flent {} -H {} -l {} -s 1 -o -",
            self.test.method.as_deref().unwrap_or(DEFAULT_METHOD),
            self.target,
            self.test.time
        ))
    }

    fn expected_duration(&self) -> f64 {
        self.test.time as f64
    }

    fn process_reply(&mut self, message: &InboundMessage) -> Result<Payload, ExecutionError> {
        let output = check_output(message)?;
        let mut payload = Payload::new();
        payload.insert("stdout".into(), Value::String(output.stdout));
        Ok(payload)
    }
}
