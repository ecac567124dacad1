//! netperf executor

use super::{Executor, ExecutionError, check_output};
use crate::protocol::{Command, InboundMessage, Payload};
use crate::scenario::TestDefinition;
use serde_json::{Value, json};

const DEFAULT_METHOD: &str = "TCP_STREAM";

#[derive(Debug, Clone)]
pub struct NetperfExecutor {
    test: TestDefinition,
    target: String,
}

impl NetperfExecutor {
    pub fn new(test: TestDefinition, target: impl Into<String>) -> Self {
        Self {
            test,
            target: target.into(),
        }
    }

    /// Elapsed time and throughput from the last result line.
    fn parse_result_line(stdout: &str) -> Option<(f64, f64)> {
        let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
        let numbers: Vec<f64> = line
            .split_whitespace()
            .filter_map(|token| token.parse().ok())
            .collect();
        match numbers.as_slice() {
            [.., elapsed, throughput] => Some((*elapsed, *throughput)),
            _ => None,
        }
    }
}

impl Executor for NetperfExecutor {
    fn command(&self) -> Command {
        Command::program(format!(
            "netperf -H {} -l {} -t {}",
            self.target,
            self.test.time,
            self.test.method.as_deref().unwrap_or(DEFAULT_METHOD)
        ))
    }

    fn expected_duration(&self) -> f64 {
        self.test.time as f64
    }

    fn process_reply(&mut self, message: &InboundMessage) -> Result<Payload, ExecutionError> {
        let output = check_output(message)?;
        let (elapsed, throughput) = Self::parse_result_line(&output.stdout).ok_or_else(|| {
            let mut payload = Payload::new();
            payload.insert("stdout".into(), Value::String(output.stdout.clone()));
            ExecutionError::failed("No result line in netperf output", payload)
        })?;

        let mut payload = Payload::new();
        payload.insert("samples".into(), json!([[elapsed, throughput]]));
        payload.insert(
            "meta".into(),
            json!([["time", "s"], ["bandwidth", "Mbit/s"]]),
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ToolClass;

    const OUTPUT: &str = "\
MIGRATED TCP STREAM TEST from 0.0.0.0 (0.0.0.0) port 0 AF_INET to 10.0.0.2 () port 0 AF_INET
Recv   Send    Send
Socket Socket  Message  Elapsed
Size   Size    Size     Time     Throughput
bytes  bytes   bytes    secs.    10^6bits/sec

 87380  16384  16384    10.00    9413.52
";

    #[test]
    fn test_command_default_method() {
        let executor = NetperfExecutor::new(
            TestDefinition::new(ToolClass::Netperf).with_time(10),
            "10.0.0.2",
        );
        assert_eq!(executor.command().data, "netperf -H 10.0.0.2 -l 10 -t TCP_STREAM");
    }

    #[test]
    fn test_parse_stream_output() {
        let mut executor =
            NetperfExecutor::new(TestDefinition::new(ToolClass::Netperf), "10.0.0.2");
        let msg = InboundMessage::reply("alpha", Payload::new()).with_field("stdout", OUTPUT);
        let payload = executor.process_reply(&msg).unwrap();
        assert_eq!(payload["samples"], json!([[10.0, 9413.52]]));
    }

    #[test]
    fn test_garbage_output() {
        let mut executor =
            NetperfExecutor::new(TestDefinition::new(ToolClass::Netperf), "10.0.0.2");
        let msg = InboundMessage::reply("alpha", Payload::new())
            .with_field("stdout", "establish control: are you sure there is a netserver?");
        assert!(executor.process_reply(&msg).is_err());
    }
}
