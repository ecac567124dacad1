//! iperf3 executor
//!
//! Runs `iperf3 --json` against the target and turns the per-interval
//! report into `[time, bits_per_second]` samples.

use super::{Executor, ExecutionError, check_output};
use crate::protocol::{Command, InboundMessage, Payload};
use crate::scenario::TestDefinition;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct Iperf3Executor {
    test: TestDefinition,
    target: String,
}

impl Iperf3Executor {
    pub fn new(test: TestDefinition, target: impl Into<String>) -> Self {
        Self {
            test,
            target: target.into(),
        }
    }

    fn parse_samples(report: &Value) -> Vec<Value> {
        report
            .get("intervals")
            .and_then(Value::as_array)
            .map(|intervals| {
                intervals
                    .iter()
                    .filter_map(|interval| {
                        let sum = interval.get("sum")?;
                        let end = sum.get("end")?.as_f64()?;
                        let bps = sum.get("bits_per_second")?.as_f64()?;
                        Some(json!([end, bps]))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Executor for Iperf3Executor {
    fn command(&self) -> Command {
        let mut cmd = format!(
            "iperf3 --client {} --format m --time {} --interval 1 --json",
            self.target, self.test.time
        );
        if self.test.udp {
            cmd.push_str(" --udp");
            if let Some(bandwidth) = &self.test.bandwidth {
                cmd.push_str(&format!(" --bandwidth {}", bandwidth));
            }
        }
        if let Some(threads) = self.test.threads {
            cmd.push_str(&format!(" --parallel {}", threads));
        }
        Command::program(cmd)
    }

    fn expected_duration(&self) -> f64 {
        self.test.time as f64
    }

    fn process_reply(&mut self, message: &InboundMessage) -> Result<Payload, ExecutionError> {
        let output = check_output(message)?;

        let report: Value = serde_json::from_str(&output.stdout).map_err(|e| {
            let mut payload = Payload::new();
            payload.insert("stdout".into(), Value::String(output.stdout.clone()));
            ExecutionError::failed(format!("Malformed iperf3 report: {}", e), payload)
        })?;

        if let Some(error) = report.get("error").and_then(Value::as_str) {
            let mut payload = Payload::new();
            payload.insert("stderr".into(), Value::String(error.to_string()));
            return Err(ExecutionError::failed("Empty result", payload));
        }

        let mut payload = Payload::new();
        payload.insert("samples".into(), Value::Array(Self::parse_samples(&report)));
        payload.insert(
            "meta".into(),
            json!([["time", "s"], ["bandwidth", "bit/s"]]),
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ToolClass;

    fn executor() -> Iperf3Executor {
        Iperf3Executor::new(
            TestDefinition::new(ToolClass::Iperf3).with_time(10),
            "10.0.0.2",
        )
    }

    #[test]
    fn test_command_line() {
        let mut test = TestDefinition::new(ToolClass::Iperf3).with_time(30);
        test.udp = true;
        test.bandwidth = Some("100M".into());
        test.threads = Some(4);
        let cmd = Iperf3Executor::new(test, "10.0.0.2").command();
        assert_eq!(
            cmd.data,
            "iperf3 --client 10.0.0.2 --format m --time 30 --interval 1 --json \
             --udp --bandwidth 100M --parallel 4"
        );
    }

    #[test]
    fn test_parse_intervals() {
        let report = json!({
            "intervals": [
                {"sum": {"end": 1.0, "bits_per_second": 9.0e8}},
                {"sum": {"end": 2.0, "bits_per_second": 9.5e8}}
            ],
            "end": {}
        });
        let msg = InboundMessage::reply("alpha", Payload::new())
            .with_field("stdout", report.to_string());
        let payload = executor().process_reply(&msg).unwrap();
        assert_eq!(payload["samples"], json!([[1.0, 9.0e8], [2.0, 9.5e8]]));
        assert_eq!(payload["meta"][1][0], "bandwidth");
    }

    #[test]
    fn test_report_with_error() {
        let msg = InboundMessage::reply("alpha", Payload::new())
            .with_field("stdout", r#"{"error": "unable to connect to server"}"#);
        let err = executor().process_reply(&msg).unwrap_err();
        match err {
            ExecutionError::Failed { message, payload } => {
                assert_eq!(message, "Empty result");
                assert_eq!(payload["stderr"], "unable to connect to server");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_report() {
        let msg =
            InboundMessage::reply("alpha", Payload::new()).with_field("stdout", "not json");
        let err = executor().process_reply(&msg).unwrap_err();
        assert!(err.to_string().starts_with("Malformed iperf3 report"));
    }
}
