//! Closed set of built-in executors.

use super::{
    Executor, ExecutionError, FlentExecutor, Iperf3Executor, NetperfExecutor, ShellExecutor,
};
use crate::agent::Agent;
use crate::core::error::DomainError;
use crate::protocol::{Command, InboundMessage, Payload};
use crate::scenario::{TestDefinition, ToolClass};
use std::collections::BTreeMap;

/// Executor for one of the supported benchmark tools
#[derive(Debug, Clone)]
pub enum ToolExecutor {
    Shell(ShellExecutor),
    Iperf3(Iperf3Executor),
    Netperf(NetperfExecutor),
    Flent(FlentExecutor),
}

impl ToolExecutor {
    /// Build the executor `agent` runs for `test`.
    ///
    /// A paired agent always targets its slave's address, never the test's
    /// `host`; an unpaired agent targets the test's `host`.
    pub fn for_agent(
        test: &TestDefinition,
        agent: &Agent,
        fleet: &BTreeMap<String, Agent>,
    ) -> Result<Self, DomainError> {
        test.validate()?;

        let target = match &agent.slave_id {
            Some(slave_id) => fleet.get(slave_id).and_then(|slave| slave.ip.clone()),
            None => test.host.clone(),
        };

        let require_target = || {
            target.clone().ok_or_else(|| DomainError::MissingTarget {
                agent_id: agent.id.clone(),
                test: test.display_name(),
            })
        };

        let executor = match test.class {
            ToolClass::Shell => ToolExecutor::Shell(ShellExecutor::new(test.clone())),
            ToolClass::Iperf3 => {
                ToolExecutor::Iperf3(Iperf3Executor::new(test.clone(), require_target()?))
            }
            ToolClass::Netperf => {
                ToolExecutor::Netperf(NetperfExecutor::new(test.clone(), require_target()?))
            }
            ToolClass::Flent => {
                ToolExecutor::Flent(FlentExecutor::new(test.clone(), require_target()?))
            }
        };
        Ok(executor)
    }

    fn inner(&self) -> &dyn Executor {
        match self {
            ToolExecutor::Shell(e) => e,
            ToolExecutor::Iperf3(e) => e,
            ToolExecutor::Netperf(e) => e,
            ToolExecutor::Flent(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Executor {
        match self {
            ToolExecutor::Shell(e) => e,
            ToolExecutor::Iperf3(e) => e,
            ToolExecutor::Netperf(e) => e,
            ToolExecutor::Flent(e) => e,
        }
    }
}

impl Executor for ToolExecutor {
    fn command(&self) -> Command {
        self.inner().command()
    }

    fn expected_duration(&self) -> f64 {
        self.inner().expected_duration()
    }

    fn process_reply(&mut self, message: &InboundMessage) -> Result<Payload, ExecutionError> {
        self.inner_mut().process_reply(message)
    }

    fn process_failure(&mut self) -> Payload {
        self.inner_mut().process_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentMode;

    fn fleet() -> BTreeMap<String, Agent> {
        let master = Agent::new("m1", AgentMode::Master)
            .with_ip("10.0.0.1")
            .with_slave("s1");
        let slave = Agent::new("s1", AgentMode::Slave)
            .with_ip("10.0.0.2")
            .with_master("m1");
        [master, slave]
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect()
    }

    #[test]
    fn test_target_from_slave() {
        let fleet = fleet();
        let test = TestDefinition::new(ToolClass::Iperf3).with_host("192.168.1.1");
        let executor = ToolExecutor::for_agent(&test, &fleet["m1"], &fleet).unwrap();
        assert!(executor.command().data.contains("--client 10.0.0.2"));
    }

    #[test]
    fn test_target_from_host() {
        let fleet = fleet();
        let alone = Agent::new("a1", AgentMode::Alone);
        let test = TestDefinition::new(ToolClass::Netperf).with_host("192.168.1.1");
        let executor = ToolExecutor::for_agent(&test, &alone, &fleet).unwrap();
        assert!(executor.command().data.contains("-H 192.168.1.1"));
    }

    #[test]
    fn test_missing_target() {
        let alone = Agent::new("a1", AgentMode::Alone);
        let test = TestDefinition::new(ToolClass::Flent);
        let err = ToolExecutor::for_agent(&test, &alone, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, DomainError::MissingTarget { .. }));
    }

    #[test]
    fn test_slave_without_ip_is_missing_target() {
        let mut fleet = fleet();
        if let Some(slave) = fleet.get_mut("s1") {
            slave.ip = None;
        }
        let test = TestDefinition::new(ToolClass::Iperf3).with_host("192.168.1.1");

        let err = ToolExecutor::for_agent(&test, &fleet["m1"], &fleet).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingTarget {
                agent_id: "m1".into(),
                test: "iperf3".into(),
            }
        );
    }

    #[test]
    fn test_unknown_slave_is_missing_target() {
        let master = Agent::new("m9", AgentMode::Master).with_slave("s9");
        let test = TestDefinition::new(ToolClass::Netperf).with_host("192.168.1.1");

        let err = ToolExecutor::for_agent(&test, &master, &fleet()).unwrap_err();
        assert!(matches!(err, DomainError::MissingTarget { .. }));
    }

    #[test]
    fn test_shell_needs_no_target() {
        let alone = Agent::new("a1", AgentMode::Alone);
        let test = TestDefinition::shell_program("hostname").with_time(5);
        let executor = ToolExecutor::for_agent(&test, &alone, &BTreeMap::new()).unwrap();
        assert_eq!(executor.command(), Command::program("hostname"));
        assert_eq!(executor.expected_duration(), 5.0);
    }
}
