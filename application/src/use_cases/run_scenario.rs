//! Run Scenario use case
//!
//! Deploys the fleet, joins it, then runs every test at each concurrency
//! step of its progression before tearing everything down.

use crate::ports::deployment::{Deployment, DeploymentError};
use crate::ports::message_channel::MessageChannel;
use crate::use_cases::quorum::Quorum;
use crate::use_cases::quorum_factory::{QuorumError, QuorumFactory};
use benchfleet_domain::{
    Agent, DomainError, Executor, IterationRecord, ScenarioOutcome, TestDefinition, ToolExecutor,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RunScenarioError {
    #[error("No tests to run")]
    NoTests,

    #[error("No selectable agents (master or alone) in the fleet")]
    NoSelectableAgents,

    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Use case for running a full benchmark scenario
pub struct RunScenarioUseCase<D: Deployment> {
    deployment: D,
    factory: QuorumFactory,
}

impl<D: Deployment> RunScenarioUseCase<D> {
    pub fn new(deployment: D, factory: QuorumFactory) -> Self {
        Self {
            deployment,
            factory,
        }
    }

    /// Run `tests` against the deployed fleet, talking through `channel`.
    ///
    /// The fleet is cleaned up whether or not the run succeeds.
    pub async fn execute<C: MessageChannel>(
        &self,
        channel: C,
        tests: &[TestDefinition],
    ) -> Result<ScenarioOutcome, RunScenarioError> {
        if tests.is_empty() {
            return Err(RunScenarioError::NoTests);
        }
        for test in tests {
            test.validate()?;
        }

        let agents = self.deployment.deploy().await?;
        let outcome = self.run_deployed(channel, agents, tests).await;
        self.deployment.cleanup().await;
        outcome
    }

    async fn run_deployed<C: MessageChannel>(
        &self,
        channel: C,
        agents: Vec<Agent>,
        tests: &[TestDefinition],
    ) -> Result<ScenarioOutcome, RunScenarioError> {
        let mut fleet = BTreeMap::new();
        for agent in agents {
            agent.validate()?;
            fleet.insert(agent.id.clone(), agent);
        }
        let selectable: Vec<&Agent> = fleet.values().filter(|a| a.is_selectable()).collect();
        if selectable.is_empty() {
            return Err(RunScenarioError::NoSelectableAgents);
        }

        info!(
            "Fleet of {} agent(s), {} selectable",
            fleet.len(),
            selectable.len()
        );
        // Resolved up front so a bad test fails before anything runs.
        let plans = plan_tests(&fleet, &selectable, tests)?;

        let mut quorum = self.factory.create(channel, fleet.keys().cloned()).await?;
        let outcome = run_tests(&mut quorum, plans).await;
        quorum.close().await;
        Ok(outcome)
    }
}

/// Executors for every concurrency step of one test
struct TestPlan {
    name: String,
    steps: Vec<(usize, BTreeMap<String, Box<dyn Executor>>)>,
}

fn plan_tests(
    fleet: &BTreeMap<String, Agent>,
    selectable: &[&Agent],
    tests: &[TestDefinition],
) -> Result<Vec<TestPlan>, DomainError> {
    tests
        .iter()
        .map(|test| {
            let steps = test
                .progression
                .steps(selectable.len())
                .into_iter()
                .map(|concurrency| {
                    let mut executors: BTreeMap<String, Box<dyn Executor>> = BTreeMap::new();
                    for agent in &selectable[..concurrency] {
                        let executor = ToolExecutor::for_agent(test, agent, fleet)?;
                        executors.insert(agent.id.clone(), Box::new(executor));
                    }
                    Ok::<_, DomainError>((concurrency, executors))
                })
                .collect::<Result<Vec<_>, DomainError>>()?;
            Ok(TestPlan {
                name: test.display_name(),
                steps,
            })
        })
        .collect()
}

async fn run_tests<C: MessageChannel>(
    quorum: &mut Quorum<C>,
    plans: Vec<TestPlan>,
) -> ScenarioOutcome {
    let mut outcome = ScenarioOutcome::default();

    for plan in plans {
        for (concurrency, executors) in plan.steps {
            info!("Running {} with concurrency {}", plan.name, concurrency);
            let result = quorum.execute(executors).await;
            let iteration = IterationRecord::new(plan.name.clone(), concurrency, result);
            let all_ok = iteration.all_ok();
            outcome.push(iteration);

            if !all_ok {
                warn!(
                    "{} failed at concurrency {}; skipping remaining steps",
                    plan.name, concurrency
                );
                break;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuorumParams;
    use crate::use_cases::test_support::{ManualClock, ScriptedChannel};
    use async_trait::async_trait;
    use benchfleet_domain::{AgentMode, AgentStatus, InboundMessage, Payload, Progression};
    use std::sync::{Arc, Mutex};

    struct FakeDeployment {
        agents: Vec<Agent>,
        cleanups: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Deployment for FakeDeployment {
        async fn deploy(&self) -> Result<Vec<Agent>, DeploymentError> {
            Ok(self.agents.clone())
        }

        async fn cleanup(&self) {
            *self.cleanups.lock().unwrap() += 1;
        }
    }

    fn fleet() -> Vec<Agent> {
        vec![
            Agent::new("m1", AgentMode::Master).with_slave("s1"),
            Agent::new("s1", AgentMode::Slave)
                .with_ip("10.0.0.2")
                .with_master("m1"),
            Agent::new("a1", AgentMode::Alone),
        ]
    }

    fn use_case(
        clock: &ManualClock,
        agents: Vec<Agent>,
    ) -> (RunScenarioUseCase<FakeDeployment>, Arc<Mutex<usize>>) {
        let cleanups = Arc::new(Mutex::new(0));
        let deployment = FakeDeployment {
            agents,
            cleanups: Arc::clone(&cleanups),
        };
        let factory =
            QuorumFactory::new(QuorumParams::default()).with_clock(Arc::new(clock.clone()));
        (RunScenarioUseCase::new(deployment, factory), cleanups)
    }

    fn output(agent_id: &str, stdout: &str, stderr: &str) -> InboundMessage {
        InboundMessage::reply(agent_id, Payload::new())
            .with_field("stdout", stdout)
            .with_field("stderr", stderr)
            .with_field("exit_code", 0)
    }

    fn joined(clock: &ManualClock) -> ScriptedChannel {
        ScriptedChannel::new(clock.clone())
            .poll(1.0, "m1")
            .poll(2.0, "s1")
            .poll(3.0, "a1")
            .at(4.0, InboundMessage::reply("m1", Payload::new()))
            .at(5.0, InboundMessage::reply("s1", Payload::new()))
            .at(6.0, InboundMessage::reply("a1", Payload::new()))
    }

    #[tokio::test]
    async fn test_linear_progression_runs_each_step() {
        let clock = ManualClock::default();
        let channel = joined(&clock)
            .poll(7.0, "a1")
            .at(8.0, output("a1", "up", ""))
            .poll(9.0, "a1")
            .poll(10.0, "m1")
            .at(11.0, output("a1", "up", ""))
            .at(12.0, output("m1", "up", ""));
        let (use_case, cleanups) = use_case(&clock, fleet());
        let test = TestDefinition::shell_program("uptime").with_progression(Progression::Linear);

        let outcome = use_case.execute(channel, &[test]).await.unwrap();

        assert_eq!(outcome.iterations.len(), 2);
        assert_eq!(outcome.iterations[0].concurrency, 1);
        assert_eq!(
            outcome.iterations[0].agents.keys().collect::<Vec<_>>(),
            vec!["a1"]
        );
        assert_eq!(outcome.iterations[1].concurrency, 2);
        assert_eq!(
            outcome.iterations[1].agents.keys().collect::<Vec<_>>(),
            vec!["a1", "m1"]
        );
        assert_eq!(outcome.failure_count(), 0);
        assert_eq!(*cleanups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_progression_stops_after_failure() {
        let clock = ManualClock::default();
        let channel = joined(&clock)
            .poll(7.0, "a1")
            .at(8.0, output("a1", "", "boom"));
        let (use_case, _) = use_case(&clock, fleet());
        let test = TestDefinition::shell_program("uptime").with_progression(Progression::Linear);

        let outcome = use_case.execute(channel, &[test]).await.unwrap();

        assert_eq!(outcome.iterations.len(), 1);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(
            outcome.iterations[0].agents["a1"].status,
            AgentStatus::Error
        );
    }

    #[tokio::test]
    async fn test_join_failure_still_cleans_up() {
        let clock = ManualClock::default();
        let channel = ScriptedChannel::new(clock.clone()).poll(1.0, "m1");
        let (use_case, cleanups) = use_case(&clock, fleet());

        let err = use_case
            .execute(channel, &[TestDefinition::shell_program("uptime")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunScenarioError::Quorum(QuorumError::JoinFailed { .. })
        ));
        assert_eq!(*cleanups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_target_fails_before_any_test_runs() {
        let clock = ManualClock::default();
        let agents = vec![Agent::new("a1", AgentMode::Alone)];
        let channel = ScriptedChannel::new(clock.clone())
            .poll(1.0, "a1")
            .at(2.0, InboundMessage::reply("a1", Payload::new()))
            .poll(3.0, "a1")
            .at(4.0, output("a1", "up", ""));
        let log = channel.log();
        let (use_case, cleanups) = use_case(&clock, agents);
        let tests = [
            TestDefinition::shell_program("uptime"),
            TestDefinition::new(benchfleet_domain::ToolClass::Iperf3),
        ];

        let err = use_case.execute(channel, &tests).await.unwrap_err();

        assert!(matches!(
            err,
            RunScenarioError::Domain(DomainError::MissingTarget { .. })
        ));
        // Neither the join nor the valid shell test reached the fleet.
        assert!(log.for_agent("a1").is_empty());
        assert_eq!(*cleanups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_tests_rejected() {
        let clock = ManualClock::default();
        let (use_case, cleanups) = use_case(&clock, fleet());

        let err = use_case
            .execute(ScriptedChannel::new(clock.clone()), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, RunScenarioError::NoTests));
        assert_eq!(*cleanups.lock().unwrap(), 0);
    }
}
