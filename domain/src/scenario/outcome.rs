//! Results collected over a whole scenario.

use crate::record::{AgentRecord, RunResult};
use serde::{Deserialize, Serialize};

/// Results of one iteration of one test at a given concurrency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub test: String,
    pub concurrency: usize,
    pub agents: RunResult,
}

impl IterationRecord {
    pub fn new(test: impl Into<String>, concurrency: usize, agents: RunResult) -> Self {
        Self {
            test: test.into(),
            concurrency,
            agents,
        }
    }

    /// `true` if every agent finished with status `ok`.
    pub fn all_ok(&self) -> bool {
        self.agents.values().all(AgentRecord::is_ok)
    }
}

/// Everything a scenario run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub iterations: Vec<IterationRecord>,
}

impl ScenarioOutcome {
    pub fn push(&mut self, iteration: IterationRecord) {
        self.iterations.push(iteration);
    }

    /// Total number of agent records with a non-ok status.
    pub fn failure_count(&self) -> usize {
        self.iterations
            .iter()
            .flat_map(|it| it.agents.values())
            .filter(|record| !record.is_ok())
            .count()
    }
}
