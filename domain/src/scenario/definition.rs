//! Test definitions as written in the configuration file.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Test duration used when a definition doesn't specify one (seconds).
pub const DEFAULT_TEST_DURATION: u64 = 60;

/// Benchmark tool driving a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolClass {
    Shell,
    Iperf3,
    Netperf,
    Flent,
}

impl ToolClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolClass::Shell => "shell",
            ToolClass::Iperf3 => "iperf3",
            ToolClass::Netperf => "netperf",
            ToolClass::Flent => "flent",
        }
    }

    /// Whether the tool needs a remote endpoint to talk to.
    pub fn needs_target(&self) -> bool {
        !matches!(self, ToolClass::Shell)
    }
}

impl std::fmt::Display for ToolClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concurrency ramp for a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Progression {
    /// A single iteration with every selectable agent
    #[default]
    None,
    /// 1, 2, 3, ..., N
    Linear,
    /// 1, 2, 4, 8, ..., N
    Quadratic,
}

impl Progression {
    /// Concurrency level of each iteration for a fleet of `n` selectable agents.
    ///
    /// ```
    /// use benchfleet_domain::scenario::Progression;
    ///
    /// assert_eq!(Progression::None.steps(5), vec![5]);
    /// assert_eq!(Progression::Linear.steps(3), vec![1, 2, 3]);
    /// assert_eq!(Progression::Quadratic.steps(5), vec![1, 2, 4, 5]);
    /// ```
    pub fn steps(&self, n: usize) -> Vec<usize> {
        if n == 0 {
            return Vec::new();
        }
        match self {
            Progression::None => vec![n],
            Progression::Linear => (1..=n).collect(),
            Progression::Quadratic => {
                let mut steps = Vec::new();
                let mut k = 1;
                while k < n {
                    steps.push(k);
                    k *= 2;
                }
                steps.push(n);
                steps
            }
        }
    }
}

impl FromStr for Progression {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Progression::None),
            "linear" | "arithmetic" => Ok(Progression::Linear),
            "quadratic" | "geometric" => Ok(Progression::Quadratic),
            other => Err(DomainError::UnknownProgression(other.to_string())),
        }
    }
}

fn default_time() -> u64 {
    DEFAULT_TEST_DURATION
}

/// A single benchmark test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    #[serde(default)]
    pub title: String,
    pub class: ToolClass,
    /// Duration in seconds
    #[serde(default = "default_time")]
    pub time: u64,
    /// Target host for agents without a paired slave
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Tool-specific method (netperf test name, flent test name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Shell: single command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Shell: multi-line script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// iperf3: UDP mode
    #[serde(default)]
    pub udp: bool,
    /// iperf3: target bandwidth (e.g. "100M")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<String>,
    /// iperf3: parallel streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(default)]
    pub progression: Progression,
}

impl TestDefinition {
    pub fn new(class: ToolClass) -> Self {
        Self {
            title: String::new(),
            class,
            time: DEFAULT_TEST_DURATION,
            host: None,
            method: None,
            program: None,
            script: None,
            udp: false,
            bandwidth: None,
            threads: None,
            progression: Progression::None,
        }
    }

    pub fn shell_program(program: impl Into<String>) -> Self {
        let mut test = Self::new(ToolClass::Shell);
        test.program = Some(program.into());
        test
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_progression(mut self, progression: Progression) -> Self {
        self.progression = progression;
        self
    }

    /// Human-readable name: the title if set, otherwise the tool name.
    pub fn display_name(&self) -> String {
        if self.title.is_empty() {
            self.class.to_string()
        } else {
            self.title.clone()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.time == 0 {
            return Err(DomainError::InvalidTest(format!(
                "'{}': time cannot be 0",
                self.display_name()
            )));
        }
        if self.class == ToolClass::Shell && self.program.is_none() && self.script.is_none() {
            return Err(DomainError::InvalidTest(format!(
                "'{}': shell test needs `program` or `script`",
                self.display_name()
            )));
        }
        Ok(())
    }
}
