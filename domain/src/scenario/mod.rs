//! Test scenarios: what to run and how the fleet is ramped up.
//!
//! - [`TestDefinition`]: one benchmark test (tool, duration, target, ...)
//! - [`Progression`]: how concurrency grows across iterations of a test
//! - [`IterationRecord`] / [`ScenarioOutcome`]: collected results

pub mod definition;
pub mod outcome;

pub use definition::{Progression, TestDefinition, ToolClass};
pub use outcome::{IterationRecord, ScenarioOutcome};
