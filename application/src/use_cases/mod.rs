//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod local_quorum;
pub mod quorum;
pub mod quorum_factory;
pub mod run_scenario;

#[cfg(test)]
pub(crate) mod test_support;
