//! Application-level configuration.
//!
//! - [`QuorumParams`]: timing parameters of the coordinator run loop

pub mod quorum_params;

pub use quorum_params::{ParamsError, QuorumParams};
