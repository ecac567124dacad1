//! Progress reporting for quorum runs

pub mod reporter;
