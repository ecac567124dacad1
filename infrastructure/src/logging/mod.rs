//! Run event logging.
//!
//! Provides [`JsonlRunLogger`], an append-only JSONL writer implementing the
//! [`RunEventLogger`](benchfleet_application::RunEventLogger) port.

mod jsonl_run_logger;

pub use jsonl_run_logger::JsonlRunLogger;
