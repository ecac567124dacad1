//! Port for structured run-event logging.
//!
//! Defines the [`RunEventLogger`] trait for recording coordinator events
//! (run start, per-agent resolution, run completion) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record of every run (JSONL).

use serde_json::Value;

/// A structured run event.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. Timestamps are added by the logger.
pub struct RunEvent {
    /// Event type identifier (e.g., "run_start", "agent_resolved").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl RunEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging run events to a structured log.
///
/// The `log` method is synchronous and infallible so that logging can never
/// stall or abort a run; implementations swallow their own I/O errors.
pub trait RunEventLogger: Send + Sync {
    fn log(&self, event: RunEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoRunEventLogger;

impl RunEventLogger for NoRunEventLogger {
    fn log(&self, _event: RunEvent) {}
}
