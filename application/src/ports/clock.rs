//! Clock port
//!
//! The run loop measures deadlines in Unix seconds. Injecting the clock
//! lets tests replay message timelines deterministically.

/// Source of the current time in Unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}
