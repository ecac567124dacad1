//! Coordinator listener from TOML (`[server]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw `[server]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Address agents connect to
    pub bind: String,
    /// Seconds between heartbeat polls; 0 disables the heartbeat
    pub heartbeat: u64,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5999".to_string(),
            heartbeat: 5,
        }
    }
}

impl FileServerConfig {
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat > 0).then(|| Duration::from_secs(self.heartbeat))
    }
}
