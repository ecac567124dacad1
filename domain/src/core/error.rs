//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Invalid test definition: {0}")]
    InvalidTest(String),

    #[error("No target host for agent {agent_id} in test '{test}'")]
    MissingTarget { agent_id: String, test: String },

    #[error("Unknown agent mode: {0}")]
    UnknownAgentMode(String),

    #[error("Unknown progression: {0}")]
    UnknownProgression(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_display() {
        let error = DomainError::MissingTarget {
            agent_id: "alpha".to_string(),
            test: "tcp".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No target host for agent alpha in test 'tcp'"
        );
    }
}
