//! Deployment port
//!
//! A deployment provisions the agent fleet and tears it down afterwards.
//! The coordinator only needs the resulting agent descriptors.

use async_trait::async_trait;
use benchfleet_domain::{Agent, DomainError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("Deployment failed: {0}")]
    Failed(String),

    #[error("Invalid agent: {0}")]
    InvalidAgent(#[from] DomainError),
}

/// Port for provisioning agents
#[async_trait]
pub trait Deployment: Send + Sync {
    /// Provision the fleet and return its agents.
    async fn deploy(&self) -> Result<Vec<Agent>, DeploymentError>;

    /// Tear the fleet down. Best effort.
    async fn cleanup(&self);
}
