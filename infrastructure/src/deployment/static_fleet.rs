use async_trait::async_trait;
use benchfleet_application::ports::deployment::{Deployment, DeploymentError};
use benchfleet_domain::Agent;
use std::collections::BTreeMap;
use tracing::info;

/// Deployment over a fixed list of already running agents
#[derive(Debug, Clone, Default)]
pub struct StaticDeployment {
    agents: Vec<Agent>,
}

impl StaticDeployment {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Every slave or master reference must name an agent of the fleet,
    /// and every paired slave needs an `ip` for its master to target.
    fn check_pairs(&self) -> Result<(), DeploymentError> {
        let by_id: BTreeMap<&str, &Agent> =
            self.agents.iter().map(|a| (a.id.as_str(), a)).collect();
        for agent in &self.agents {
            for peer in [&agent.slave_id, &agent.master_id].into_iter().flatten() {
                if !by_id.contains_key(peer.as_str()) {
                    return Err(DeploymentError::Failed(format!(
                        "agent '{}' refers to unknown agent '{}'",
                        agent.id, peer
                    )));
                }
            }
            if let Some(slave) = agent.slave_id.as_deref().and_then(|id| by_id.get(id))
                && slave.ip.is_none()
            {
                return Err(DeploymentError::Failed(format!(
                    "slave '{}' of agent '{}' has no ip",
                    slave.id, agent.id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Deployment for StaticDeployment {
    async fn deploy(&self) -> Result<Vec<Agent>, DeploymentError> {
        if self.agents.is_empty() {
            return Err(DeploymentError::Failed(
                "no agents configured (add [[agents]] entries)".into(),
            ));
        }
        for agent in &self.agents {
            agent.validate()?;
        }
        self.check_pairs()?;

        info!("Using static fleet of {} agent(s)", self.agents.len());
        Ok(self.agents.clone())
    }

    async fn cleanup(&self) {
        info!("Static fleet left running");
    }
}
