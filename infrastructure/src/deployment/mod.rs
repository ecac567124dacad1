//! Fleet deployment adapters.
//!
//! Only a static fleet is provided: agents are listed in the configuration
//! file and started out of band (by hand, systemd, a provisioning tool).

mod static_fleet;

pub use static_fleet::StaticDeployment;
