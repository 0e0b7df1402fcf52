//! Instance health records

use serde::{Deserialize, Serialize};

/// Description used when a load balancer has no health observation for an instance.
pub const UNKNOWN_LB_HEALTH: &str = "Unable to determine load balancer health";

/// Observed health state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    Up,
    Down,
    Starting,
    OutOfService,
    Unknown,
}

impl HealthState {
    /// Map a provider instance status to a health state.
    pub fn from_instance_status(status: &str) -> Self {
        match status {
            "RUNNING" => HealthState::Up,
            "PROVISIONING" | "STAGING" => HealthState::Starting,
            "STOPPING" | "TERMINATED" | "SUSPENDED" => HealthState::Down,
            _ => HealthState::Unknown,
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthState::Up => "Up",
            HealthState::Down => "Down",
            HealthState::Starting => "Starting",
            HealthState::OutOfService => "OutOfService",
            HealthState::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Where a health observation came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HealthSource {
    /// The provider's own instance status
    Platform,
    /// A named load balancer's health check
    LoadBalancer { name: String },
}

/// One health observation attached to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEntry {
    pub source: HealthSource,
    pub state: HealthState,
    pub description: String,
}

impl HealthEntry {
    pub fn platform(status: &str) -> Self {
        Self {
            source: HealthSource::Platform,
            state: HealthState::from_instance_status(status),
            description: status.to_string(),
        }
    }

    pub fn load_balancer(
        name: impl Into<String>,
        state: HealthState,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source: HealthSource::LoadBalancer { name: name.into() },
            state,
            description: description.into(),
        }
    }

    pub fn is_load_balancer(&self) -> bool {
        matches!(self.source, HealthSource::LoadBalancer { .. })
    }

    /// True for an observation made by the named load balancer.
    pub fn is_from_load_balancer(&self, lb_name: &str) -> bool {
        matches!(&self.source, HealthSource::LoadBalancer { name } if name == lb_name)
    }
}

/// Health of one instance as seen by one load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerHealth {
    pub state: HealthState,
    pub description: String,
}

impl LoadBalancerHealth {
    pub fn unknown() -> Self {
        Self {
            state: HealthState::Unknown,
            description: UNKNOWN_LB_HEALTH.to_string(),
        }
    }
}

impl From<&HealthEntry> for LoadBalancerHealth {
    fn from(entry: &HealthEntry) -> Self {
        Self {
            state: entry.state,
            description: entry.description.clone(),
        }
    }
}
