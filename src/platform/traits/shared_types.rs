// ABOUTME: Wire types shared between the compute and balancer traits.
// ABOUTME: Endpoints, task sets, forwarding weights, target health.

use serde::Serialize;

use crate::types::{TargetGroupId, TaskRevision, TaskSetId};

/// A routable network endpoint of one running task replica.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointAddr {
    pub ip: String,
    pub port: u16,
}

impl EndpointAddr {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }
}

impl std::fmt::Display for EndpointAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// A set of running task replicas for one revision, registered together.
#[derive(Debug, Clone)]
pub struct TaskSet {
    pub id: TaskSetId,
    pub revision: TaskRevision,
    pub endpoints: Vec<EndpointAddr>,
}

/// One target group's share of a listener's forwarding rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedTarget {
    pub target_group: TargetGroupId,
    pub weight: u8,
}

impl WeightedTarget {
    pub fn new(target_group: TargetGroupId, weight: u8) -> Self {
        Self {
            target_group,
            weight,
        }
    }
}

/// Health of one registered target, as the balancer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHealth {
    Healthy,
    Unhealthy,
    Draining,
}

impl TargetHealth {
    pub fn is_healthy(self) -> bool {
        matches!(self, TargetHealth::Healthy)
    }
}
