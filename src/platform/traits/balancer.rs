// ABOUTME: Load balancer operations trait: targets, weights, health.
// ABOUTME: The forwarding rule is the single shared state mutated per step.

use async_trait::async_trait;

use super::sealed::Sealed;
use super::shared_types::{EndpointAddr, TargetHealth, WeightedTarget};
use crate::types::{ListenerId, TargetGroupId};

/// Load balancer operations.
///
/// `set_forward_weights` replaces a listener's whole forwarding rule in one
/// call. That is the only write the shift loop performs, which is what keeps
/// step-wise mutation atomic.
#[async_trait]
pub trait BalancerOps: Sealed + Send + Sync {
    /// Register endpoints with a target group.
    async fn register_targets(
        &self,
        target_group: &TargetGroupId,
        endpoints: &[EndpointAddr],
    ) -> Result<(), BalancerError>;

    /// Deregister endpoints from a target group.
    async fn deregister_targets(
        &self,
        target_group: &TargetGroupId,
        endpoints: &[EndpointAddr],
    ) -> Result<(), BalancerError>;

    /// Atomically replace a listener's forwarding rule.
    /// Weights must sum to exactly 100.
    async fn set_forward_weights(
        &self,
        listener: &ListenerId,
        targets: &[WeightedTarget],
    ) -> Result<(), BalancerError>;

    /// Read back a listener's current forwarding rule.
    async fn forward_weights(
        &self,
        listener: &ListenerId,
    ) -> Result<Vec<WeightedTarget>, BalancerError>;

    /// Health of every target registered with a group. Read-only; safe to
    /// poll concurrently with the shift loop.
    async fn target_health(
        &self,
        target_group: &TargetGroupId,
    ) -> Result<Vec<TargetHealth>, BalancerError>;
}

/// Errors from balancer operations.
#[derive(Debug, thiserror::Error)]
pub enum BalancerError {
    #[error("target group not found: {0}")]
    TargetGroupNotFound(String),

    #[error("listener not found: {0}")]
    ListenerNotFound(String),

    #[error("forwarding weights must sum to 100, got {0}")]
    InvalidWeights(u32),

    #[error("balancer error: {0}")]
    Platform(String),
}
