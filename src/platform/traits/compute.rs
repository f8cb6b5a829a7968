// ABOUTME: Compute-side operations trait: task sets and revision ownership.
// ABOUTME: Register, drain, terminate task sets; read/promote the active revision.

use async_trait::async_trait;
use std::time::Duration;

use super::sealed::Sealed;
use super::shared_types::TaskSet;
use crate::types::{ImageRef, ServiceName, TaskRevision, TaskSetId};

/// Compute service operations.
///
/// `register_revision` is the candidate-registration contract: it spins up
/// replacement tasks matching the desired count and health-checks them
/// within `startup_window`. If they never come up healthy the registration
/// itself fails and no deployment is started; traffic is untouched.
#[async_trait]
pub trait ComputeOps: Sealed + Send + Sync {
    /// Register a new task revision as the deployment candidate.
    async fn register_revision(
        &self,
        service: &ServiceName,
        image: &ImageRef,
        desired_count: u32,
        startup_window: Duration,
    ) -> Result<TaskSet, ComputeError>;

    /// The revision currently owned by the service.
    async fn active_revision(&self, service: &ServiceName) -> Result<TaskRevision, ComputeError>;

    /// The task set currently serving the active revision.
    async fn active_task_set(&self, service: &ServiceName) -> Result<TaskSet, ComputeError>;

    /// Point the service's active-revision pointer at a registered task set.
    /// Called only once a deployment completes.
    async fn promote_revision(
        &self,
        service: &ServiceName,
        task_set: &TaskSetId,
    ) -> Result<(), ComputeError>;

    /// Deregister a task set's replicas so they stop receiving work.
    async fn drain_task_set(
        &self,
        service: &ServiceName,
        task_set: &TaskSetId,
    ) -> Result<(), ComputeError>;

    /// Stop and discard a drained task set.
    async fn terminate_task_set(
        &self,
        service: &ServiceName,
        task_set: &TaskSetId,
    ) -> Result<(), ComputeError>;
}

/// Errors from compute operations.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("task set not found: {0}")]
    TaskSetNotFound(String),

    #[error("replacement tasks failed to become healthy within {0:?}")]
    StartupTimeout(Duration),

    #[error("insufficient capacity: {0}")]
    InsufficientCapacity(String),

    #[error("compute error: {0}")]
    Platform(String),
}
