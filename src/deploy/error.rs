// ABOUTME: Error taxonomy for deployment orchestration.
// ABOUTME: Distinguishes pre-flight, caller-recoverable, and rollback triggers.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::platform::{BalancerError, ComputeError};

/// Errors raised while orchestrating a deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Missing or inconsistent parameters. Fatal, raised pre-flight before
    /// any resource is mutated.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Another deployment is IN_PROGRESS for this service. The caller may
    /// retry once it terminates.
    #[error("deployment already in progress for {service}: held by {holder} (pid {pid}) since {since}")]
    Conflict {
        service: String,
        holder: String,
        pid: u32,
        since: DateTime<Utc>,
    },

    /// Candidate failed its health checks at some shift step.
    #[error("health check failed: {0}")]
    HealthCheck(String),

    /// The manual sign-off gate was declined.
    #[error("approval rejected")]
    ApprovalRejected,

    /// An explicit abort request; handled exactly like a health failure.
    #[error("deployment aborted")]
    Aborted,

    /// The hard ceiling for the whole deployment was exceeded.
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Underlying compute/network/balancer mutation failed. Fatal to the
    /// attempt; surfaced to the caller.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// Restoring traffic to the original slot itself failed.
    #[error("rollback failed: {0}")]
    RollbackFailed(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Configuration,
    Conflict,
    HealthCheck,
    ApprovalRejected,
    Aborted,
    DeadlineExceeded,
    Infrastructure,
    RollbackFailed,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Configuration(_) => DeployErrorKind::Configuration,
            DeployError::Conflict { .. } => DeployErrorKind::Conflict,
            DeployError::HealthCheck(_) => DeployErrorKind::HealthCheck,
            DeployError::ApprovalRejected => DeployErrorKind::ApprovalRejected,
            DeployError::Aborted => DeployErrorKind::Aborted,
            DeployError::DeadlineExceeded(_) => DeployErrorKind::DeadlineExceeded,
            DeployError::Infrastructure(_) => DeployErrorKind::Infrastructure,
            DeployError::RollbackFailed(_) => DeployErrorKind::RollbackFailed,
        }
    }

    /// Whether this failure is handled locally by auto-rollback.
    ///
    /// Anything else aborts the attempt without mutating production
    /// traffic and is surfaced directly.
    pub fn triggers_rollback(&self) -> bool {
        matches!(
            self.kind(),
            DeployErrorKind::HealthCheck
                | DeployErrorKind::ApprovalRejected
                | DeployErrorKind::Aborted
                | DeployErrorKind::DeadlineExceeded
        )
    }
}

impl From<ComputeError> for DeployError {
    fn from(err: ComputeError) -> Self {
        DeployError::Infrastructure(err.to_string())
    }
}

impl From<BalancerError> for DeployError {
    fn from(err: BalancerError) -> Self {
        DeployError::Infrastructure(err.to_string())
    }
}
