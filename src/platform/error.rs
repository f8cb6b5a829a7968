// ABOUTME: Platform error types with SNAFU pattern.
// ABOUTME: Unifies compute and balancer errors for programmatic handling.

use snafu::Snafu;

use super::traits::{BalancerError, ComputeError};

/// Unified platform error for compute and balancer failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PlatformError {
    #[snafu(display("compute operation failed: {source}"))]
    Compute { source: ComputeError },

    #[snafu(display("balancer operation failed: {source}"))]
    Balancer { source: BalancerError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// A referenced resource does not exist.
    NotFound,
    /// Replacement tasks never became healthy.
    StartupTimeout,
    /// The platform could not satisfy the request (capacity, bad weights).
    Rejected,
    /// Any other platform-side failure.
    Operation,
}

impl PlatformError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> PlatformErrorKind {
        match self {
            PlatformError::Compute { source } => match source {
                ComputeError::ServiceNotFound(_) | ComputeError::TaskSetNotFound(_) => {
                    PlatformErrorKind::NotFound
                }
                ComputeError::StartupTimeout(_) => PlatformErrorKind::StartupTimeout,
                ComputeError::InsufficientCapacity(_) => PlatformErrorKind::Rejected,
                ComputeError::Platform(_) => PlatformErrorKind::Operation,
            },
            PlatformError::Balancer { source } => match source {
                BalancerError::TargetGroupNotFound(_) | BalancerError::ListenerNotFound(_) => {
                    PlatformErrorKind::NotFound
                }
                BalancerError::InvalidWeights(_) => PlatformErrorKind::Rejected,
                BalancerError::Platform(_) => PlatformErrorKind::Operation,
            },
        }
    }
}

impl From<ComputeError> for PlatformError {
    fn from(source: ComputeError) -> Self {
        PlatformError::Compute { source }
    }
}

impl From<BalancerError> for PlatformError {
    fn from(source: BalancerError) -> Self {
        PlatformError::Balancer { source }
    }
}
