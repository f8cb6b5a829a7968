// ABOUTME: Composable capability traits for the deployment platform.
// ABOUTME: Defines ComputeOps and BalancerOps plus their shared wire types.

mod balancer;
mod compute;
pub(crate) mod sealed;
mod shared_types;

pub use balancer::{BalancerError, BalancerOps};
pub use compute::{ComputeError, ComputeOps};
pub use shared_types::{EndpointAddr, TargetHealth, TaskSet, WeightedTarget};
