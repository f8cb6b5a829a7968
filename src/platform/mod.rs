// ABOUTME: Platform layer: external collaborators the orchestrator depends on.
// ABOUTME: Capability traits, an in-memory control plane, and an HTTP probe.

mod error;
mod http;
mod memory;
mod traits;

pub use error::{PlatformError, PlatformErrorKind};
pub use http::{HttpProbe, ProbeError};
pub use memory::{DeploymentGroupInfo, SimPlatform, Topology};
pub use traits::{
    BalancerError, BalancerOps, ComputeError, ComputeOps, EndpointAddr, TargetHealth, TaskSet,
    WeightedTarget,
};
