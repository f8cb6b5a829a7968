// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod image_ref;
mod revision;
mod service_name;

pub use id::{ClusterId, ListenerId, LoadBalancerId, TargetGroupId, TaskSetId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use revision::TaskRevision;
pub use service_name::{ServiceName, ServiceNameError};
