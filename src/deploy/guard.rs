// ABOUTME: Single-flight guard: at most one in-progress deployment per service.
// ABOUTME: In-process registry; concurrent starts get a conflict, never a queue.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::ServiceName;

use super::error::DeployError;

/// Who holds the in-progress slot for a service.
#[derive(Debug, Clone, Serialize)]
pub struct TicketInfo {
    /// Hostname of the process that started the deployment.
    pub holder: String,
    /// Process ID of the holder.
    pub pid: u32,
    /// When the deployment entered IN_PROGRESS.
    pub started_at: DateTime<Utc>,
}

impl TicketInfo {
    fn for_current_process() -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }
}

/// Registry of services with an in-progress deployment.
///
/// Mutual exclusion lives with the service's state, not with any one
/// orchestrator task: every deployment path goes through `acquire` before
/// touching the platform.
#[derive(Clone, Default)]
pub struct ActiveDeployments {
    inner: Arc<Mutex<HashMap<ServiceName, TicketInfo>>>,
}

impl ActiveDeployments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the in-progress slot for a service.
    ///
    /// Fails immediately with `DeployError::Conflict` if another deployment
    /// holds it; requests are never queued silently.
    pub fn acquire(&self, service: &ServiceName) -> Result<DeploymentTicket, DeployError> {
        let mut active = self.inner.lock();

        if let Some(existing) = active.get(service) {
            return Err(DeployError::Conflict {
                service: service.to_string(),
                holder: existing.holder.clone(),
                pid: existing.pid,
                since: existing.started_at,
            });
        }

        active.insert(service.clone(), TicketInfo::for_current_process());

        Ok(DeploymentTicket {
            registry: self.clone(),
            service: service.clone(),
        })
    }

    /// The current holder, if a deployment is in progress.
    pub fn holder(&self, service: &ServiceName) -> Option<TicketInfo> {
        self.inner.lock().get(service).cloned()
    }
}

/// A held in-progress slot; released on drop.
pub struct DeploymentTicket {
    registry: ActiveDeployments,
    service: ServiceName,
}

impl std::fmt::Debug for DeploymentTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentTicket")
            .field("service", &self.service)
            .finish()
    }
}

impl Drop for DeploymentTicket {
    fn drop(&mut self) {
        self.registry.inner.lock().remove(&self.service);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceName {
        ServiceName::new("front").unwrap()
    }

    #[test]
    fn second_acquire_conflicts() {
        let registry = ActiveDeployments::new();
        let _ticket = registry.acquire(&service()).unwrap();

        let err = registry.acquire(&service()).unwrap_err();
        match err {
            DeployError::Conflict { pid, .. } => assert_eq!(pid, std::process::id()),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn drop_releases_the_slot() {
        let registry = ActiveDeployments::new();
        let ticket = registry.acquire(&service()).unwrap();
        drop(ticket);
        assert!(registry.acquire(&service()).is_ok());
    }

    #[test]
    fn distinct_services_do_not_contend() {
        let registry = ActiveDeployments::new();
        let _a = registry.acquire(&service()).unwrap();
        let _b = registry.acquire(&ServiceName::new("back").unwrap()).unwrap();
    }

    #[test]
    fn holder_reports_ticket_info() {
        let registry = ActiveDeployments::new();
        assert!(registry.holder(&service()).is_none());
        let _ticket = registry.acquire(&service()).unwrap();
        let info = registry.holder(&service()).unwrap();
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }
}
