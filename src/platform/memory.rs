// ABOUTME: In-memory control plane implementing the platform traits.
// ABOUTME: Backs CLI rehearsals and the integration tests; no real network.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::deploy::{ListenerBinding, TrafficSlots};
use crate::types::{
    ClusterId, ImageRef, ListenerId, LoadBalancerId, ServiceName, TargetGroupId, TaskRevision,
    TaskSetId,
};

use super::error::PlatformError;
use super::traits::sealed::Sealed;
use super::traits::{
    BalancerError, BalancerOps, ComputeError, ComputeOps, EndpointAddr, TargetHealth, TaskSet,
    WeightedTarget,
};

/// Identifiers exposed upward for external observability and automation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeploymentGroupInfo {
    pub application: String,
    pub deployment_config: String,
    pub deployment_group: String,
    pub task_definition: String,
    pub container_name: String,
}

impl DeploymentGroupInfo {
    pub fn for_service(service: &ServiceName) -> Self {
        Self {
            application: format!("{service}-application"),
            deployment_config: format!("{service}-deployment-config"),
            deployment_group: format!("{service}-deployment-group"),
            task_definition: format!("{service}-task-def"),
            container_name: format!("{service}-container"),
        }
    }
}

/// Everything `provision` wires up for one service.
#[derive(Debug, Clone)]
pub struct Topology {
    pub cluster: ClusterId,
    pub load_balancer: LoadBalancerId,
    pub slots: TrafficSlots,
}

struct SimTaskSet {
    revision: TaskRevision,
    endpoints: Vec<EndpointAddr>,
    running: bool,
}

struct SimService {
    cluster: ClusterId,
    active: TaskSetId,
    task_sets: HashMap<TaskSetId, SimTaskSet>,
}

struct SimTargetGroup {
    targets: Vec<EndpointAddr>,
    forced_health: Option<TargetHealth>,
}

struct SimListener {
    rule: Vec<WeightedTarget>,
}

#[derive(Default)]
struct SimState {
    services: HashMap<ServiceName, SimService>,
    target_groups: HashMap<TargetGroupId, SimTargetGroup>,
    listeners: HashMap<ListenerId, SimListener>,
    next_task_set: u32,
    next_subnet: u8,
    fail_next_registration: bool,
}

/// In-memory compute cluster and load balancer.
///
/// Cheap to clone; clones share state, which is how tests observe a
/// deployment from the outside while it runs.
#[derive(Clone, Default)]
pub struct SimPlatform {
    inner: Arc<Mutex<SimState>>,
}

impl Sealed for SimPlatform {}

impl SimPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision the full blue-green topology for a service.
    ///
    /// Dependency-ordered: cluster and initial task set first, then the
    /// balancer pair, bound afterward by IDs only. The service's live
    /// endpoints attach to the blue target group; the green side exists
    /// from creation but serves no production traffic.
    pub fn provision(&self, config: &Config) -> Result<Topology, PlatformError> {
        let service = config.service.clone();
        let cluster = ClusterId::new(format!("{service}-cluster"));
        let load_balancer = LoadBalancerId::new(format!("{service}-alb"));
        let blue_tg = TargetGroupId::new(format!("{service}-blue-tg"));
        let green_tg = TargetGroupId::new(format!("{service}-green-tg"));
        let blue_listener = ListenerId::new(format!("{service}-listener-{}", config.ports.production));
        let green_listener = ListenerId::new(format!("{service}-listener-{}", config.ports.test));

        let mut state = self.inner.lock();

        if state.services.contains_key(&service) {
            return Err(ComputeError::Platform(format!(
                "service {service} is already provisioned"
            ))
            .into());
        }

        let task_set_id = state.mint_task_set_id();
        let endpoints = state.mint_endpoints(config.desired_count, config.container_port);
        // Revision 1 models whatever ran before this deployment; using the
        // configured image verbatim would make every deploy a no-op.
        let revision = TaskRevision::new(
            format!("{service}-task-def"),
            1,
            config.image.with_tag("previous"),
        );

        let mut task_sets = HashMap::new();
        task_sets.insert(
            task_set_id.clone(),
            SimTaskSet {
                revision,
                endpoints: endpoints.clone(),
                running: true,
            },
        );
        state.services.insert(
            service,
            SimService {
                cluster: cluster.clone(),
                active: task_set_id,
                task_sets,
            },
        );

        state.target_groups.insert(
            blue_tg.clone(),
            SimTargetGroup {
                targets: endpoints,
                forced_health: None,
            },
        );
        state.target_groups.insert(
            green_tg.clone(),
            SimTargetGroup {
                targets: Vec::new(),
                forced_health: None,
            },
        );

        state.listeners.insert(
            blue_listener.clone(),
            SimListener {
                rule: vec![
                    WeightedTarget::new(blue_tg.clone(), 100),
                    WeightedTarget::new(green_tg.clone(), 0),
                ],
            },
        );
        state.listeners.insert(
            green_listener.clone(),
            SimListener {
                rule: vec![WeightedTarget::new(green_tg.clone(), 100)],
            },
        );

        let slots = TrafficSlots::new(
            ListenerBinding::new(blue_listener, config.ports.production),
            ListenerBinding::new(green_listener, config.ports.test),
            blue_tg,
            green_tg,
        );

        Ok(Topology {
            cluster,
            load_balancer,
            slots,
        })
    }

    /// Force a health verdict on every target of a group. Test hook.
    pub fn set_target_health(&self, target_group: &TargetGroupId, health: TargetHealth) {
        if let Some(tg) = self.inner.lock().target_groups.get_mut(target_group) {
            tg.forced_health = Some(health);
        }
    }

    /// Make the next `register_revision` fail its startup window. Test hook.
    pub fn fail_next_registration(&self) {
        self.inner.lock().fail_next_registration = true;
    }

    /// Weight a listener currently forwards to one target group.
    pub fn weight_of(&self, listener: &ListenerId, target_group: &TargetGroupId) -> Option<u8> {
        self.inner.lock().listeners.get(listener).and_then(|l| {
            l.rule
                .iter()
                .find(|t| &t.target_group == target_group)
                .map(|t| t.weight)
        })
    }

    /// Task sets currently known for a service (running or drained).
    pub fn task_set_count(&self, service: &ServiceName) -> usize {
        self.inner
            .lock()
            .services
            .get(service)
            .map(|s| s.task_sets.len())
            .unwrap_or(0)
    }

    /// Cluster that owns a service.
    pub fn cluster_of(&self, service: &ServiceName) -> Option<ClusterId> {
        self.inner
            .lock()
            .services
            .get(service)
            .map(|s| s.cluster.clone())
    }
}

impl SimState {
    fn mint_task_set_id(&mut self) -> TaskSetId {
        self.next_task_set += 1;
        TaskSetId::new(format!("ts-{}", self.next_task_set))
    }

    fn mint_endpoints(&mut self, count: u32, port: u16) -> Vec<EndpointAddr> {
        self.next_subnet += 1;
        (1..=count)
            .map(|i| EndpointAddr::new(format!("10.0.{}.{}", self.next_subnet, i), port))
            .collect()
    }

    fn service_mut(&mut self, service: &ServiceName) -> Result<&mut SimService, ComputeError> {
        self.services
            .get_mut(service)
            .ok_or_else(|| ComputeError::ServiceNotFound(service.to_string()))
    }
}

#[async_trait]
impl ComputeOps for SimPlatform {
    async fn register_revision(
        &self,
        service: &ServiceName,
        image: &ImageRef,
        desired_count: u32,
        startup_window: Duration,
    ) -> Result<TaskSet, ComputeError> {
        let mut state = self.inner.lock();

        if state.fail_next_registration {
            state.fail_next_registration = false;
            return Err(ComputeError::StartupTimeout(startup_window));
        }

        let id = state.mint_task_set_id();
        let container_port = {
            let svc = state.service_mut(service)?;
            svc.task_sets[&svc.active]
                .endpoints
                .first()
                .map(|e| e.port)
                .unwrap_or(0)
        };
        let endpoints = state.mint_endpoints(desired_count, container_port);

        let svc = state.service_mut(service)?;
        let revision = svc.task_sets[&svc.active].revision.successor(image.clone());
        svc.task_sets.insert(
            id.clone(),
            SimTaskSet {
                revision: revision.clone(),
                endpoints: endpoints.clone(),
                running: true,
            },
        );

        Ok(TaskSet {
            id,
            revision,
            endpoints,
        })
    }

    async fn active_revision(&self, service: &ServiceName) -> Result<TaskRevision, ComputeError> {
        Ok(self.active_task_set(service).await?.revision)
    }

    async fn active_task_set(&self, service: &ServiceName) -> Result<TaskSet, ComputeError> {
        let state = self.inner.lock();
        let svc = state
            .services
            .get(service)
            .ok_or_else(|| ComputeError::ServiceNotFound(service.to_string()))?;
        let ts = &svc.task_sets[&svc.active];
        Ok(TaskSet {
            id: svc.active.clone(),
            revision: ts.revision.clone(),
            endpoints: ts.endpoints.clone(),
        })
    }

    async fn promote_revision(
        &self,
        service: &ServiceName,
        task_set: &TaskSetId,
    ) -> Result<(), ComputeError> {
        let mut state = self.inner.lock();
        let svc = state.service_mut(service)?;
        if !svc.task_sets.contains_key(task_set) {
            return Err(ComputeError::TaskSetNotFound(task_set.to_string()));
        }
        svc.active = task_set.clone();
        Ok(())
    }

    async fn drain_task_set(
        &self,
        service: &ServiceName,
        task_set: &TaskSetId,
    ) -> Result<(), ComputeError> {
        let mut state = self.inner.lock();
        let svc = state.service_mut(service)?;
        let ts = svc
            .task_sets
            .get_mut(task_set)
            .ok_or_else(|| ComputeError::TaskSetNotFound(task_set.to_string()))?;
        ts.running = false;
        Ok(())
    }

    async fn terminate_task_set(
        &self,
        service: &ServiceName,
        task_set: &TaskSetId,
    ) -> Result<(), ComputeError> {
        let mut state = self.inner.lock();
        let svc = state.service_mut(service)?;
        if svc.active == *task_set {
            return Err(ComputeError::Platform(format!(
                "refusing to terminate the active task set {task_set}"
            )));
        }
        svc.task_sets
            .remove(task_set)
            .ok_or_else(|| ComputeError::TaskSetNotFound(task_set.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl BalancerOps for SimPlatform {
    async fn register_targets(
        &self,
        target_group: &TargetGroupId,
        endpoints: &[EndpointAddr],
    ) -> Result<(), BalancerError> {
        let mut state = self.inner.lock();
        let tg = state
            .target_groups
            .get_mut(target_group)
            .ok_or_else(|| BalancerError::TargetGroupNotFound(target_group.to_string()))?;
        for endpoint in endpoints {
            if !tg.targets.contains(endpoint) {
                tg.targets.push(endpoint.clone());
            }
        }
        Ok(())
    }

    async fn deregister_targets(
        &self,
        target_group: &TargetGroupId,
        endpoints: &[EndpointAddr],
    ) -> Result<(), BalancerError> {
        let mut state = self.inner.lock();
        let tg = state
            .target_groups
            .get_mut(target_group)
            .ok_or_else(|| BalancerError::TargetGroupNotFound(target_group.to_string()))?;
        tg.targets.retain(|t| !endpoints.contains(t));
        Ok(())
    }

    async fn set_forward_weights(
        &self,
        listener: &ListenerId,
        targets: &[WeightedTarget],
    ) -> Result<(), BalancerError> {
        let sum: u32 = targets.iter().map(|t| u32::from(t.weight)).sum();
        if sum != 100 {
            return Err(BalancerError::InvalidWeights(sum));
        }

        let mut state = self.inner.lock();
        for target in targets {
            if !state.target_groups.contains_key(&target.target_group) {
                return Err(BalancerError::TargetGroupNotFound(
                    target.target_group.to_string(),
                ));
            }
        }
        let l = state
            .listeners
            .get_mut(listener)
            .ok_or_else(|| BalancerError::ListenerNotFound(listener.to_string()))?;
        l.rule = targets.to_vec();
        Ok(())
    }

    async fn forward_weights(
        &self,
        listener: &ListenerId,
    ) -> Result<Vec<WeightedTarget>, BalancerError> {
        let state = self.inner.lock();
        state
            .listeners
            .get(listener)
            .map(|l| l.rule.clone())
            .ok_or_else(|| BalancerError::ListenerNotFound(listener.to_string()))
    }

    async fn target_health(
        &self,
        target_group: &TargetGroupId,
    ) -> Result<Vec<TargetHealth>, BalancerError> {
        let state = self.inner.lock();
        let tg = state
            .target_groups
            .get(target_group)
            .ok_or_else(|| BalancerError::TargetGroupNotFound(target_group.to_string()))?;
        let verdict = tg.forced_health.unwrap_or(TargetHealth::Healthy);
        Ok(tg.targets.iter().map(|_| verdict).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::template()
    }

    #[tokio::test]
    async fn provision_attaches_live_endpoints_to_blue_only() {
        let platform = SimPlatform::new();
        let config = test_config();
        let topology = platform.provision(&config).unwrap();

        assert_eq!(
            platform.cluster_of(&config.service),
            Some(topology.cluster.clone())
        );

        let blue_tg = topology.slots.current();
        let green_tg = topology.slots.candidate();

        let blue_health = platform.target_health(blue_tg).await.unwrap();
        assert_eq!(blue_health.len(), 1);

        let green_health = platform.target_health(green_tg).await.unwrap();
        assert!(green_health.is_empty());

        assert_eq!(
            platform.weight_of(topology.slots.production_listener(), blue_tg),
            Some(100)
        );
    }

    #[tokio::test]
    async fn register_revision_mints_a_successor() {
        let platform = SimPlatform::new();
        let config = test_config();
        platform.provision(&config).unwrap();

        let image = ImageRef::parse("my-registry/my-app:v2").unwrap();
        let task_set = platform
            .register_revision(&config.service, &image, 2, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(task_set.revision.revision(), 2);
        assert_eq!(task_set.endpoints.len(), 2);

        // Active pointer is untouched until promotion.
        let active = platform.active_revision(&config.service).await.unwrap();
        assert_eq!(active.revision(), 1);
    }

    #[tokio::test]
    async fn registration_failure_is_fail_fast() {
        let platform = SimPlatform::new();
        let config = test_config();
        platform.provision(&config).unwrap();
        platform.fail_next_registration();

        let image = ImageRef::parse("my-registry/my-app:v2").unwrap();
        let err = platform
            .register_revision(&config.service, &image, 1, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::StartupTimeout(_)));
        assert_eq!(platform.task_set_count(&config.service), 1);
    }

    #[tokio::test]
    async fn weights_must_sum_to_one_hundred() {
        let platform = SimPlatform::new();
        let config = test_config();
        let topology = platform.provision(&config).unwrap();

        let err = platform
            .set_forward_weights(
                topology.slots.production_listener(),
                &[
                    WeightedTarget::new(topology.slots.current().clone(), 80),
                    WeightedTarget::new(topology.slots.candidate().clone(), 40),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BalancerError::InvalidWeights(120)));
    }

    #[tokio::test]
    async fn provisioning_twice_is_rejected() {
        let platform = SimPlatform::new();
        let config = test_config();
        platform.provision(&config).unwrap();

        let err = platform.provision(&config).unwrap_err();
        assert_eq!(err.kind(), super::super::PlatformErrorKind::Operation);
    }

    #[tokio::test]
    async fn active_task_set_cannot_be_terminated() {
        let platform = SimPlatform::new();
        let config = test_config();
        platform.provision(&config).unwrap();

        let active = platform.active_task_set(&config.service).await.unwrap();
        let err = platform
            .terminate_task_set(&config.service, &active.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::Platform(_)));
    }
}
