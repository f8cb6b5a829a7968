// ABOUTME: Tests for the in-process single-flight deployment guard.
// ABOUTME: One deployment per service; tickets release on drop.

mod support;

use cutover::config::ShiftMode;
use cutover::deploy::{ActiveDeployments, DeployErrorKind, Gates};
use cutover::platform::SimPlatform;
use cutover::types::ServiceName;
use std::time::Duration;

#[test]
fn second_acquire_conflicts_until_release() {
    let registry = ActiveDeployments::new();
    let service = ServiceName::new("web").unwrap();

    let ticket = registry.acquire(&service).unwrap();

    let err = registry.acquire(&service).unwrap_err();
    assert_eq!(err.kind(), DeployErrorKind::Conflict);

    // The holder is queryable for the error message.
    let info = registry.holder(&service).unwrap();
    assert_eq!(info.pid, std::process::id());

    drop(ticket);
    assert!(registry.acquire(&service).is_ok());
}

#[test]
fn different_services_do_not_conflict() {
    let registry = ActiveDeployments::new();
    let web = ServiceName::new("web").unwrap();
    let api = ServiceName::new("api").unwrap();

    let _web_ticket = registry.acquire(&web).unwrap();
    assert!(registry.acquire(&api).is_ok());
}

/// A second execute against the same service fails with Conflict while the
/// first is mid-flight, and the record of the first is unaffected.
#[tokio::test(start_paused = true)]
async fn concurrent_execute_is_rejected() {
    let platform = SimPlatform::new();
    let mut config = support::test_config(ShiftMode::Canary);
    let topology = platform.provision(&config).unwrap();
    config.image = config.image.with_tag("v2");

    let registry = ActiveDeployments::new();
    let slots = topology.slots.clone();
    let handle = support::spawn_execute(
        config.clone(),
        &platform,
        topology.slots,
        &registry,
        Gates::default(),
    );

    // First deployment is inside its canary hold.
    tokio::time::sleep(Duration::from_secs(30)).await;

    let err = cutover::deploy::execute(
        config,
        &platform,
        slots,
        &registry,
        Gates::default(),
        None,
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), DeployErrorKind::Conflict);

    // The first run is unaffected and completes.
    let record = handle.await.unwrap().unwrap();
    assert!(record.status.is_terminal());
}
