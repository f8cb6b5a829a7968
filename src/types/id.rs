// ABOUTME: Phantom-typed identifiers for compile-time type safety.
// ABOUTME: Prevents mixing cluster, task set, target group, and listener IDs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Empty enums cannot be instantiated and need no trait bounds.
pub enum ClusterMarker {}
pub enum TaskSetMarker {}
pub enum TargetGroupMarker {}
pub enum ListenerMarker {}
pub enum LoadBalancerMarker {}

/// A type-safe resource identifier.
///
/// The orchestrator threads IDs between the compute side and the balancer
/// side instead of live object handles. Phantom typing means a
/// `TargetGroupId` can never be passed where a `ListenerId` is expected.
#[must_use = "IDs reference provisioned resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// T is only a marker, so the usual derives would put an unwanted `T: Trait`
// bound on every impl. Implement by hand against the inner string instead.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}

pub type ClusterId = Id<ClusterMarker>;
pub type TaskSetId = Id<TaskSetMarker>;
pub type TargetGroupId = Id<TargetGroupMarker>;
pub type ListenerId = Id<ListenerMarker>;
pub type LoadBalancerId = Id<LoadBalancerMarker>;
