// ABOUTME: The blue/green traffic slot pair: a fixed two-slot ring with swap.
// ABOUTME: The type itself enforces a single live production destination.

use crate::types::{ListenerId, TargetGroupId};

/// A listener bound to a front-door port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBinding {
    pub listener: ListenerId,
    pub port: u16,
}

impl ListenerBinding {
    pub fn new(listener: ListenerId, port: u16) -> Self {
        Self { listener, port }
    }
}

/// The tagged {current, candidate} pair of target groups behind one
/// load balancer, plus the two listeners that front them.
///
/// Deliberately not a list: there are exactly two slots, exactly one of
/// which serves production at any instant. Completing a deployment swaps
/// which target group is "current"; the listeners keep their roles (the
/// production listener stays on its port, the test listener on its own),
/// so the swap is invisible to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficSlots {
    production: ListenerBinding,
    test: ListenerBinding,
    current: TargetGroupId,
    candidate: TargetGroupId,
}

impl TrafficSlots {
    pub fn new(
        production: ListenerBinding,
        test: ListenerBinding,
        current: TargetGroupId,
        candidate: TargetGroupId,
    ) -> Self {
        Self {
            production,
            test,
            current,
            candidate,
        }
    }

    /// The target group serving production ("blue").
    pub fn current(&self) -> &TargetGroupId {
        &self.current
    }

    /// The idle target group a candidate deploys into ("green").
    pub fn candidate(&self) -> &TargetGroupId {
        &self.candidate
    }

    /// The listener whose forwarding rule the shift loop mutates.
    pub fn production_listener(&self) -> &ListenerId {
        &self.production.listener
    }

    pub fn production_port(&self) -> u16 {
        self.production.port
    }

    /// The out-of-band listener that points 100% at the candidate.
    pub fn test_listener(&self) -> &ListenerId {
        &self.test.listener
    }

    pub fn test_port(&self) -> u16 {
        self.test.port
    }

    /// Swap designations: the candidate target group becomes the current.
    pub fn promote(self) -> Self {
        Self {
            production: self.production,
            test: self.test,
            current: self.candidate,
            candidate: self.current,
        }
    }
}
