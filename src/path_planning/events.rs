//! Change notifications emitted while the tree grows
//!
//! The planners never draw anything themselves; a renderer or frame
//! recorder subscribes to these events instead.

use crate::common::Point2D;
use crate::path_planning::tree::NodeHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerEvent {
    /// A node was added to the tree
    NodeInserted {
        node: NodeHandle,
        parent: NodeHandle,
        position: Point2D,
        cost: f64,
    },
    /// An existing node moved to a cheaper parent
    NodeRewired {
        node: NodeHandle,
        old_parent: NodeHandle,
        new_parent: NodeHandle,
        old_cost: f64,
        new_cost: f64,
    },
    /// The goal node was attached below `parent`
    GoalReached {
        goal: NodeHandle,
        parent: NodeHandle,
        cost: f64,
    },
    /// The final start -> goal path was extracted
    PathExtracted {
        waypoints: Vec<Point2D>,
        cost: f64,
    },
}

/// Subscriber for [`PlannerEvent`]s
pub trait PlannerObserver {
    fn on_event(&mut self, event: &PlannerEvent);
}

impl<F: FnMut(&PlannerEvent)> PlannerObserver for F {
    fn on_event(&mut self, event: &PlannerEvent) {
        self(event)
    }
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PlannerObserver for NullObserver {
    fn on_event(&mut self, _event: &PlannerEvent) {}
}

/// Observer that keeps every event, in order
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    pub events: Vec<PlannerEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insertions(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, PlannerEvent::NodeInserted { .. })).count()
    }

    pub fn rewires(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, PlannerEvent::NodeRewired { .. })).count()
    }
}

impl PlannerObserver for EventRecorder {
    fn on_event(&mut self, event: &PlannerEvent) {
        self.events.push(event.clone());
    }
}
