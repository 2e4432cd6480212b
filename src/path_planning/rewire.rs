//! RRT* parent selection and neighbourhood rewiring

use log::trace;

use crate::common::{PlanningResult, Point2D};
use crate::environment::{CollisionMode, ObstacleField};
use crate::path_planning::events::{PlannerEvent, PlannerObserver};
use crate::path_planning::tree::{NodeHandle, Tree};

/// Parent picked for a node that is about to be inserted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentChoice {
    pub parent: NodeHandle,
    pub cost: f64,
    /// False when no valid neighbour existed and the fallback was used
    pub from_neighborhood: bool,
}

/// Cheapest valid parent for `position` among `neighbors`.
///
/// Cost of a candidate is `candidate.cost + |candidate - position|`; edges
/// blocked under `mode` are skipped. With no usable neighbour, `fallback`
/// (the node the candidate was steered from) becomes the parent.
pub fn choose_parent(
    tree: &Tree,
    field: &ObstacleField,
    mode: CollisionMode,
    position: &Point2D,
    neighbors: &[NodeHandle],
    fallback: NodeHandle,
) -> PlanningResult<ParentChoice> {
    let mut best: Option<(NodeHandle, f64)> = None;

    for &handle in neighbors {
        let node = tree.node(handle)?;
        let cost = node.cost() + node.position().distance(position);
        if best.map_or(true, |(_, best_cost)| cost < best_cost)
            && field.edge_is_free(&node.position(), position, mode)
        {
            best = Some((handle, cost));
        }
    }

    match best {
        Some((parent, cost)) => Ok(ParentChoice { parent, cost, from_neighborhood: true }),
        None => {
            let node = tree.node(fallback)?;
            Ok(ParentChoice {
                parent: fallback,
                cost: node.cost() + node.position().distance(position),
                from_neighborhood: false,
            })
        }
    }
}

/// Re-parent every neighbour that becomes strictly cheaper through `new_node`,
/// then refresh the costs of its subtree. Returns the number of rewired nodes.
pub fn rewire_neighbors<O: PlannerObserver + ?Sized>(
    tree: &mut Tree,
    field: &ObstacleField,
    mode: CollisionMode,
    new_node: NodeHandle,
    neighbors: &[NodeHandle],
    observer: &mut O,
) -> PlanningResult<usize> {
    let (new_position, new_cost, new_parent) = {
        let node = tree.node(new_node)?;
        (node.position(), node.cost(), node.parent())
    };
    let mut rewired = 0;

    for &handle in neighbors {
        if handle == new_node || Some(handle) == new_parent {
            continue;
        }

        let (position, old_cost) = {
            let node = tree.node(handle)?;
            (node.position(), node.cost())
        };
        let candidate = new_cost + new_position.distance(&position);
        if candidate >= old_cost || !field.edge_is_free(&new_position, &position, mode) {
            continue;
        }

        let old_parent = tree.reparent(handle, new_node, candidate)?;
        let updated = tree.propagate_cost(handle)?;
        rewired += 1;

        trace!(
            "rewired node {} from {} to {}: cost {:.3} -> {:.3} ({} descendants updated)",
            handle.index(),
            old_parent.index(),
            new_node.index(),
            old_cost,
            candidate,
            updated
        );
        observer.on_event(&PlannerEvent::NodeRewired {
            node: handle,
            old_parent,
            new_parent: new_node,
            old_cost,
            new_cost: candidate,
        });
    }

    Ok(rewired)
}
