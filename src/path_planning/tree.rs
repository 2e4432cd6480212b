//! Arena-backed search tree for RRT*
//!
//! All nodes live in one growable vector and refer to each other through
//! [`NodeHandle`] indices, so re-parenting is a couple of index updates and
//! never transfers ownership. Nodes are never removed; a new plan starts
//! from a fresh tree.

use crate::common::{PlanningError, PlanningResult, Point2D};

/// Relative tolerance used when checking `cost == parent.cost + edge`
const COST_TOLERANCE: f64 = 1e-6;

/// Stable index of a node inside a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One explored configuration
#[derive(Debug, Clone)]
pub struct PlanningNode {
    position: Point2D,
    cost: f64,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    is_start: bool,
    is_goal: bool,
}

impl PlanningNode {
    fn new(position: Point2D, cost: f64, parent: Option<NodeHandle>) -> Self {
        PlanningNode {
            position,
            cost,
            parent,
            children: Vec::new(),
            is_start: false,
            is_goal: false,
        }
    }

    pub fn position(&self) -> Point2D {
        self.position
    }

    /// Path length from the root along tree edges
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn is_start(&self) -> bool {
        self.is_start
    }

    pub fn is_goal(&self) -> bool {
        self.is_goal
    }
}

/// Rooted tree of planning nodes
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<PlanningNode>,
    capacity: Option<usize>,
}

impl Tree {
    /// Tree holding only the start node (cost 0)
    pub fn with_root(start: Point2D) -> Self {
        let mut root = PlanningNode::new(start, 0.0, None);
        root.is_start = true;
        Tree { nodes: vec![root], capacity: None }
    }

    /// Tree that refuses to grow past `capacity` nodes
    pub fn with_capacity_limit(start: Point2D, capacity: usize) -> Self {
        let mut tree = Self::with_root(start);
        tree.capacity = Some(capacity.max(1));
        tree.nodes.reserve(capacity.saturating_sub(1).min(1 << 16));
        tree
    }

    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds its root
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&PlanningNode> {
        self.nodes.get(handle.0)
    }

    /// Like [`Tree::get`], but a stale handle is reported as a broken invariant
    pub fn node(&self, handle: NodeHandle) -> PlanningResult<&PlanningNode> {
        self.get(handle).ok_or_else(|| {
            PlanningError::InvariantViolation(format!(
                "handle {} out of range for tree of {} nodes",
                handle.0,
                self.nodes.len()
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &PlanningNode)> + '_ {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeHandle(i), n))
    }

    /// Node closest to `point`; ties go to the earliest inserted node.
    pub fn nearest(&self, point: &Point2D) -> NodeHandle {
        let mut min_dist = f64::INFINITY;
        let mut nearest = 0;

        for (i, node) in self.nodes.iter().enumerate() {
            let dist = node.position.distance_squared(point);
            if dist < min_dist {
                min_dist = dist;
                nearest = i;
            }
        }

        NodeHandle(nearest)
    }

    /// All nodes at distance `<= radius` from `point`
    pub fn within_radius(&self, point: &Point2D, radius: f64) -> Vec<NodeHandle> {
        let r_sq = radius * radius;
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.position.distance_squared(point) <= r_sq)
            .map(|(i, _)| NodeHandle(i))
            .collect()
    }

    /// Add a node below `parent` with the given path cost.
    pub fn insert(&mut self, position: Point2D, parent: NodeHandle, cost: f64) -> PlanningResult<NodeHandle> {
        self.node(parent)?;
        if let Some(capacity) = self.capacity {
            if self.nodes.len() >= capacity {
                return Err(PlanningError::CapacityExhausted { capacity });
            }
        }

        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(PlanningNode::new(position, cost, Some(parent)));
        self.nodes[parent.0].children.push(handle);
        Ok(handle)
    }

    /// Add the goal node below `parent`, costed by the connecting edge.
    pub fn attach_goal(&mut self, goal: Point2D, parent: NodeHandle) -> PlanningResult<NodeHandle> {
        let parent_node = self.node(parent)?;
        let cost = parent_node.cost + parent_node.position.distance(&goal);
        let handle = self.insert(goal, parent, cost)?;
        self.nodes[handle.0].is_goal = true;
        Ok(handle)
    }

    /// Move `child` under `new_parent` and give it `new_cost`.
    ///
    /// Every check runs before any mutation, so on error the tree is
    /// untouched. Returns the previous parent.
    pub fn reparent(&mut self, child: NodeHandle, new_parent: NodeHandle, new_cost: f64) -> PlanningResult<NodeHandle> {
        let old_parent = self.node(child)?.parent.ok_or_else(|| {
            PlanningError::InvariantViolation("the root cannot be re-parented".to_string())
        })?;
        self.node(new_parent)?;

        if self.is_ancestor_or_self(child, new_parent)? {
            return Err(PlanningError::InvariantViolation(format!(
                "re-parenting node {} under its descendant {} would create a cycle",
                child.0, new_parent.0
            )));
        }

        let slot = self.nodes[old_parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| {
                PlanningError::InvariantViolation(format!(
                    "node {} is missing from the children of its parent {}",
                    child.0, old_parent.0
                ))
            })?;

        self.nodes[old_parent.0].children.swap_remove(slot);
        self.nodes[new_parent.0].children.push(child);
        let node = &mut self.nodes[child.0];
        node.parent = Some(new_parent);
        node.cost = new_cost;
        Ok(old_parent)
    }

    /// Recompute the cost of every descendant of `root` from its parent.
    ///
    /// Depth-first with an explicit stack. Visiting more nodes than the tree
    /// holds means the children relation has a cycle. Returns the number of
    /// updated nodes.
    pub fn propagate_cost(&mut self, root: NodeHandle) -> PlanningResult<usize> {
        self.node(root)?;
        let limit = self.nodes.len();
        let mut stack: Vec<NodeHandle> = self.nodes[root.0].children.clone();
        let mut updated = 0;

        while let Some(handle) = stack.pop() {
            updated += 1;
            if updated > limit {
                return Err(PlanningError::InvariantViolation(format!(
                    "cost propagation from node {} visited more than {} nodes; the tree has a cycle",
                    root.0, limit
                )));
            }

            let parent = self.node(handle)?.parent.ok_or_else(|| {
                PlanningError::InvariantViolation(format!("child {} has no parent", handle.0))
            })?;
            let parent_node = self.node(parent)?;
            let cost = parent_node.cost + parent_node.position.distance(&self.nodes[handle.0].position);

            let node = &mut self.nodes[handle.0];
            node.cost = cost;
            stack.extend_from_slice(&node.children);
        }

        Ok(updated)
    }

    /// Parent -> child pairs of every edge
    pub fn edges(&self) -> Vec<(NodeHandle, NodeHandle)> {
        self.iter()
            .filter_map(|(handle, node)| node.parent.map(|parent| (parent, handle)))
            .collect()
    }

    /// Edges as position pairs, for drawing
    pub fn edge_segments(&self) -> Vec<(Point2D, Point2D)> {
        self.edges()
            .into_iter()
            .map(|(parent, child)| (self.nodes[parent.0].position, self.nodes[child.0].position))
            .collect()
    }

    /// Handles from the root down to `handle`, inclusive.
    pub fn path_from_root(&self, handle: NodeHandle) -> PlanningResult<Vec<NodeHandle>> {
        let mut path = vec![handle];
        let mut current = self.node(handle)?;

        while let Some(parent) = current.parent {
            if path.len() > self.nodes.len() {
                return Err(PlanningError::InvariantViolation(format!(
                    "parent chain of node {} is longer than the tree",
                    handle.0
                )));
            }
            path.push(parent);
            current = self.node(parent)?;
        }

        if path.last() != Some(&self.root()) {
            return Err(PlanningError::InvariantViolation(format!(
                "parent chain of node {} ends away from the root",
                handle.0
            )));
        }

        path.reverse();
        Ok(path)
    }

    /// Number of edges between `handle` and the root
    pub fn depth(&self, handle: NodeHandle) -> PlanningResult<usize> {
        Ok(self.path_from_root(handle)?.len() - 1)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeHandle, handle: NodeHandle) -> PlanningResult<bool> {
        let mut current = Some(handle);
        let mut steps = 0;
        while let Some(h) = current {
            if h == ancestor {
                return Ok(true);
            }
            steps += 1;
            if steps > self.nodes.len() {
                return Err(PlanningError::InvariantViolation(format!(
                    "parent chain of node {} does not reach the root",
                    handle.0
                )));
            }
            current = self.node(h)?.parent;
        }
        Ok(false)
    }

    /// Full structural check: single root, parent/children agreement,
    /// acyclic and connected, costs consistent with edge lengths.
    pub fn validate(&self) -> PlanningResult<()> {
        let violation = |msg: String| Err(PlanningError::InvariantViolation(msg));

        let root = &self.nodes[0];
        if root.parent.is_some() || !root.is_start || root.cost != 0.0 {
            return violation("root must be the start node with cost 0 and no parent".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            let parent = match node.parent {
                Some(p) => p,
                None => return violation(format!("node {} has no parent", i)),
            };
            let parent_node = match self.nodes.get(parent.0) {
                Some(p) => p,
                None => return violation(format!("node {} points at missing parent {}", i, parent.0)),
            };
            let listed = parent_node.children.iter().filter(|c| c.0 == i).count();
            if listed != 1 {
                return violation(format!(
                    "node {} appears {} times among the children of {}",
                    i, listed, parent.0
                ));
            }

            let expected = parent_node.cost + parent_node.position.distance(&node.position);
            if (node.cost - expected).abs() > COST_TOLERANCE * expected.abs().max(1.0) {
                return violation(format!(
                    "node {} has cost {} but its parent edge implies {}",
                    i, node.cost, expected
                ));
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                match self.nodes.get(child.0) {
                    Some(c) if c.parent == Some(NodeHandle(i)) => {}
                    _ => return violation(format!("node {} lists {} as a child it does not own", i, child.0)),
                }
            }
        }

        // Walk down from the root; every node must be reached exactly once
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root()];
        let mut reached = 0;
        while let Some(handle) = stack.pop() {
            if seen[handle.0] {
                return violation(format!("node {} is reachable twice from the root", handle.0));
            }
            seen[handle.0] = true;
            reached += 1;
            stack.extend_from_slice(&self.nodes[handle.0].children);
        }
        if reached != self.nodes.len() {
            return violation(format!(
                "only {} of {} nodes are reachable from the root",
                reached,
                self.nodes.len()
            ));
        }

        Ok(())
    }
}
