use crate::error::{LineageError, LineageResult};
use crate::types::{LineageEdge, LineageNode, NodeId};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Graph traversal utilities for lineage analysis
pub struct GraphTraversal;

impl GraphTraversal {
    /// Breadth-first search collecting every node reachable from the start
    /// nodes, start nodes included
    pub fn bfs_reachable(
        graph: &DiGraph<LineageNode, LineageEdge>,
        start_nodes: &[NodeId],
        direction: TraversalDirection,
    ) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();

        for &node in start_nodes {
            if node < graph.node_count() && visited.insert(node) {
                queue.push_back(NodeIndex::new(node));
            }
        }

        while let Some(current) = queue.pop_front() {
            for neighbor in Self::sorted_neighbors(graph, current, direction.into()) {
                if visited.insert(neighbor.index()) {
                    queue.push_back(neighbor);
                }
            }
        }

        visited
    }

    /// Shortest directed path (by edge count) between two nodes.
    ///
    /// Neighbours are expanded in ascending id order, so among several
    /// shortest paths the one through the lowest ids is returned.
    pub fn shortest_path(
        graph: &DiGraph<LineageNode, LineageEdge>,
        from: NodeId,
        to: NodeId,
    ) -> Option<Vec<NodeId>> {
        let from_index = NodeIndex::new(from);
        let to_index = NodeIndex::new(to);

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        queue.push_back(from_index);
        visited.insert(from_index);

        while let Some(current) = queue.pop_front() {
            if current == to_index {
                let mut path = vec![to];
                let mut cursor = to_index;
                while let Some(&prev) = parent.get(&cursor) {
                    path.push(prev.index());
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }

            for neighbor in Self::sorted_neighbors(graph, current, Direction::Outgoing) {
                // Insertion order is topological, nothing past the target can reach it
                if neighbor.index() > to {
                    continue;
                }
                if visited.insert(neighbor) {
                    parent.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    /// Walk from `node` towards a root, always stepping to the lowest-id
    /// parent. The returned chain starts at `node` and ends at a root.
    pub fn first_parent_chain(
        graph: &DiGraph<LineageNode, LineageEdge>,
        node: NodeId,
    ) -> LineageResult<Vec<NodeId>> {
        let mut chain = vec![node];
        let mut current = NodeIndex::new(node);

        while let Some(parent) = graph
            .neighbors_directed(current, Direction::Incoming)
            .min()
        {
            if chain.len() > graph.node_count() {
                return Err(LineageError::GraphInvariantViolation {
                    reason: format!("cycle detected while walking ancestors of node {}", node),
                });
            }
            chain.push(parent.index());
            current = parent;
        }

        Ok(chain)
    }

    /// Fail if the graph contains a directed cycle
    pub fn ensure_acyclic(graph: &DiGraph<LineageNode, LineageEdge>) -> LineageResult<()> {
        toposort(graph, None)
            .map(|_| ())
            .map_err(|cycle| LineageError::GraphInvariantViolation {
                reason: format!("cycle detected at node {}", cycle.node_id().index()),
            })
    }

    fn sorted_neighbors(
        graph: &DiGraph<LineageNode, LineageEdge>,
        node: NodeIndex,
        direction: Direction,
    ) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = graph.neighbors_directed(node, direction).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Towards ancestors
    Upstream,
    /// Towards descendants
    Downstream,
}

impl From<TraversalDirection> for Direction {
    fn from(direction: TraversalDirection) -> Self {
        match direction {
            TraversalDirection::Upstream => Direction::Incoming,
            TraversalDirection::Downstream => Direction::Outgoing,
        }
    }
}
