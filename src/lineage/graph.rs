use crate::error::{LineageError, LineageResult};
use crate::lineage::traversal::{GraphTraversal, TraversalDirection};
use crate::types::{EdgeKind, EdgeView, Individual, LineageEdge, LineageNode, NodeId, NodeView};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde_json::Value;
use tracing::debug;

/// Genealogy of a population, backed by a petgraph DiGraph.
///
/// Node ids are the petgraph indices: nodes are never removed, so ids stay
/// dense and equal to insertion order, and every edge points from an older
/// node to a newer one.
#[derive(Debug, Clone, Default)]
pub struct LineageTracker {
    graph: DiGraph<LineageNode, LineageEdge>,
}

impl LineageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new individual and its crossover edges from `parents`.
    ///
    /// Every call creates a distinct node, even for equal arguments. Repeated
    /// parent ids within one call produce a single edge.
    pub fn add_individual(
        &mut self,
        individual: Individual,
        parents: &[NodeId],
        mutation_info: Option<Value>,
        generation: Option<u64>,
    ) -> LineageResult<NodeId> {
        let node_id = self.graph.node_count();

        // Validate before mutating so a bad reference leaves the graph untouched
        for &parent in parents {
            self.check_node(parent)?;
        }

        let index = self.graph.add_node(LineageNode {
            id: node_id,
            fitness: individual.fitness,
            details: individual,
            generation,
            mutation: mutation_info,
        });

        for &parent in parents {
            self.graph.update_edge(
                NodeIndex::new(parent),
                index,
                LineageEdge {
                    kind: EdgeKind::Crossover,
                },
            );
        }

        debug!(
            "Added individual {} with {} parent(s), generation {:?}",
            node_id,
            parents.len(),
            generation
        );
        Ok(node_id)
    }

    /// Attach mutation metadata to an existing node
    pub fn attach_mutation(&mut self, node_id: NodeId, info: Value) -> LineageResult<()> {
        self.check_node(node_id)?;
        if let Some(node) = self.graph.node_weight_mut(NodeIndex::new(node_id)) {
            node.mutation = Some(info);
        }
        Ok(())
    }

    /// Record an explicit derivation edge. Parents must be older than children.
    pub fn record_derivation(
        &mut self,
        parent: NodeId,
        child: NodeId,
        kind: EdgeKind,
    ) -> LineageResult<()> {
        self.check_node(parent)?;
        self.check_node(child)?;

        if parent >= child {
            return Err(LineageError::GraphInvariantViolation {
                reason: format!(
                    "edge {} -> {} does not follow insertion order",
                    parent, child
                ),
            });
        }

        self.graph
            .update_edge(NodeIndex::new(parent), NodeIndex::new(child), LineageEdge { kind });
        Ok(())
    }

    /// Path from a root ancestor to `target`.
    ///
    /// Roots are tried in ascending id order and the first one with a
    /// directed path wins; the shortest such path is returned. `Ok(None)`
    /// means no tracked root reaches the target.
    pub fn path_from_root(&self, target: NodeId) -> LineageResult<Option<Vec<NodeId>>> {
        self.check_node(target)?;
        GraphTraversal::ensure_acyclic(&self.graph)?;

        for root in self.roots() {
            if root > target {
                break;
            }
            if let Some(path) = GraphTraversal::shortest_path(&self.graph, root, target) {
                debug!("Resolved path of length {} from root {} to {}", path.len(), root, target);
                return Ok(Some(path));
            }
        }

        debug!("No root path found for node {}", target);
        Ok(None)
    }

    /// Generation of a node: its explicit generation when one was recorded,
    /// otherwise the number of hops to a root following lowest-id parents.
    pub fn generation_of(&self, node_id: NodeId) -> LineageResult<u64> {
        let node = self.node(node_id)?;
        if let Some(generation) = node.generation {
            return Ok(generation);
        }

        let chain = GraphTraversal::first_parent_chain(&self.graph, node_id)?;
        Ok((chain.len() - 1) as u64)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node(&self, node_id: NodeId) -> LineageResult<&LineageNode> {
        self.check_node(node_id)?;
        self.graph
            .node_weight(NodeIndex::new(node_id))
            .ok_or(LineageError::InvalidReference {
                node: node_id,
                population: self.len(),
            })
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &LineageNode> {
        self.graph.raw_nodes().iter().map(|node| &node.weight)
    }

    /// All edges, sorted by (parent, child)
    pub fn edges(&self) -> Vec<EdgeView> {
        let mut edges: Vec<EdgeView> = self
            .graph
            .edge_references()
            .map(|edge| EdgeView {
                parent: edge.source().index(),
                child: edge.target().index(),
                kind: edge.weight().kind,
            })
            .collect();
        edges.sort_by_key(|edge| (edge.parent, edge.child));
        edges
    }

    /// Nodes with no recorded parents, ascending
    pub fn roots(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|index| index.index())
            .collect()
    }

    /// Nodes with no recorded children, ascending
    pub fn leaves(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|index| index.index())
            .collect()
    }

    pub fn parents(&self, node_id: NodeId) -> LineageResult<Vec<NodeId>> {
        self.direct_neighbors(node_id, Direction::Incoming)
    }

    pub fn children(&self, node_id: NodeId) -> LineageResult<Vec<NodeId>> {
        self.direct_neighbors(node_id, Direction::Outgoing)
    }

    /// Every node the given node descends from, ascending
    pub fn ancestors(&self, node_id: NodeId) -> LineageResult<Vec<NodeId>> {
        self.check_node(node_id)?;
        let mut ancestors =
            GraphTraversal::bfs_reachable(&self.graph, &[node_id], TraversalDirection::Upstream);
        ancestors.remove(&node_id);
        debug!("Found {} ancestors for node {}", ancestors.len(), node_id);
        Ok(ancestors.into_iter().collect())
    }

    /// Every node derived from the given node, ascending
    pub fn descendants(&self, node_id: NodeId) -> LineageResult<Vec<NodeId>> {
        self.check_node(node_id)?;
        let mut descendants =
            GraphTraversal::bfs_reachable(&self.graph, &[node_id], TraversalDirection::Downstream);
        descendants.remove(&node_id);
        debug!("Found {} descendants for node {}", descendants.len(), node_id);
        Ok(descendants.into_iter().collect())
    }

    /// Fittest individual; the lowest id wins ties
    pub fn best_individual(&self) -> Option<NodeId> {
        self.nodes()
            .fold(None, |best: Option<&LineageNode>, node| match best {
                Some(current) if current.fitness >= node.fitness => Some(current),
                _ => Some(node),
            })
            .map(|node| node.id)
    }

    /// Renderer-facing copy of every node, with resolved generations
    pub fn node_views(&self) -> LineageResult<Vec<NodeView>> {
        self.nodes()
            .map(|node| {
                Ok(NodeView {
                    id: node.id,
                    fitness: node.fitness,
                    generation: self.generation_of(node.id)?,
                    mutation: node.mutation.clone(),
                })
            })
            .collect()
    }

    fn direct_neighbors(&self, node_id: NodeId, direction: Direction) -> LineageResult<Vec<NodeId>> {
        self.check_node(node_id)?;
        let mut neighbors: Vec<NodeId> = self
            .graph
            .neighbors_directed(NodeIndex::new(node_id), direction)
            .map(|index| index.index())
            .collect();
        neighbors.sort_unstable();
        Ok(neighbors)
    }

    fn check_node(&self, node_id: NodeId) -> LineageResult<()> {
        if node_id < self.graph.node_count() {
            Ok(())
        } else {
            Err(LineageError::InvalidReference {
                node: node_id,
                population: self.graph.node_count(),
            })
        }
    }
}
