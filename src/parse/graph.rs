//! petgraph-based index over a workspace snapshot.
//!
//! The snapshot arrives as flat id-keyed arrays. `PolicyGraph` indexes it once
//! per resolution pass so that every incomer/outgoer lookup is a neighbour
//! walk instead of a scan of the edge array.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, warn};

use super::types::{FunctionSpec, PolicyEdge, PolicyNode, WorkspaceState};

pub struct PolicyGraph<'a> {
    pub graph: DiGraph<&'a str, &'a PolicyEdge>,
    pub node_indices: HashMap<&'a str, NodeIndex>,
    nodes: HashMap<&'a str, &'a PolicyNode>,
    state: &'a WorkspaceState,
}

/// Nodes and edges belonging to one policy, in snapshot order.
#[derive(Debug, Clone)]
pub struct SubFlow<'a> {
    pub nodes: Vec<&'a PolicyNode>,
    pub edges: Vec<&'a PolicyEdge>,
}

impl<'a> SubFlow<'a> {
    pub fn node_ids(&self) -> Vec<&'a str> {
        self.nodes.iter().map(|n| n.id()).collect()
    }

    pub fn edge_ids(&self) -> Vec<&'a str> {
        self.edges.iter().map(|e| e.id.as_str()).collect()
    }
}

impl<'a> PolicyGraph<'a> {
    pub fn build(state: &'a WorkspaceState) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut nodes = HashMap::new();

        for node in &state.nodes {
            let idx = graph.add_node(node.id());
            node_indices.insert(node.id(), idx);
            nodes.insert(node.id(), node);
        }

        // Edge indices grow in array order; lookups sort on them to keep
        // the designer's edge order.
        for edge in &state.edges {
            match (
                node_indices.get(edge.source.as_str()),
                node_indices.get(edge.target.as_str()),
            ) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(s, t, edge);
                }
                _ => warn!(
                    edge = %edge.id,
                    source = %edge.source,
                    target = %edge.target,
                    "Skipping edge with a dangling endpoint"
                ),
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Indexed workspace snapshot"
        );

        PolicyGraph {
            graph,
            node_indices,
            nodes,
            state,
        }
    }

    pub fn state(&self) -> &'a WorkspaceState {
        self.state
    }

    pub fn node(&self, id: &str) -> Option<&'a PolicyNode> {
        self.nodes.get(id).copied()
    }

    pub fn function(&self, function_id: &str) -> Option<&'a FunctionSpec> {
        self.state.function(function_id)
    }

    /// Predecessors of `node_id`, optionally restricted to edges entering
    /// through `handle`. Each node appears once, at its first edge in the
    /// edge array.
    pub fn incomers(&self, node_id: &str, handle: Option<&str>) -> Vec<&'a PolicyNode> {
        self.neighbours(node_id, handle, Direction::Incoming)
    }

    /// Successors of `node_id`, optionally restricted to edges leaving
    /// through `handle`. Each node appears once, at its first edge in the
    /// edge array.
    pub fn outgoers(&self, node_id: &str, handle: Option<&str>) -> Vec<&'a PolicyNode> {
        self.neighbours(node_id, handle, Direction::Outgoing)
    }

    fn neighbours(
        &self,
        node_id: &str,
        handle: Option<&str>,
        direction: Direction,
    ) -> Vec<&'a PolicyNode> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };

        let mut edges: Vec<_> = self.graph.edges_directed(idx, direction).collect();
        edges.sort_by_key(|e| e.id());

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .filter(|e| {
                let edge_handle = match direction {
                    Direction::Incoming => e.weight().target_handle.as_deref(),
                    Direction::Outgoing => e.weight().source_handle.as_deref(),
                };
                handle.is_none_or(|h| edge_handle == Some(h))
            })
            .filter_map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                if !seen.insert(other) {
                    return None;
                }
                self.node(self.graph[other])
            })
            .collect()
    }

    /// Connected component around `source_id`, walked in both directions.
    ///
    /// Other policy nodes are not entered, so adjacent policies sharing a
    /// filter or a schema keep their own sub-flows.
    pub fn sub_flow(&self, source_id: &str) -> SubFlow<'a> {
        let Some(&start) = self.node_indices.get(source_id) else {
            return SubFlow {
                nodes: vec![],
                edges: vec![],
            };
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut member_edges: HashSet<EdgeIndex> = HashSet::new();
        let mut worklist = VecDeque::from([start]);

        while let Some(current) = worklist.pop_front() {
            let incident = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .chain(self.graph.edges_directed(current, Direction::Incoming));

            for edge in incident {
                let other = if edge.source() == current {
                    edge.target()
                } else {
                    edge.source()
                };

                if other != start
                    && self
                        .node(self.graph[other])
                        .is_some_and(|n| n.is_policy())
                {
                    continue;
                }

                member_edges.insert(edge.id());
                if visited.insert(other) {
                    worklist.push_back(other);
                }
            }
        }

        let nodes = self
            .state
            .nodes
            .iter()
            .filter(|n| {
                self.node_indices
                    .get(n.id())
                    .is_some_and(|idx| visited.contains(idx))
            })
            .collect();

        let mut edges: Vec<_> = member_edges.into_iter().collect();
        edges.sort();
        let edges = edges.into_iter().map(|e| self.graph[e]).collect();

        SubFlow { nodes, edges }
    }
}
