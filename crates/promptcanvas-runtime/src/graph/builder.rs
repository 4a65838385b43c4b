//! Dependency graph builder.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::canvas::{Edge, Node, NodeId, NodeRole};
use crate::error::{Error, Result};

/// Tracing target for graph construction.
const TRACING_TARGET: &str = "promptcanvas_runtime::graph";

/// Immutable dependency snapshot of one canvas.
///
/// Built fresh for every run and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Nodes by id.
    nodes: HashMap<NodeId, Node>,
    /// Node ids in document order.
    node_order: Vec<NodeId>,
    /// Edges whose endpoints both exist, in document order.
    edges: Vec<Edge>,
    /// Predecessors of each node, in edge order.
    predecessors: HashMap<NodeId, Vec<NodeId>>,
    /// Every node id, upstream before downstream.
    topo_order: Vec<NodeId>,
}

impl DependencyGraph {
    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    /// Returns whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.node_order.is_empty()
    }

    /// Returns a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns all nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Returns the kept edges in document order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the predecessors of a node.
    pub fn predecessors(&self, id: &NodeId) -> &[NodeId] {
        self.predecessors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the predecessor nodes of a node.
    pub fn predecessor_nodes(&self, id: &NodeId) -> impl Iterator<Item = &Node> {
        self.predecessors(id)
            .iter()
            .filter_map(|p| self.nodes.get(p))
    }

    /// Returns the nodes that list `id` as a predecessor, in document order.
    pub fn successor_nodes<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes().filter(move |n| self.predecessors(&n.id).contains(id))
    }

    /// Returns node ids in topological order.
    pub fn topo_order(&self) -> &[NodeId] {
        &self.topo_order
    }
}

/// Builds [`DependencyGraph`]s from canvas contents.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    splice_inputs: bool,
}

impl GraphBuilder {
    /// Creates a builder that splices out Input nodes.
    pub fn new() -> Self {
        Self {
            splice_inputs: true,
        }
    }

    /// Enables or disables splicing of Input nodes.
    pub fn with_input_splicing(mut self, enabled: bool) -> Self {
        self.splice_inputs = enabled;
        self
    }

    /// Builds the dependency graph of one canvas.
    ///
    /// Edges referencing absent nodes are dropped. Returns an error if the
    /// remaining graph contains a cycle.
    pub fn build(&self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::default();

        for node in nodes {
            if graph.nodes.contains_key(&node.id) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    node_id = %node.id,
                    "duplicate node id, keeping the first"
                );
                continue;
            }
            graph.node_order.push(node.id.clone());
            graph.nodes.insert(node.id.clone(), node);
        }

        let mut dropped = 0usize;
        for edge in edges {
            if !graph.nodes.contains_key(&edge.source) || !graph.nodes.contains_key(&edge.target) {
                dropped += 1;
                continue;
            }
            graph
                .predecessors
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
            graph.edges.push(edge);
        }

        if self.splice_inputs {
            splice_input_nodes(&mut graph);
        }

        graph.topo_order = topological_order(&graph)?;

        tracing::debug!(
            target: TRACING_TARGET,
            node_count = graph.node_order.len(),
            edge_count = graph.edges.len(),
            dropped_edges = dropped,
            "dependency graph built"
        );

        Ok(graph)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewires consumers of every Input node to the Input's own predecessors.
fn splice_input_nodes(graph: &mut DependencyGraph) {
    let inputs: Vec<NodeId> = graph
        .node_order
        .iter()
        .filter(|id| graph.nodes[*id].role == NodeRole::Input)
        .cloned()
        .collect();

    for input in inputs {
        let feeding = graph.predecessors.remove(&input).unwrap_or_default();

        for (consumer, preds) in graph.predecessors.iter_mut() {
            if !preds.contains(&input) {
                continue;
            }

            let mut seen = HashSet::new();
            let mut spliced = Vec::with_capacity(preds.len() + feeding.len());
            for pred in preds.iter() {
                let candidates = if pred == &input {
                    feeding.as_slice()
                } else {
                    std::slice::from_ref(pred)
                };
                for candidate in candidates {
                    if candidate != consumer && seen.insert(candidate.clone()) {
                        spliced.push(candidate.clone());
                    }
                }
            }
            *preds = spliced;
        }

        tracing::trace!(
            target: TRACING_TARGET,
            node_id = %input,
            feeding = feeding.len(),
            "input node spliced"
        );
    }

    graph.predecessors.retain(|_, preds| !preds.is_empty());
}

/// Orders every node upstream-first, rejecting cycles.
fn topological_order(graph: &DependencyGraph) -> Result<Vec<NodeId>> {
    let mut arena: DiGraph<NodeId, ()> = DiGraph::with_capacity(graph.node_order.len(), 0);
    let mut indices: HashMap<&NodeId, NodeIndex> = HashMap::with_capacity(graph.node_order.len());

    for id in &graph.node_order {
        indices.insert(id, arena.add_node(id.clone()));
    }

    for id in &graph.node_order {
        for pred in graph.predecessors(id) {
            arena.add_edge(indices[pred], indices[id], ());
        }
    }

    toposort(&arena, None)
        .map(|order| order.into_iter().map(|index| arena[index].clone()).collect())
        .map_err(|cycle| Error::Cycle(arena[cycle.node_id()].clone()))
}
