// Tiramisu: Reachability Verification of Multi-Protocol Networks
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Topology Path Graph
//!
//! The topology path graph (TPG) is built for a single pair of destination and source subnet. Its
//! vertices represent the decision points of the routing protocols (VLANs, OSPF processes, BGP
//! sessions), and its edges describe how packets are forwarded between them. Edges are oriented in
//! forwarding direction, from the source vertex towards the destination vertex, and carry the
//! [`EdgePolicy`] transformations used by the path-vector simulation.
//!
//! The graph offers two kinds of queries:
//!
//! - [`TopologyPathGraph::has_path`]: Does any path exist, ignoring all routing policies?
//! - [`TopologyPathGraph::best_path`]: Which path would the protocols actually select? See the
//!   module [`tpvp`].
//!
//! Once the queries are done, the graph may be simplified using [`TopologyPathGraph::contract`].

mod builder;
pub mod contract;
mod signature;
pub mod tpvp;
mod types;

pub use contract::ContractedGraph;
pub use signature::{apply_all, EdgePolicy, Signature, DEFAULT_LOCAL_PREF};
pub use tpvp::{BestPath, Simulation};
pub use types::*;

use crate::netmodel::Subnet;

use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use std::collections::{HashMap, HashSet};

type IndexType = u32;
pub(crate) type TpgGraph = StableGraph<Vertex, Edge, Directed, IndexType>;

/// # Topology Path Graph
///
/// See the [module documentation](self) for more details.
#[derive(Debug, Clone)]
pub struct TopologyPathGraph {
    variant: FidelityVariant,
    graph: TpgGraph,
    lookup: HashMap<Vertex, NodeIndex>,
    src: NodeIndex,
    dst: NodeIndex,
}

impl TopologyPathGraph {
    /// Create a graph containing only the source and the destination vertex.
    pub(crate) fn empty(variant: FidelityVariant, dst: &Subnet, src: &Subnet) -> Self {
        let mut graph = TpgGraph::default();
        let mut lookup = HashMap::new();
        let dst_vertex = Vertex::main(VertexKind::Destination(dst.clone()));
        let src_vertex = Vertex::main(VertexKind::Source(src.clone()));
        let dst_idx = graph.add_node(dst_vertex.clone());
        let src_idx = graph.add_node(src_vertex.clone());
        lookup.insert(dst_vertex, dst_idx);
        lookup.insert(src_vertex, src_idx);
        Self { variant, graph, lookup, src: src_idx, dst: dst_idx }
    }

    /// Add a vertex, if it does not exist yet.
    pub(crate) fn add_vertex(&mut self, vertex: Vertex) -> NodeIndex {
        if let Some(idx) = self.lookup.get(&vertex) {
            return *idx;
        }
        let idx = self.graph.add_node(vertex.clone());
        self.lookup.insert(vertex, idx);
        idx
    }

    /// Add an edge between two existing vertices. Nothing is added if one of the vertices does not
    /// exist, or if the two vertices are already connected. Returns true if the edge was added.
    pub(crate) fn add_edge(&mut self, from: &Vertex, to: &Vertex, edge: Edge) -> bool {
        match (self.lookup.get(from), self.lookup.get(to)) {
            (Some(a), Some(b)) if a != b && self.graph.find_edge(*a, *b).is_none() => {
                self.graph.add_edge(*a, *b, edge);
                true
            }
            _ => false,
        }
    }

    /// Fidelity variant of the graph
    pub fn variant(&self) -> FidelityVariant {
        self.variant
    }

    /// The source vertex
    pub fn source(&self) -> &Vertex {
        &self.graph[self.src]
    }

    /// The destination vertex
    pub fn destination(&self) -> &Vertex {
        &self.graph[self.dst]
    }

    /// Returns true if the vertex is part of the graph.
    pub fn contains(&self, vertex: &Vertex) -> bool {
        self.lookup.contains_key(vertex)
    }

    /// Returns true if there exists an edge from `a` to `b`.
    pub fn contains_edge(&self, a: &Vertex, b: &Vertex) -> bool {
        match (self.lookup.get(a), self.lookup.get(b)) {
            (Some(a), Some(b)) => self.graph.find_edge(*a, *b).is_some(),
            _ => false,
        }
    }

    /// Get the edge from `a` to `b`.
    pub fn edge(&self, a: &Vertex, b: &Vertex) -> Option<&Edge> {
        let (a, b) = (self.lookup.get(a)?, self.lookup.get(b)?);
        self.graph.find_edge(*a, *b).and_then(|e| self.graph.edge_weight(e))
    }

    /// Number of vertices
    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all vertices, in sorted order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        let mut vertices: Vec<&Vertex> =
            self.graph.node_indices().map(|i| &self.graph[i]).collect();
        vertices.sort();
        vertices.into_iter()
    }

    /// Iterate over all edges, in sorted order of their endpoints.
    pub fn edges(&self) -> impl Iterator<Item = (&Vertex, &Vertex, &Edge)> {
        let mut edges: Vec<(&Vertex, &Vertex, &Edge)> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                Some((&self.graph[a], &self.graph[b], &self.graph[e]))
            })
            .collect();
        edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        edges.into_iter()
    }

    /// Search any path from the source to the destination, which does not use any of the failed
    /// links. Policies are ignored. Returns `None` if no such path exists.
    pub fn has_path(&self, failures: &FailureSet) -> Option<Vec<Vertex>> {
        self.dfs(self.src, self.dst, failures)
    }

    /// Search any path between two vertices of the graph, which does not use any of the failed
    /// links.
    pub fn has_path_between(
        &self,
        from: &Vertex,
        to: &Vertex,
        failures: &FailureSet,
    ) -> Result<Option<Vec<Vertex>>, QueryError> {
        let a = self.index(from)?;
        let b = self.index(to)?;
        Ok(self.dfs(a, b, failures))
    }

    pub(crate) fn index(&self, vertex: &Vertex) -> Result<NodeIndex, QueryError> {
        self.lookup.get(vertex).copied().ok_or_else(|| QueryError::UnknownVertex(vertex.clone()))
    }

    pub(crate) fn graph(&self) -> &TpgGraph {
        &self.graph
    }

    pub(crate) fn src_index(&self) -> NodeIndex {
        self.src
    }

    pub(crate) fn dst_index(&self) -> NodeIndex {
        self.dst
    }

    /// Returns the outgoing neighbors of `node` which are not cut by a failure, in sorted order.
    pub(crate) fn successors(&self, node: NodeIndex, failures: &FailureSet) -> Vec<NodeIndex> {
        let vertex = &self.graph[node];
        let mut result: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Outgoing)
            .filter(|n| !failures.is_failed(vertex, &self.graph[*n]))
            .collect();
        result.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        result.dedup();
        result
    }

    /// Depth-first search with an explicit stack. Returns the first path found.
    fn dfs(&self, from: NodeIndex, to: NodeIndex, failures: &FailureSet) -> Option<Vec<Vertex>> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        // stack of the current path, together with the remaining successors of each vertex
        let mut stack: Vec<(NodeIndex, std::vec::IntoIter<NodeIndex>)> = Vec::new();
        visited.insert(from);
        stack.push((from, self.successors(from, failures).into_iter()));

        loop {
            let (node, next) = match stack.last_mut() {
                Some((node, succ)) => (*node, succ.next()),
                None => return None,
            };
            if node == to {
                return Some(stack.iter().map(|(n, _)| self.graph[*n].clone()).collect());
            }
            match next {
                Some(next) => {
                    if visited.insert(next) {
                        let next_succ = self.successors(next, failures).into_iter();
                        stack.push((next, next_succ));
                    }
                }
                None => {
                    stack.pop();
                }
            }
        }
    }
}
