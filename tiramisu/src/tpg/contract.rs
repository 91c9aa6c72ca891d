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

//! # Graph Contraction
//!
//! Simplifies a topology path graph for presentation, by merging chains of vertices. The
//! contraction destroys the identity of the vertices, so it consumes the graph. All queries must be
//! done before.

use super::{Edge, TopologyPathGraph, Vertex};

use log::*;
use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use std::collections::{HashMap, HashSet, VecDeque};

type ContractedGraphType = StableGraph<Vec<Vertex>, Edge, Directed, u32>;

/// Topology path graph after contraction. Every node contains the chain of vertices merged into
/// it, in forwarding order.
#[derive(Debug, Clone)]
pub struct ContractedGraph {
    graph: ContractedGraphType,
}

impl TopologyPathGraph {
    /// Contract the graph. As long as there exists a vertex `u` with exactly one outgoing edge to
    /// `v`, and `v` has exactly one incoming edge, `u` and `v` are merged into a single vertex. The
    /// new vertex keeps the incoming edges of `u` and the outgoing edges of `v`, including their
    /// policies. Reachability is preserved.
    pub fn contract(self) -> ContractedGraph {
        let mut graph = ContractedGraphType::default();
        let mut mapping: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for idx in self.graph.node_indices() {
            mapping.insert(idx, graph.add_node(vec![self.graph[idx].clone()]));
        }
        for e in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(e) {
                graph.add_edge(mapping[&a], mapping[&b], self.graph[e].clone());
            }
        }

        let before = graph.node_count();
        while let Some((u, v)) = next_chain(&graph) {
            merge(&mut graph, u, v);
        }
        debug!("Contracted {} vertices into {}", before, graph.node_count());

        ContractedGraph { graph }
    }
}

/// Find the first pair `(u, v)` (in sorted order of `u`) that can be merged.
fn next_chain(graph: &ContractedGraphType) -> Option<(NodeIndex, NodeIndex)> {
    let mut nodes: Vec<NodeIndex> = graph.node_indices().collect();
    nodes.sort_by(|a, b| graph[*a].cmp(&graph[*b]));
    nodes.into_iter().find_map(|u| {
        let mut out = graph.neighbors_directed(u, Outgoing);
        let v = out.next()?;
        if out.next().is_some() || v == u {
            return None;
        }
        if graph.neighbors_directed(v, Incoming).count() == 1 {
            Some((u, v))
        } else {
            None
        }
    })
}

fn merge(graph: &mut ContractedGraphType, u: NodeIndex, v: NodeIndex) {
    let mut vertices = graph[u].clone();
    vertices.extend(graph[v].iter().cloned());
    let new = graph.add_node(vertices);

    let incoming: Vec<(NodeIndex, Edge)> = graph
        .neighbors_directed(u, Incoming)
        .filter_map(|x| {
            let e = graph.find_edge(x, u)?;
            Some((if x == v { new } else { x }, graph[e].clone()))
        })
        .collect();
    let outgoing: Vec<(NodeIndex, Edge)> = graph
        .edges(v)
        .map(|e| (if e.target() == u { new } else { e.target() }, e.weight().clone()))
        .collect();

    graph.remove_node(u);
    graph.remove_node(v);

    for (x, edge) in incoming {
        if graph.find_edge(x, new).is_none() {
            graph.add_edge(x, new, edge);
        }
    }
    for (y, edge) in outgoing {
        if graph.find_edge(new, y).is_none() {
            graph.add_edge(new, y, edge);
        }
    }
}

impl ContractedGraph {
    /// Number of (merged) vertices
    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all merged vertices, in sorted order.
    pub fn vertices(&self) -> impl Iterator<Item = &[Vertex]> {
        let mut vertices: Vec<&[Vertex]> =
            self.graph.node_indices().map(|i| self.graph[i].as_slice()).collect();
        vertices.sort();
        vertices.into_iter()
    }

    /// Iterate over all edges, in sorted order of their endpoints.
    pub fn edges(&self) -> impl Iterator<Item = (&[Vertex], &[Vertex], &Edge)> {
        let mut edges: Vec<(&[Vertex], &[Vertex], &Edge)> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                Some((self.graph[a].as_slice(), self.graph[b].as_slice(), &self.graph[e]))
            })
            .collect();
        edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        edges.into_iter()
    }

    /// Returns true if the graph still contains the vertex, merged into some node.
    pub fn contains(&self, vertex: &Vertex) -> bool {
        self.find(vertex).is_some()
    }

    /// Returns true if `to` is reachable from `from`. Two vertices merged into the same node are
    /// reachable if `from` comes first in the chain.
    pub fn has_path(&self, from: &Vertex, to: &Vertex) -> bool {
        let (a, b) = match (self.find(from), self.find(to)) {
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        if a == b {
            let chain = &self.graph[a];
            let pos_from = chain.iter().position(|v| v == from);
            let pos_to = chain.iter().position(|v| v == to);
            if pos_from <= pos_to {
                return true;
            }
        }
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        queue.push_back(a);
        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, Outgoing) {
                if next == b {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn find(&self, vertex: &Vertex) -> Option<NodeIndex> {
        self.graph.node_indices().find(|i| self.graph[*i].contains(vertex))
    }
}
