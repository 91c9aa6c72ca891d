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

//! # Reachability Taint Graph
//!
//! The taint graph contains one vertex per routing process (OSPF and BGP) and one vertex for the
//! destination subnet. Edges describe how routes propagate between the processes: IGP adjacencies,
//! eBGP and iBGP sessions, redistribution and origination. Tainting the graph marks every process
//! that can ever learn a route towards the subnet.
//!
//! Routes learned over iBGP are never advertised to another iBGP peer. The taint propagation
//! respects this rule: an iBGP edge is only followed if the taint did not arrive over iBGP. A
//! vertex that was first reached over iBGP is expanded again if it is later reached over any other
//! edge, such that the result does not depend on the order of the traversal.

use crate::layer2::L2Domains;
use crate::netmodel::{BgpSessionType, NetworkModel, Protocol, RouterId, Subnet};

use log::*;
use petgraph::prelude::*;
use std::collections::{HashMap, HashSet};

/// Routing process of a router
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Process {
    /// OSPF process
    Ospf(RouterId),
    /// BGP process
    Bgp(RouterId),
}

impl Process {
    /// Router running the process
    pub fn router(&self) -> RouterId {
        match self {
            Self::Ospf(r) | Self::Bgp(r) => *r,
        }
    }

    /// Protocol of the process
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Ospf(_) => Protocol::Ospf,
            Self::Bgp(_) => Protocol::Bgp,
        }
    }
}

/// Vertex of the taint graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RagVertex {
    /// Routing process
    Process(Process),
    /// Destination subnet
    Subnet(Subnet),
}

/// Kind of a taint graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RagEdgeKind {
    /// OSPF processes on L2-adjacent VLANs
    IgpAdjacency,
    /// eBGP session
    EBgp,
    /// iBGP session
    IBgp,
    /// Redistribution between the two processes of the same router
    Redistribution,
    /// The process originates the subnet
    Origin,
}

impl RagEdgeKind {
    /// Returns true if the edge connects processes of different routers.
    pub fn is_adjacency(&self) -> bool {
        matches!(self, Self::IgpAdjacency | Self::EBgp | Self::IBgp)
    }
}

/// Edge of the taint graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagEdge {
    /// Kind of the edge
    pub kind: RagEdgeKind,
    /// Set if the taint was propagated along this edge
    pub propagated: bool,
}

/// Taint state of a single vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaintState {
    /// The process can learn a route towards the subnet
    pub tainted: bool,
    /// The taint arrived over an adjacency with another router, and the process does not originate
    /// the subnet itself
    pub tainted_by_adjacency: bool,
}

#[derive(Debug, Clone)]
struct RagNode {
    vertex: RagVertex,
    state: TaintState,
}

/// # Reachability Taint Graph (RAG)
///
/// Built for a single destination subnet (see [`ReachabilityTaintGraph::new`]), and tainted with
/// [`ReachabilityTaintGraph::taint`]. The state is owned by this instance and must not be reused
/// for any other subnet.
#[derive(Debug, Clone)]
pub struct ReachabilityTaintGraph {
    subnet: Option<Subnet>,
    graph: Graph<RagNode, RagEdge, Directed, u32>,
    lookup: HashMap<RagVertex, NodeIndex>,
    has_run: bool,
}

impl ReachabilityTaintGraph {
    /// Build the taint graph of the network. If `subnet` is given, the graph contains a vertex
    /// for it, with origin edges towards all processes originating it.
    pub fn new(net: &NetworkModel, l2: &L2Domains, subnet: Option<&Subnet>) -> Self {
        let mut rag = Self {
            subnet: subnet.cloned(),
            graph: Graph::new(),
            lookup: HashMap::new(),
            has_run: false,
        };

        // vertices
        for r in net.routers() {
            if r.ospf().is_some() {
                rag.add_vertex(RagVertex::Process(Process::Ospf(r.router_id())));
            }
            if r.bgp().is_some() {
                rag.add_vertex(RagVertex::Process(Process::Bgp(r.router_id())));
            }
        }
        if let Some(s) = subnet {
            rag.add_vertex(RagVertex::Subnet(s.clone()));
        }

        // edges
        for r in net.routers() {
            let id = r.router_id();
            if let Some(ospf) = r.ospf() {
                for num in ospf.active_vlans() {
                    let vlan = match r.vlan(num) {
                        Some(v) => v.id(),
                        None => continue,
                    };
                    for adj in l2.adjacent(vlan) {
                        let peer_active = net
                            .router(adj.router)
                            .ospf()
                            .map(|p| p.is_active(adj.num))
                            .unwrap_or(false);
                        if peer_active && adj.router != id {
                            rag.add_edge(
                                Process::Ospf(id).into(),
                                Process::Ospf(adj.router).into(),
                                RagEdgeKind::IgpAdjacency,
                            );
                        }
                    }
                }
                if ospf.redistributes(Protocol::Bgp) {
                    rag.add_edge(
                        Process::Bgp(id).into(),
                        Process::Ospf(id).into(),
                        RagEdgeKind::Redistribution,
                    );
                }
            }
            if let Some(bgp) = r.bgp() {
                for n in bgp.neighbors() {
                    let kind = match n.session_type() {
                        BgpSessionType::EBgp => RagEdgeKind::EBgp,
                        BgpSessionType::IBgp => RagEdgeKind::IBgp,
                    };
                    rag.add_edge(Process::Bgp(id).into(), Process::Bgp(n.peer()).into(), kind);
                }
                if bgp.redistributes(Protocol::Ospf) {
                    rag.add_edge(
                        Process::Ospf(id).into(),
                        Process::Bgp(id).into(),
                        RagEdgeKind::Redistribution,
                    );
                }
            }
            if let Some(s) = subnet {
                if r.ospf().map(|p| p.originates(s)).unwrap_or(false) {
                    rag.add_edge(
                        RagVertex::Subnet(s.clone()),
                        Process::Ospf(id).into(),
                        RagEdgeKind::Origin,
                    );
                }
                if r.bgp().map(|p| p.originates(s)).unwrap_or(false) {
                    rag.add_edge(
                        RagVertex::Subnet(s.clone()),
                        Process::Bgp(id).into(),
                        RagEdgeKind::Origin,
                    );
                }
            }
        }

        debug!(
            "Built RAG for {:?} with {} vertices and {} edges",
            subnet,
            rag.graph.node_count(),
            rag.graph.edge_count()
        );

        rag
    }

    /// Propagate the taint from the subnet vertex to all processes that can learn a route towards
    /// it. Calling this function multiple times yields the same result.
    pub fn taint(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.state = TaintState::default();
        }
        for edge in self.graph.edge_weights_mut() {
            edge.propagated = false;
        }
        self.has_run = true;

        let start = match self.subnet.clone().and_then(|s| self.lookup.get(&RagVertex::Subnet(s))) {
            Some(idx) => *idx,
            None => return,
        };

        // processes originating the subnet are never tainted by an adjacency
        let origins: HashSet<NodeIndex> = self.graph.neighbors(start).collect();

        // vertices expanded without restriction, and vertices only reached over iBGP.
        let mut full: HashSet<NodeIndex> = HashSet::new();
        let mut restricted: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<(NodeIndex, bool)> = vec![(start, false)];

        while let Some((node, via_ibgp)) = stack.pop() {
            let fresh = if via_ibgp {
                !full.contains(&node) && restricted.insert(node)
            } else {
                full.insert(node)
            };
            if !fresh {
                continue;
            }
            self.graph[node].state.tainted = true;

            let edges: Vec<(EdgeIndex, NodeIndex, RagEdgeKind)> =
                self.graph.edges(node).map(|e| (e.id(), e.target(), e.weight().kind)).collect();
            for (edge, target, kind) in edges {
                let is_ibgp = kind == RagEdgeKind::IBgp;
                if is_ibgp && via_ibgp {
                    continue;
                }
                self.graph[edge].propagated = true;
                if kind.is_adjacency() && !origins.contains(&target) {
                    self.graph[target].state.tainted_by_adjacency = true;
                }
                stack.push((target, is_ibgp));
            }
        }

        debug!(
            "Tainted {} of {} vertices for {:?}",
            self.graph.node_indices().filter(|i| self.graph[*i].state.tainted).count(),
            self.graph.node_count(),
            self.subnet
        );
    }

    /// Subnet for which the graph was built
    pub fn subnet(&self) -> Option<&Subnet> {
        self.subnet.as_ref()
    }

    /// Returns true if [`ReachabilityTaintGraph::taint`] was called.
    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Returns true if the process can learn a route towards the subnet. Processes that do not
    /// exist are never tainted.
    pub fn is_tainted(&self, process: Process) -> bool {
        self.state(&process.into()).tainted
    }

    /// Returns true if the process learned the route from a process of another router.
    pub fn was_tainted_by_adjacency(&self, process: Process) -> bool {
        self.state(&process.into()).tainted_by_adjacency
    }

    /// Returns true if the taint was propagated from `from` to `to`. For BGP processes, this means
    /// that `from` advertises its route to `to`.
    pub fn propagated(&self, from: Process, to: Process) -> bool {
        match (self.lookup.get(&from.into()), self.lookup.get(&to.into())) {
            (Some(a), Some(b)) => {
                self.graph.edges(*a).any(|e| e.target() == *b && e.weight().propagated)
            }
            _ => false,
        }
    }

    /// Returns the taint state of a vertex. Unknown vertices have the default (untainted) state.
    pub fn state(&self, vertex: &RagVertex) -> TaintState {
        self.lookup.get(vertex).map(|idx| self.graph[*idx].state).unwrap_or_default()
    }

    /// Returns all tainted processes in sorted order.
    pub fn tainted_processes(&self) -> Vec<Process> {
        let mut result: Vec<Process> = self
            .graph
            .node_indices()
            .map(|i| &self.graph[i])
            .filter(|n| n.state.tainted)
            .filter_map(|n| match n.vertex {
                RagVertex::Process(p) => Some(p),
                RagVertex::Subnet(_) => None,
            })
            .collect();
        result.sort();
        result
    }

    /// Iterate over all vertices with their state.
    pub fn vertices(&self) -> impl Iterator<Item = (&RagVertex, TaintState)> {
        self.graph.node_indices().map(move |i| (&self.graph[i].vertex, self.graph[i].state))
    }

    /// Iterate over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (&RagVertex, &RagVertex, &RagEdge)> {
        self.graph.edge_references().map(move |e| {
            (&self.graph[e.source()].vertex, &self.graph[e.target()].vertex, e.weight())
        })
    }

    fn add_vertex(&mut self, vertex: RagVertex) -> NodeIndex {
        if let Some(idx) = self.lookup.get(&vertex) {
            return *idx;
        }
        let node = RagNode { vertex: vertex.clone(), state: Default::default() };
        let idx = self.graph.add_node(node);
        self.lookup.insert(vertex, idx);
        idx
    }

    fn add_edge(&mut self, from: RagVertex, to: RagVertex, kind: RagEdgeKind) {
        let (a, b) = match (self.lookup.get(&from), self.lookup.get(&to)) {
            (Some(a), Some(b)) => (*a, *b),
            _ => {
                trace!("Skip RAG edge {:?} -> {:?}, as one of them does not exist", from, to);
                return;
            }
        };
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, RagEdge { kind, propagated: false });
        }
    }
}

impl From<Process> for RagVertex {
    fn from(p: Process) -> Self {
        Self::Process(p)
    }
}
