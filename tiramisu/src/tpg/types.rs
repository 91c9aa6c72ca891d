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

//! Module containing the vertex, edge and error types of the topology path graph

use super::EdgePolicy;
use crate::netmodel::{NetworkModel, RouterId, Subnet, VlanId};

use log::*;
use std::collections::HashSet;
use thiserror::Error;

/// Fidelity of the topology path graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FidelityVariant {
    /// One vertex per VLAN, per OSPF process and per BGP session. A VLAN vertex is used for
    /// packets entering and leaving the router alike, so the physical edges of a router VLAN with
    /// several members bridge these links, while the fine variant and the L2 domains only bridge
    /// on plain switches.
    Coarse,
    /// Every VLAN and process is split into an incoming and an outgoing vertex, and BGP sessions
    /// towards peers that are not directly connected are resolved over the IGP.
    Fine,
}

/// Layer of a vertex. Next-hop layers replicate the IGP topology, and are used to reach a BGP
/// peer that is not directly connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Forwarding towards the destination subnet
    Main,
    /// Forwarding towards the peer address on the given VLAN
    NextHop(VlanId),
}

/// Kind of a vertex in the topology path graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexKind {
    /// Destination subnet
    Destination(Subnet),
    /// Source subnet
    Source(Subnet),
    /// VLAN (coarse)
    Vlan(VlanId),
    /// OSPF process (coarse)
    Ospf(RouterId),
    /// BGP session of `router` towards `peer` (coarse)
    BgpSession {
        /// router owning the session
        router: RouterId,
        /// peer of the session
        peer: RouterId,
    },
    /// Routing decision of a router (fine)
    Rib(RouterId),
    /// Packets entering the router on a VLAN (fine)
    VlanIn(VlanId),
    /// Packets leaving the router on a VLAN (fine)
    VlanOut(VlanId),
    /// Packets handled by OSPF (fine)
    OspfIn(RouterId),
    /// Packets forwarded by OSPF (fine)
    OspfOut(RouterId),
    /// Packets handled by BGP (fine)
    BgpIn(RouterId),
    /// Packets forwarded by BGP towards `peer` (fine)
    BgpOut {
        /// router owning the session
        router: RouterId,
        /// peer of the session
        peer: RouterId,
    },
}

impl VertexKind {
    /// Router to which this vertex belongs. Subnet vertices belong to no router.
    pub fn router(&self) -> Option<RouterId> {
        match self {
            Self::Destination(_) | Self::Source(_) => None,
            Self::Vlan(v) | Self::VlanIn(v) | Self::VlanOut(v) => Some(v.router),
            Self::Ospf(r) | Self::Rib(r) | Self::OspfIn(r) | Self::OspfOut(r) | Self::BgpIn(r) => {
                Some(*r)
            }
            Self::BgpSession { router, .. } | Self::BgpOut { router, .. } => Some(*router),
        }
    }

    /// Decision process used to rank the routes of this vertex.
    pub fn rank_domain(&self) -> RankDomain {
        match self {
            Self::Ospf(_) | Self::OspfIn(_) | Self::OspfOut(_) => RankDomain::Igp,
            Self::BgpSession { .. } | Self::BgpIn(_) | Self::BgpOut { .. } => RankDomain::Bgp,
            _ => RankDomain::Neutral,
        }
    }
}

/// Vertex of the topology path graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vertex {
    /// Layer of the vertex
    pub layer: Layer,
    /// What the vertex represents
    pub kind: VertexKind,
}

impl Vertex {
    /// Create a new vertex in the main layer
    pub fn main(kind: VertexKind) -> Self {
        Self { layer: Layer::Main, kind }
    }

    /// Create a new vertex in the next-hop layer towards `vlan`.
    pub fn next_hop(vlan: VlanId, kind: VertexKind) -> Self {
        Self { layer: Layer::NextHop(vlan), kind }
    }

    /// Router to which this vertex belongs.
    pub fn router(&self) -> Option<RouterId> {
        self.kind.router()
    }

    /// Returns the same vertex in the main layer.
    pub fn to_main(&self) -> Self {
        Self::main(self.kind.clone())
    }
}

/// Decision process of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankDomain {
    /// Lowest cost wins
    Igp,
    /// Highest local preference wins, then the shortest path length
    Bgp,
    /// Lowest cost wins, then the shortest path length
    Neutral,
}

/// Kind of an edge in the topology path graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// Physical link between two L2-adjacent VLANs
    Physical,
    /// Switching on a plain switch, from the incoming to the outgoing VLAN vertex
    Switching,
    /// Packets received on a VLAN are handed to a routing process (or the RIB)
    Ingress,
    /// The RIB hands the packet to one of the routing processes
    Lookup,
    /// A process forwards the packet out of a VLAN
    Egress,
    /// A process relays a route learned from another router
    Relay,
    /// A BGP session resolves its next hop, either on a VLAN or over the IGP
    Dependency,
    /// Redistribution between the processes of a router
    Redistribution,
    /// Packets from the source subnet enter the network
    Origin,
    /// Packets are delivered to the destination subnet
    Delivery,
    /// The packet reached the BGP peer after crossing the IGP
    NextHopExit,
}

/// Edge of the topology path graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Kind of the edge
    pub kind: EdgeKind,
    /// Signature transformations, applied in order
    pub policies: Vec<EdgePolicy>,
}

impl Edge {
    /// Create an edge without any policy
    pub fn new(kind: EdgeKind) -> Self {
        Self { kind, policies: Vec::new() }
    }

    /// Create an edge with the given policies
    pub fn with_policies(kind: EdgeKind, policies: Vec<EdgePolicy>) -> Self {
        Self { kind, policies }
    }
}

/// Set of failed links, stored as unordered pairs of routers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureSet {
    links: HashSet<(RouterId, RouterId)>,
}

impl FailureSet {
    /// Create an empty failure set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the failure set from pairs of router names. Names that are not part of the network
    /// are ignored, since no edge can match them.
    pub fn from_names<S: AsRef<str>>(
        net: &NetworkModel,
        pairs: impl IntoIterator<Item = (S, S)>,
    ) -> Self {
        let mut result = Self::new();
        for (a, b) in pairs {
            match (net.get_router_id(a.as_ref()), net.get_router_id(b.as_ref())) {
                (Some(a), Some(b)) => result.insert(a, b),
                _ => debug!("Ignore failure of unknown link {}-{}", a.as_ref(), b.as_ref()),
            }
        }
        result
    }

    /// Mark the link between `a` and `b` as failed.
    pub fn insert(&mut self, a: RouterId, b: RouterId) {
        self.links.insert(normalize(a, b));
    }

    /// Returns true if the link between `a` and `b` has failed.
    pub fn contains(&self, a: RouterId, b: RouterId) -> bool {
        self.links.contains(&normalize(a, b))
    }

    /// Returns true if no link has failed.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns true if an edge between the two vertices is affected by a failure.
    pub fn is_failed(&self, a: &Vertex, b: &Vertex) -> bool {
        match (a.router(), b.router()) {
            (Some(x), Some(y)) if x != y => self.contains(x, y),
            _ => false,
        }
    }
}

fn normalize(a: RouterId, b: RouterId) -> (RouterId, RouterId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Errors of a single query
#[derive(Error, Debug, PartialEq)]
pub enum QueryError {
    /// The subnet is neither attached to nor originated by any router
    #[error("Subnet {0} is not part of the network")]
    UnknownSubnet(Subnet),
    /// Source and destination are the same
    #[error("Source and destination are both {0}")]
    IdenticalEndpoints(Subnet),
    /// The taint graph was built for a different subnet
    #[error("Taint graph was built for {found:?}, but the destination is {expected}")]
    RagMismatch {
        /// destination subnet of the query
        expected: Subnet,
        /// subnet of the taint graph
        found: Option<Subnet>,
    },
    /// The taint graph was not yet tainted
    #[error("The taint graph was not yet tainted")]
    UntaintedRag,
    /// The vertex is not part of the graph
    #[error("Vertex {0:?} is not part of the graph")]
    UnknownVertex(Vertex),
}

/// Errors of the path-vector simulation
#[derive(Error, Debug, PartialEq)]
pub enum SimulationError {
    /// The simulation did not converge within the allowed number of rounds
    #[error("Simulation did not converge after {0} rounds")]
    Divergence(usize),
}
