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

//! Construction of the topology path graph, for both fidelity variants.
//!
//! All vertices are created before any edge, and every edge is gated by the taint of the
//! processes involved.

use super::{
    Edge, EdgeKind, EdgePolicy, FidelityVariant, QueryError, TopologyPathGraph, Vertex,
    VertexKind::*,
};
use crate::layer2::L2Domains;
use crate::netmodel::{
    BgpNeighbor, NetworkModel, Protocol, Router, RouterId, Subnet, Vlan as RouterVlan, VlanId,
};
use crate::rag::{Process, ReachabilityTaintGraph};

use log::*;
use std::collections::BTreeSet;

impl TopologyPathGraph {
    /// Build the topology path graph for packets from `src` towards `dst`. The taint graph must be
    /// built for `dst` and tainted before.
    pub fn build(
        net: &NetworkModel,
        l2: &L2Domains,
        rag: &ReachabilityTaintGraph,
        (dst, src): (&Subnet, &Subnet),
        variant: FidelityVariant,
    ) -> Result<Self, QueryError> {
        if dst == src {
            return Err(QueryError::IdenticalEndpoints(dst.clone()));
        }
        for s in [dst, src].iter() {
            if !net.knows_subnet(s) {
                return Err(QueryError::UnknownSubnet((*s).clone()));
            }
        }
        if rag.subnet() != Some(dst) {
            return Err(QueryError::RagMismatch {
                expected: dst.clone(),
                found: rag.subnet().cloned(),
            });
        }
        if !rag.has_run() {
            return Err(QueryError::UntaintedRag);
        }

        let mut g = Self::empty(variant, dst, src);
        let builder = Builder {
            net,
            l2,
            rag,
            dst: g.destination().clone(),
            src: g.source().clone(),
            dst_subnet: dst,
            src_subnet: src,
        };
        match variant {
            FidelityVariant::Coarse => builder.coarse(&mut g),
            FidelityVariant::Fine => builder.fine(&mut g),
        }

        debug!(
            "Built {:?} TPG for {} -> {} with {} vertices and {} edges",
            variant,
            src,
            dst,
            g.num_vertices(),
            g.num_edges()
        );

        Ok(g)
    }
}

struct Builder<'a> {
    net: &'a NetworkModel,
    l2: &'a L2Domains,
    rag: &'a ReachabilityTaintGraph,
    dst: Vertex,
    src: Vertex,
    dst_subnet: &'a Subnet,
    src_subnet: &'a Subnet,
}

impl<'a> Builder<'a> {
    fn coarse(&self, g: &mut TopologyPathGraph) {
        let v = Vertex::main;

        for r in self.net.routers() {
            let id = r.router_id();
            for vlan in r.vlans() {
                g.add_vertex(v(Vlan(vlan.id())));
            }
            if r.ospf().is_some() {
                g.add_vertex(v(Ospf(id)));
            }
            for n in r.bgp().into_iter().flat_map(|b| b.neighbors()) {
                g.add_vertex(v(BgpSession { router: id, peer: n.peer() }));
            }
        }

        for r in self.net.routers() {
            let id = r.router_id();
            let ospf_t = self.rag.is_tainted(Process::Ospf(id));
            let bgp_t = self.rag.is_tainted(Process::Bgp(id));
            let sessions: Vec<&BgpNeighbor> =
                r.bgp().into_iter().flat_map(|b| b.neighbors()).collect();

            for vlan in r.vlans() {
                let this = v(Vlan(vlan.id()));
                for peer in self.physical_neighbors(vlan) {
                    g.add_edge(&this, &v(Vlan(peer)), Edge::new(EdgeKind::Physical));
                }
                if ospf_t {
                    g.add_edge(&this, &v(Ospf(id)), Edge::new(EdgeKind::Ingress));
                }
                if bgp_t {
                    for n in sessions.iter() {
                        let session = v(BgpSession { router: id, peer: n.peer() });
                        g.add_edge(&this, &session, Edge::new(EdgeKind::Ingress));
                    }
                }
                if self.ospf_delivers(r) || self.bgp_delivers(r) {
                    g.add_edge(&this, &self.dst, Edge::new(EdgeKind::Delivery));
                }
            }

            if let Some(ospf) = r.ospf() {
                for vlan in self.ospf_egress(r) {
                    g.add_edge(&v(Ospf(id)), &v(Vlan(vlan)), egress());
                }
                if ospf_t && r.is_attached(self.src_subnet) {
                    g.add_edge(&self.src, &v(Ospf(id)), Edge::new(EdgeKind::Origin));
                }
                if ospf.redistributes(Protocol::Bgp) && bgp_t {
                    for n in sessions.iter() {
                        let session = v(BgpSession { router: id, peer: n.peer() });
                        g.add_edge(&v(Ospf(id)), &session, Edge::new(EdgeKind::Redistribution));
                    }
                }
            }

            for n in sessions.iter() {
                let session = v(BgpSession { router: id, peer: n.peer() });
                if bgp_t && r.is_attached(self.src_subnet) {
                    g.add_edge(&self.src, &session, Edge::new(EdgeKind::Origin));
                }
                if !self.learns_from(id, n) {
                    continue;
                }
                let next_hop = match n.local_vlan() {
                    Some(vlan) => v(Vlan(vlan)),
                    None => v(Ospf(id)),
                };
                let edge = Edge::with_policies(EdgeKind::Dependency, self.session_policies(r, n));
                if !g.add_edge(&session, &next_hop, edge) {
                    warn!(
                        "Next hop {} of {} is not reachable",
                        n.addr(),
                        self.net.router_name(id)
                    );
                }
            }
        }
    }

    fn fine(&self, g: &mut TopologyPathGraph) {
        let v = Vertex::main;

        // vertices of the main layer
        let mut layers: BTreeSet<VlanId> = BTreeSet::new();
        for r in self.net.routers() {
            let id = r.router_id();
            for vlan in r.vlans() {
                g.add_vertex(v(VlanIn(vlan.id())));
                g.add_vertex(v(VlanOut(vlan.id())));
            }
            if !r.is_switch() {
                g.add_vertex(v(Rib(id)));
            }
            if r.ospf().is_some() && self.rag.is_tainted(Process::Ospf(id)) {
                g.add_vertex(v(OspfIn(id)));
                g.add_vertex(v(OspfOut(id)));
            }
            if let Some(bgp) = r.bgp() {
                if self.rag.is_tainted(Process::Bgp(id)) {
                    g.add_vertex(v(BgpIn(id)));
                    for n in bgp.neighbors().filter(|n| self.learns_from(id, n)) {
                        g.add_vertex(v(BgpOut { router: id, peer: n.peer() }));
                        if !n.is_directly_connected() && r.ospf().is_some() {
                            layers.insert(n.peer_vlan());
                        }
                    }
                }
            }
        }
        for layer in layers.iter() {
            self.next_hop_vertices(g, *layer);
        }

        // edges of the main layer
        for r in self.net.routers() {
            let id = r.router_id();
            for vlan in r.vlans() {
                let vlan_in = v(VlanIn(vlan.id()));
                let vlan_out = v(VlanOut(vlan.id()));
                if r.is_switch() {
                    g.add_edge(&vlan_in, &vlan_out, Edge::new(EdgeKind::Switching));
                } else {
                    g.add_edge(&vlan_in, &v(Rib(id)), Edge::new(EdgeKind::Ingress));
                }
                for peer in self.physical_neighbors(vlan) {
                    g.add_edge(&vlan_out, &v(VlanIn(peer)), Edge::new(EdgeKind::Physical));
                }
            }
            if r.is_attached(self.src_subnet) {
                g.add_edge(&self.src, &v(Rib(id)), Edge::new(EdgeKind::Origin));
            }
            g.add_edge(&v(Rib(id)), &v(OspfIn(id)), Edge::new(EdgeKind::Lookup));
            g.add_edge(&v(Rib(id)), &v(BgpIn(id)), Edge::new(EdgeKind::Lookup));

            if let Some(ospf) = r.ospf() {
                if self.rag.was_tainted_by_adjacency(Process::Ospf(id)) {
                    g.add_edge(&v(OspfIn(id)), &v(OspfOut(id)), Edge::new(EdgeKind::Relay));
                }
                for vlan in self.ospf_egress(r) {
                    g.add_edge(&v(OspfOut(id)), &v(VlanOut(vlan)), egress());
                }
                if self.ospf_delivers(r) {
                    g.add_edge(&v(OspfIn(id)), &self.dst, Edge::new(EdgeKind::Delivery));
                }
                if ospf.redistributes(Protocol::Bgp) {
                    g.add_edge(&v(OspfIn(id)), &v(BgpIn(id)), Edge::new(EdgeKind::Redistribution));
                }
            }

            if let Some(bgp) = r.bgp() {
                if self.bgp_delivers(r) {
                    g.add_edge(&v(BgpIn(id)), &self.dst, Edge::new(EdgeKind::Delivery));
                }
                if bgp.redistributes(Protocol::Ospf) {
                    g.add_edge(&v(BgpIn(id)), &v(OspfIn(id)), Edge::new(EdgeKind::Redistribution));
                }
                for n in bgp.neighbors().filter(|n| self.learns_from(id, n)) {
                    let out = v(BgpOut { router: id, peer: n.peer() });
                    let relay = Edge::with_policies(EdgeKind::Relay, self.session_policies(r, n));
                    g.add_edge(&v(BgpIn(id)), &out, relay);
                    let next_hop = match n.local_vlan() {
                        Some(vlan) => v(VlanOut(vlan)),
                        None => Vertex::next_hop(n.peer_vlan(), OspfIn(id)),
                    };
                    if !g.add_edge(&out, &next_hop, Edge::new(EdgeKind::Dependency)) {
                        warn!(
                            "Next hop {} of {} is not reachable",
                            n.addr(),
                            self.net.router_name(id)
                        );
                    }
                }
            }
        }
        for layer in layers.iter() {
            self.next_hop_edges(g, *layer);
        }
    }

    /// Vertices of the IGP layer used to reach the peer address on `layer`.
    fn next_hop_vertices(&self, g: &mut TopologyPathGraph, layer: VlanId) {
        let v = |kind| Vertex::next_hop(layer, kind);
        for r in self.net.routers() {
            for vlan in r.vlans() {
                g.add_vertex(v(VlanIn(vlan.id())));
                g.add_vertex(v(VlanOut(vlan.id())));
            }
            if r.ospf().is_some() && r.router_id() != layer.router {
                g.add_vertex(v(OspfIn(r.router_id())));
                g.add_vertex(v(OspfOut(r.router_id())));
            }
        }
    }

    /// Edges of the IGP layer used to reach the peer address on `layer`. Packets leave the layer
    /// as soon as they arrive at the peer.
    fn next_hop_edges(&self, g: &mut TopologyPathGraph, layer: VlanId) {
        let v = |kind| Vertex::next_hop(layer, kind);
        let peer = layer.router;
        for r in self.net.routers() {
            let id = r.router_id();
            for vlan in r.vlans() {
                let vlan_in = v(VlanIn(vlan.id()));
                let vlan_out = v(VlanOut(vlan.id()));
                if id == peer {
                    let exit = Vertex::main(BgpIn(peer));
                    g.add_edge(&vlan_in, &exit, Edge::new(EdgeKind::NextHopExit));
                } else if r.is_switch() {
                    g.add_edge(&vlan_in, &vlan_out, Edge::new(EdgeKind::Switching));
                } else {
                    g.add_edge(&vlan_in, &v(OspfIn(id)), Edge::new(EdgeKind::Ingress));
                }
                for n in self.physical_neighbors(vlan) {
                    g.add_edge(&vlan_out, &v(VlanIn(n)), Edge::new(EdgeKind::Physical));
                }
            }
            if r.ospf().is_some() && id != peer {
                g.add_edge(&v(OspfIn(id)), &v(OspfOut(id)), Edge::new(EdgeKind::Relay));
                for vlan in self.ospf_egress(r) {
                    g.add_edge(&v(OspfOut(id)), &v(VlanOut(vlan)), egress());
                }
            }
        }
    }

    /// VLANs on the other end of the links of `vlan`.
    fn physical_neighbors(&self, vlan: &RouterVlan) -> Vec<VlanId> {
        let router = self.net.router(vlan.id().router);
        vlan.members()
            .iter()
            .filter_map(|n| router.iface(*n))
            .filter_map(|iface| self.net.peer_iface(iface))
            .filter_map(|peer| peer.vlan())
            .collect()
    }

    /// Active OSPF VLANs of the router, which share their L2 domain with another OSPF router.
    fn ospf_egress(&self, r: &Router) -> Vec<VlanId> {
        let ospf = match r.ospf() {
            Some(o) => o,
            None => return Vec::new(),
        };
        ospf.active_vlans()
            .map(|num| VlanId::new(r.router_id(), num))
            .filter(|vlan| {
                self.l2.adjacent(*vlan).any(|adj| {
                    let ospf = self.net.router(adj.router).ospf();
                    ospf.map(|p| p.is_active(adj.num)).unwrap_or(false)
                })
            })
            .collect()
    }

    fn ospf_delivers(&self, r: &Router) -> bool {
        r.is_attached(self.dst_subnet)
            && r.ospf().map(|p| p.originates(self.dst_subnet)).unwrap_or(false)
    }

    fn bgp_delivers(&self, r: &Router) -> bool {
        r.is_attached(self.dst_subnet)
            && r.bgp().map(|p| p.originates(self.dst_subnet)).unwrap_or(false)
    }

    /// Returns true if the peer of `n` advertises its route towards the destination to `router`.
    fn learns_from(&self, router: RouterId, n: &BgpNeighbor) -> bool {
        self.rag.propagated(Process::Bgp(n.peer()), Process::Bgp(router))
    }

    /// Policies of a route learned by `r` from the neighbor `n`: the path grows by one, then the
    /// export policy of the peer and the import policy of `r` are applied.
    fn session_policies(&self, r: &Router, n: &BgpNeighbor) -> Vec<EdgePolicy> {
        let export = self
            .net
            .router(n.peer())
            .bgp()
            .and_then(|b| b.neighbor(r.router_id()))
            .and_then(|pn| pn.export_policy())
            .and_then(|name| self.net.policy(name));
        let import = n.import_policy().and_then(|name| self.net.policy(name));
        std::iter::once(EdgePolicy::len(1))
            .chain(export.cloned())
            .chain(import.cloned())
            .collect()
    }
}

fn egress() -> Edge {
    Edge::with_policies(EdgeKind::Egress, vec![EdgePolicy::cost(1)])
}
