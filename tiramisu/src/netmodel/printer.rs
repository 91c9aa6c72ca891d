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

//! # Helper (printer) functions for the Network
//! Module containing helper functions to get formatted strings of the network, the taint graph and
//! the topology path graph, with all router names inserted.

use crate::layer2::L2Domains;
use crate::netmodel::{NetworkModel, Protocol, RouterId, VlanId};
use crate::rag::{Process, RagVertex, ReachabilityTaintGraph};
use crate::tpg::{Layer, Signature, TopologyPathGraph, Vertex, VertexKind};

use itertools::Itertools;

/// Returns the name of a VLAN, like `R1:VLAN:10`.
pub fn vlan(net: &NetworkModel, vlan: VlanId) -> String {
    format!("{}:VLAN:{}", net.router_name(vlan.router), vlan.num)
}

/// Returns the name of a routing process, like `R1:OSPF`.
pub fn process(net: &NetworkModel, process: Process) -> String {
    format!("{}:{}", net.router_name(process.router()), process.protocol())
}

/// Returns the name of a vertex of the topology path graph. Vertices in a next-hop layer are
/// prefixed with the VLAN of the layer, like `[R2:10] R1:OSPF:I`.
pub fn vertex(net: &NetworkModel, vertex: &Vertex) -> String {
    let name = |r: &RouterId| net.router_name(*r);
    let kind = match &vertex.kind {
        VertexKind::Destination(s) => format!("DST:{}", s),
        VertexKind::Source(s) => format!("SRC:{}", s),
        VertexKind::Vlan(v) => self::vlan(net, *v),
        VertexKind::Ospf(r) => format!("{}:OSPF", name(r)),
        VertexKind::BgpSession { router, peer } => format!("{}:BGP:{}", name(router), name(peer)),
        VertexKind::Rib(r) => format!("{}:RIB", name(r)),
        VertexKind::VlanIn(v) => format!("{}:I", self::vlan(net, *v)),
        VertexKind::VlanOut(v) => format!("{}:O", self::vlan(net, *v)),
        VertexKind::OspfIn(r) => format!("{}:OSPF:I", name(r)),
        VertexKind::OspfOut(r) => format!("{}:OSPF:O", name(r)),
        VertexKind::BgpIn(r) => format!("{}:BGP:I", name(r)),
        VertexKind::BgpOut { router, peer } => format!("{}:BGP:{}:O", name(router), name(peer)),
    };
    match vertex.layer {
        Layer::Main => kind,
        Layer::NextHop(v) => format!("[{}:{}] {}", name(&v.router), v.num, kind),
    }
}

/// Returns the formatted path, like `SRC:s1 => R1:OSPF => DST:s2`.
pub fn path(net: &NetworkModel, path: &[Vertex]) -> String {
    path.iter().map(|v| vertex(net, v)).join(" => ")
}

/// Returns the sequence of routers traversed by the path. Consecutive vertices of the same router
/// are reported only once, and the subnet vertices are skipped.
pub fn router_path(net: &NetworkModel, path: &[Vertex]) -> Vec<String> {
    path.iter()
        .filter_map(|v| v.router())
        .dedup()
        .map(|r| net.router_name(r).to_string())
        .collect()
}

/// Returns the formatted signature.
pub fn signature(sig: &Signature) -> String {
    let mut result =
        format!("local pref: {}, length: {}, cost: {}", sig.local_pref, sig.len, sig.cost);
    if !sig.tags.is_empty() {
        result.push_str(&format!(", tags: {{{}}}", sig.tags.iter().join(", ")));
    }
    result
}

/// Returns a description of the network, one line per router.
pub fn network(net: &NetworkModel) -> Vec<String> {
    net.routers()
        .map(|r| {
            let mut line = format!(
                "{}: vlans [{}]",
                r.name(),
                r.vlans().map(|v| format!("{}: {}", v.id().num, v.addr())).join(", ")
            );
            if let Some(ospf) = r.ospf() {
                line.push_str(&format!(
                    ", OSPF active on [{}]",
                    ospf.active_vlans().join(", ")
                ));
                if ospf.redistributes(Protocol::Bgp) {
                    line.push_str(" (redistributes BGP)");
                }
            }
            if let Some(bgp) = r.bgp() {
                line.push_str(&format!(
                    ", BGP sessions [{}]",
                    bgp.neighbors()
                        .map(|n| format!(
                            "{} {}",
                            if n.session_type().is_ebgp() { "eBGP" } else { "iBGP" },
                            net.router_name(n.peer())
                        ))
                        .join(", ")
                ));
                if bgp.redistributes(Protocol::Ospf) {
                    line.push_str(" (redistributes OSPF)");
                }
            }
            if r.is_switch() {
                line.push_str(", switch");
            }
            if !r.subnets().is_empty() {
                line.push_str(&format!(", subnets [{}]", r.subnets().iter().join(", ")));
            }
            line
        })
        .collect()
}

/// Returns the L2 domain of every VLAN, one line per VLAN.
pub fn l2_domains(net: &NetworkModel, l2: &L2Domains) -> Vec<String> {
    net.vlans()
        .map(|v| {
            format!(
                "{} <-> [{}]",
                vlan(net, v.id()),
                l2.adjacent(v.id()).map(|a| vlan(net, a)).join(", ")
            )
        })
        .collect()
}

/// Returns the taint state of every process in the taint graph, one line per process.
pub fn rag(net: &NetworkModel, rag: &ReachabilityTaintGraph) -> Vec<String> {
    let mut result: Vec<String> = rag
        .vertices()
        .filter_map(|(v, state)| match v {
            RagVertex::Process(p) => Some(format!(
                "{}{}{}",
                process(net, *p),
                if state.tainted { " tainted" } else { "" },
                if state.tainted_by_adjacency { " (by adjacency)" } else { "" },
            )),
            RagVertex::Subnet(_) => None,
        })
        .collect();
    result.sort();
    result
}

/// Returns all edges of the topology path graph, one line per edge.
pub fn tpg(net: &NetworkModel, tpg: &TopologyPathGraph) -> Vec<String> {
    tpg.edges()
        .map(|(a, b, e)| format!("{} -> {} ({:?})", vertex(net, a), vertex(net, b), e.kind))
        .collect()
}
