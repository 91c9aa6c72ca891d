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

//! Test the reachability taint graph.

use crate::example_networks::{ExampleNetwork, IbgpMesh, OspfLine, PointToPoint};
use crate::layer2::L2Domains;
use crate::netmodel::{NetworkConfig, NetworkModel, RouterId, Subnet};
use crate::rag::{Process::*, RagEdgeKind, RagVertex, ReachabilityTaintGraph};

use ipnet::IpNet;
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::net::IpAddr;

lazy_static! {
    static ref E: RouterId = 0.into();
    static ref R1: RouterId = 1.into();
    static ref R2: RouterId = 2.into();
    static ref R3: RouterId = 3.into();
    static ref R4: RouterId = 4.into();
}

fn tainted(net: &NetworkModel, subnet: &str) -> ReachabilityTaintGraph {
    let l2 = L2Domains::new(net);
    let mut rag = ReachabilityTaintGraph::new(net, &l2, Some(&Subnet::from(subnet)));
    rag.taint();
    rag
}

#[test]
fn ospf_adjacencies() {
    let net = OspfLine::net(0);
    let r1 = net.get_router_id("R1").unwrap();
    let r2 = net.get_router_id("R2").unwrap();
    let r3 = net.get_router_id("R3").unwrap();
    let rag = tainted(&net, "s3");

    assert_eq!(rag.tainted_processes(), vec![Ospf(r1), Ospf(r2), Ospf(r3)]);
    assert!(rag.was_tainted_by_adjacency(Ospf(r1)));
    assert!(rag.was_tainted_by_adjacency(Ospf(r2)));
    // R3 originates the subnet itself
    assert!(!rag.was_tainted_by_adjacency(Ospf(r3)));
    assert!(rag.propagated(Ospf(r3), Ospf(r2)));
    assert!(rag.propagated(Ospf(r2), Ospf(r1)));
    // no BGP anywhere
    assert!(!rag.is_tainted(Bgp(r1)));

    let adjacencies = rag.edges().filter(|(_, _, e)| e.kind == RagEdgeKind::IgpAdjacency).count();
    assert_eq!(adjacencies, 4);
}

#[test]
fn ospf_across_switch() {
    let net = OspfLine::net(1);
    let r1 = net.get_router_id("R1").unwrap();
    let r3 = net.get_router_id("R3").unwrap();
    let rag = tainted(&net, "s1");
    assert!(rag.is_tainted(Ospf(r3)));
    assert!(rag.was_tainted_by_adjacency(Ospf(r3)));
    assert!(!rag.was_tainted_by_adjacency(Ospf(r1)));
}

#[test]
fn ibgp_is_not_readvertised() {
    let net = IbgpMesh::net(0);
    assert_eq!(net.get_router_id("E"), Some(*E));
    assert_eq!(net.get_router_id("R4"), Some(*R4));
    let rag = tainted(&net, "t");

    assert_eq!(rag.tainted_processes(), vec![Bgp(*E), Bgp(*R1), Bgp(*R2), Bgp(*R3)]);
    assert!(!rag.is_tainted(Bgp(*R4)));
    assert!(!rag.is_tainted(Ospf(*R1)));

    assert!(rag.propagated(Bgp(*E), Bgp(*R1)));
    assert!(rag.propagated(Bgp(*R1), Bgp(*R2)));
    assert!(rag.propagated(Bgp(*R1), Bgp(*R3)));
    assert!(!rag.propagated(Bgp(*R2), Bgp(*R3)));
    assert!(!rag.propagated(Bgp(*R3), Bgp(*R2)));
    assert!(!rag.propagated(Bgp(*R3), Bgp(*R4)));

    let ibgp = rag.edges().filter(|(_, _, e)| e.kind == RagEdgeKind::IBgp).count();
    assert_eq!(ibgp, 8);
}

/// The iBGP rule must not depend on the order of the traversal: R2 is reached both over iBGP
/// (from R1) and over eBGP (from E), so it advertises the route to R3.
///
/// ```text
///       E
///      / \
///    R1 - R2 - R3
/// ```
#[test]
fn ibgp_order_independent() {
    let ip = |s: &str| -> IpNet { s.parse().unwrap() };
    let addr = |s: &str| -> IpAddr { s.parse().unwrap() };
    let mut cfg = NetworkConfig::new();
    cfg.router("E")
        .iface("R1", Some(1))
        .iface("R2", Some(2))
        .vlan(1, ip("10.0.1.1/24"))
        .vlan(2, ip("10.0.2.1/24"))
        .bgp_external(addr("10.0.1.2"), None, None)
        .bgp_external(addr("10.0.2.2"), None, None)
        .bgp_origin("t")
        .subnet("t");
    cfg.router("R1")
        .iface("E", Some(1))
        .iface("R2", Some(12))
        .vlan(1, ip("10.0.1.2/24"))
        .vlan(12, ip("10.0.12.1/24"))
        .bgp_external(addr("10.0.1.1"), None, None)
        .bgp_internal(addr("10.0.12.2"), None, None);
    cfg.router("R2")
        .iface("E", Some(2))
        .iface("R1", Some(12))
        .iface("R3", Some(23))
        .vlan(2, ip("10.0.2.2/24"))
        .vlan(12, ip("10.0.12.2/24"))
        .vlan(23, ip("10.0.23.2/24"))
        .bgp_external(addr("10.0.2.1"), None, None)
        .bgp_internal(addr("10.0.12.1"), None, None)
        .bgp_internal(addr("10.0.23.3"), None, None);
    cfg.router("R3")
        .iface("R2", Some(23))
        .vlan(23, ip("10.0.23.3/24"))
        .bgp_internal(addr("10.0.23.2"), None, None);
    let net = NetworkModel::from_config(&cfg).unwrap();
    let rag = tainted(&net, "t");

    assert!(rag.is_tainted(Bgp(*R3)));
    assert!(rag.propagated(Bgp(*R2), Bgp(*R3)));
    assert!(rag.propagated(Bgp(*R1), Bgp(*R2)));
    assert!(rag.was_tainted_by_adjacency(Bgp(*R3)));
}

#[test]
fn taint_is_idempotent() {
    let net = IbgpMesh::net(0);
    let mut rag = tainted(&net, "t");
    let before = rag.tainted_processes();
    let edges_before: Vec<bool> = rag.edges().map(|(_, _, e)| e.propagated).collect();
    rag.taint();
    assert_eq!(rag.tainted_processes(), before);
    assert_eq!(rag.edges().map(|(_, _, e)| e.propagated).collect::<Vec<_>>(), edges_before);
}

#[test]
fn taint_monotonicity() {
    let full = IbgpMesh::net(0);
    let full_taint: HashSet<_> = tainted(&full, "t").tainted_processes().into_iter().collect();

    // remove the iBGP session between R1 and R3
    let mut cfg = IbgpMesh::config(0);
    let r1_to_r3: IpAddr = "10.0.23.3".parse().unwrap();
    let r3_to_r1: IpAddr = "10.0.12.1".parse().unwrap();
    for r in cfg.routers.iter_mut() {
        let name = r.name.clone();
        if let Some(bgp) = r.bgp.as_mut() {
            bgp.internal.retain(|n| {
                !(name == "R1" && n.addr == r1_to_r3 || name == "R3" && n.addr == r3_to_r1)
            });
        }
    }
    let reduced = NetworkModel::from_config(&cfg).unwrap();
    let reduced_taint: HashSet<_> =
        tainted(&reduced, "t").tainted_processes().into_iter().collect();

    assert!(reduced_taint.is_subset(&full_taint));
    assert!(!reduced_taint.contains(&Bgp(*R3)));
    assert!(reduced_taint.contains(&Bgp(*R2)));
}

#[test]
fn without_subnet() {
    let net = PointToPoint::net(0);
    let l2 = L2Domains::new(&net);
    let mut rag = ReachabilityTaintGraph::new(&net, &l2, None);
    assert!(!rag.has_run());
    rag.taint();
    assert!(rag.has_run());
    assert!(rag.tainted_processes().is_empty());
    assert_eq!(rag.vertices().count(), 2);
    assert!(rag.vertices().all(|(v, _)| matches!(v, RagVertex::Process(_))));
}

#[test]
fn unknown_subnet() {
    let net = PointToPoint::net(0);
    let rag = tainted(&net, "nowhere");
    assert!(rag.tainted_processes().is_empty());
    assert_eq!(rag.subnet(), Some(&Subnet::from("nowhere")));
}
