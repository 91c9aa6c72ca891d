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

//! Test the computation of the L2 domains.

use crate::example_networks::{ExampleNetwork, IbgpMesh, OspfLine};
use crate::layer2::L2Domains;
use crate::netmodel::{NetworkConfig, NetworkModel, VlanId};

use maplit::btreeset;

#[test]
fn direct_links() {
    let net = OspfLine::net(0);
    let l2 = L2Domains::new(&net);
    let r1 = net.get_router_id("R1").unwrap();
    let r2 = net.get_router_id("R2").unwrap();
    let r3 = net.get_router_id("R3").unwrap();

    assert_eq!(l2.domain(VlanId::new(r1, 12)), Some(&btreeset! {VlanId::new(r2, 12)}));
    assert_eq!(l2.domain(VlanId::new(r2, 23)), Some(&btreeset! {VlanId::new(r3, 23)}));
    assert!(l2.is_adjacent(VlanId::new(r2, 12), VlanId::new(r1, 12)));
    assert!(!l2.is_adjacent(VlanId::new(r1, 12), VlanId::new(r3, 23)));
    // VLANs of the same router are never adjacent
    assert!(!l2.is_adjacent(VlanId::new(r2, 12), VlanId::new(r2, 23)));
}

#[test]
fn across_switch() {
    let net = OspfLine::net(1);
    let l2 = L2Domains::new(&net);
    let r2 = net.get_router_id("R2").unwrap();
    let r3 = net.get_router_id("R3").unwrap();
    let sw = net.get_router_id("SW").unwrap();

    assert_eq!(
        l2.domain(VlanId::new(r2, 23)),
        Some(&btreeset! {VlanId::new(r3, 23), VlanId::new(sw, 23)})
    );
    assert_eq!(
        l2.domain(VlanId::new(sw, 23)),
        Some(&btreeset! {VlanId::new(r2, 23), VlanId::new(r3, 23)})
    );
}

/// Two switches in series, and a third router attached to the second switch.
///
/// ```text
/// R1 -- S1 -- S2 -- R2
///              |
///              R3
/// ```
#[test]
fn switches_in_series() {
    let mut cfg = NetworkConfig::new();
    let ip = |s: &str| -> ipnet::IpNet { s.parse().unwrap() };
    cfg.router("R1").iface("S1", Some(1)).vlan(1, ip("10.0.0.1/24")).ospf_active(1);
    cfg.router("S1").iface("R1", Some(1)).iface("S2", Some(1)).vlan(1, ip("10.0.0.251/24"));
    cfg.router("S2")
        .iface("S1", Some(1))
        .iface("R2", Some(1))
        .iface("R3", Some(1))
        .vlan(1, ip("10.0.0.252/24"));
    cfg.router("R2").iface("S2", Some(1)).vlan(1, ip("10.0.0.2/24")).ospf_active(1);
    cfg.router("R3").iface("S2", Some(1)).vlan(1, ip("10.0.0.3/24")).ospf_active(1);
    let net = NetworkModel::from_config(&cfg).unwrap();
    let l2 = L2Domains::new(&net);

    let id = |name: &str| VlanId::new(net.get_router_id(name).unwrap(), 1);
    assert_eq!(
        l2.domain(id("R1")),
        Some(&btreeset! {id("S1"), id("S2"), id("R2"), id("R3")})
    );
    assert_eq!(
        l2.adjacent(id("R2")).collect::<Vec<_>>(),
        {
            let mut expected = vec![id("R1"), id("S1"), id("S2"), id("R3")];
            expected.sort();
            expected
        }
    );
}

#[test]
fn vlan_without_interfaces() {
    let mut cfg = NetworkConfig::new();
    cfg.router("R1").vlan(1, "10.0.0.1/24".parse().unwrap());
    let net = NetworkModel::from_config(&cfg).unwrap();
    let l2 = L2Domains::new(&net);
    let r1 = net.get_router_id("R1").unwrap();
    assert_eq!(l2.domain(VlanId::new(r1, 1)), Some(&btreeset! {}));
    assert_eq!(l2.adjacent(VlanId::new(r1, 7)).count(), 0);
}

#[test]
fn interfaces_without_vlan() {
    // E and R1 are connected, but R1 reaches E only on VLAN 1
    let net = IbgpMesh::net(0);
    let l2 = L2Domains::new(&net);
    let e = net.get_router_id("E").unwrap();
    let r1 = net.get_router_id("R1").unwrap();
    assert!(l2.is_adjacent(VlanId::new(e, 1), VlanId::new(r1, 1)));
    assert!(!l2.is_adjacent(VlanId::new(e, 1), VlanId::new(r1, 12)));
}
