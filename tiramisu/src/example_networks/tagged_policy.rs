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

//! # Tagged Policy Network

use super::ExampleNetwork;
use crate::cases::ReachabilityCase;
use crate::netmodel::NetworkConfig;
use crate::tpg::EdgePolicy;

use ipnet::IpNet;

/// # Tagged Policy
///
/// Three routers in a line, connected only by eBGP. R3 originates `t` and tags it with `x` when
/// advertising it to R2. In variant 1, R1 drops all routes tagged with `x`, such that `t` is still
/// reachable on the graph, but no route is ever selected.
///
/// ```text
///    s            t
///   [R1] -- 12 -- [R2] -- 23 -- [R3]
/// ```
pub struct TaggedPolicy {}

impl ExampleNetwork for TaggedPolicy {
    /// Get the configuration
    ///
    /// # Variant 0
    /// - R1 --> R2 --> R3 (eBGP), R3 exports with policy `tag-x`
    ///
    /// # Variant 1
    /// - Same as variant 0, but R1 imports from R2 with policy `deny-x`
    fn config(variant: usize) -> NetworkConfig {
        let import = match variant {
            0 => None,
            1 => Some("deny-x"),
            _ => panic!("Invalid variant number"),
        };
        let ip = |s: &str| -> IpNet { s.parse().unwrap() };
        let mut c = NetworkConfig::new();
        c.router("R1")
            .iface("R2", Some(12))
            .vlan(12, ip("10.0.12.1/24"))
            .bgp_external("10.0.12.2".parse().unwrap(), import, None)
            .subnet("s");
        c.router("R2")
            .iface("R1", Some(12))
            .iface("R3", Some(23))
            .vlan(12, ip("10.0.12.2/24"))
            .vlan(23, ip("10.0.23.2/24"))
            .bgp_external("10.0.12.1".parse().unwrap(), None, None)
            .bgp_external("10.0.23.3".parse().unwrap(), None, None);
        c.router("R3")
            .iface("R2", Some(23))
            .vlan(23, ip("10.0.23.3/24"))
            .bgp_external("10.0.23.2".parse().unwrap(), None, Some("tag-x"))
            .bgp_origin("t")
            .subnet("t");
        c.policy("tag-x", EdgePolicy::new().add_tag("x"));
        c.policy("deny-x", EdgePolicy::new().block_tag("x"));

        if variant == 0 {
            c.case(ReachabilityCase::new("s", "t", true).via(vec!["R1", "R2", "R3"]));
        } else {
            c.case(ReachabilityCase::new("s", "t", true));
        }
        c
    }
}
