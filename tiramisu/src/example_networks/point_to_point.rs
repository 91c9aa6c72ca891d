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

//! # Point-to-Point Network

use super::ExampleNetwork;
use crate::cases::ReachabilityCase;
use crate::netmodel::NetworkConfig;

/// # Point-to-Point
///
/// Two routers, connected by a single VLAN, both running OSPF.
///
/// ```text
///   s1                    s2
///  [R1] ---- VLAN 1 ---- [R2]
/// ```
pub struct PointToPoint {}

impl ExampleNetwork for PointToPoint {
    /// Get the configuration
    ///
    /// # Variant 0
    /// - R1 (10.0.12.1/24) and R2 (10.0.12.2/24) on VLAN 1
    /// - R1 originates s1 into OSPF, R2 originates s2
    fn config(variant: usize) -> NetworkConfig {
        if variant != 0 {
            panic!("Invalid variant number");
        }
        let mut c = NetworkConfig::new();
        c.router("R1")
            .iface("R2", Some(1))
            .vlan(1, "10.0.12.1/24".parse().unwrap())
            .ospf_active(1)
            .ospf_origin("s1")
            .subnet("s1");
        c.router("R2")
            .iface("R1", Some(1))
            .vlan(1, "10.0.12.2/24".parse().unwrap())
            .ospf_active(1)
            .ospf_origin("s2")
            .subnet("s2");
        c.case(ReachabilityCase::new("s1", "s2", true).via(vec!["R1", "R2"]));
        c.case(ReachabilityCase::new("s2", "s1", true).via(vec!["R2", "R1"]));
        c.case(ReachabilityCase::new("s1", "s2", false).fail("R1", "R2"));
        c
    }
}
