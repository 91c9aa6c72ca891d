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

//! # OSPF Line

use super::ExampleNetwork;
use crate::cases::ReachabilityCase;
use crate::netmodel::NetworkConfig;

/// # OSPF Line
///
/// Three routers in a line, all running OSPF. In variant 1, the link between R2 and R3 passes
/// through a plain switch.
///
/// ```text
///   s1                            s3
///  [R1] -- 12 -- [R2] -- 23 -- [R3]
///
///  [R1] -- 12 -- [R2] -- 23 -- (SW) -- 23 -- [R3]
/// ```
pub struct OspfLine {}

impl ExampleNetwork for OspfLine {
    /// Get the configuration
    ///
    /// # Variant 0
    /// - R1 and R2 on VLAN 12 (10.0.12.0/24), R2 and R3 on VLAN 23 (10.0.23.0/24)
    /// - OSPF is active on all VLANs
    /// - R1 originates s1, R3 originates s3
    ///
    /// # Variant 1
    /// - Same as variant 0, but R2 and R3 are connected over the switch SW.
    fn config(variant: usize) -> NetworkConfig {
        let (r2_peer, r3_peer) = match variant {
            0 => ("R3", "R2"),
            1 => ("SW", "SW"),
            _ => panic!("Invalid variant number"),
        };
        let mut c = NetworkConfig::new();
        c.router("R1")
            .iface("R2", Some(12))
            .vlan(12, "10.0.12.1/24".parse().unwrap())
            .ospf_active(12)
            .ospf_origin("s1")
            .subnet("s1");
        c.router("R2")
            .iface("R1", Some(12))
            .iface(r2_peer, Some(23))
            .vlan(12, "10.0.12.2/24".parse().unwrap())
            .vlan(23, "10.0.23.2/24".parse().unwrap())
            .ospf_active(12)
            .ospf_active(23);
        c.router("R3")
            .iface(r3_peer, Some(23))
            .vlan(23, "10.0.23.3/24".parse().unwrap())
            .ospf_active(23)
            .ospf_origin("s3")
            .subnet("s3");
        if variant == 1 {
            c.router("SW")
                .iface("R2", Some(23))
                .iface("R3", Some(23))
                .vlan(23, "10.0.23.254/24".parse().unwrap());
        }

        let path = match variant {
            0 => vec!["R1", "R2", "R3"],
            _ => vec!["R1", "R2", "SW", "R3"],
        };
        c.case(ReachabilityCase::new("s1", "s3", true).via(path));
        c.case(ReachabilityCase::new("s1", "s3", false).fail("R1", "R2"));
        c.case(ReachabilityCase::new("s1", "s3", false).fail("R2", r2_peer));
        c.case(ReachabilityCase::new("s3", "s1", true).fail("R1", "R3"));
        c
    }
}
