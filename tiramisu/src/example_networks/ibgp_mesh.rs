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

//! # iBGP Mesh

use super::ExampleNetwork;
use crate::cases::ReachabilityCase;
use crate::netmodel::NetworkConfig;

use ipnet::IpNet;

/// # iBGP Mesh
///
/// R1, R2 and R3 form an iBGP full mesh, and R1 learns the subnet `t` from the external router E.
/// R4 is only peering with R3, and therefore never learns `t`, since R3 does not re-advertise
/// routes learned over iBGP. All internal routers run OSPF, which resolves the iBGP next hops.
///
/// ```text
///    t           s2           s3            s4
///   [E] -- 1 -- [R1] -- 12 -- [R2] -- 23 -- [R3] -- 34 -- [R4]
/// ```
pub struct IbgpMesh {}

impl ExampleNetwork for IbgpMesh {
    /// Get the configuration
    ///
    /// # Variant 0
    /// - E --> R1 (eBGP)
    /// - R1 --- R2, R1 --- R3, R2 --- R3 (iBGP)
    /// - R3 --- R4 (iBGP)
    fn config(variant: usize) -> NetworkConfig {
        if variant != 0 {
            panic!("Invalid variant number");
        }
        let ip = |s: &str| -> IpNet { s.parse().unwrap() };
        let mut c = NetworkConfig::new();
        c.router("E")
            .iface("R1", Some(1))
            .vlan(1, ip("10.0.1.1/24"))
            .bgp_external("10.0.1.2".parse().unwrap(), None, None)
            .bgp_origin("t")
            .subnet("t");
        c.router("R1")
            .iface("E", Some(1))
            .iface("R2", Some(12))
            .vlan(1, ip("10.0.1.2/24"))
            .vlan(12, ip("10.0.12.1/24"))
            .ospf_active(12)
            .bgp_external("10.0.1.1".parse().unwrap(), None, None)
            .bgp_internal("10.0.12.2".parse().unwrap(), None, None)
            .bgp_internal("10.0.23.3".parse().unwrap(), None, None);
        c.router("R2")
            .iface("R1", Some(12))
            .iface("R3", Some(23))
            .vlan(12, ip("10.0.12.2/24"))
            .vlan(23, ip("10.0.23.2/24"))
            .ospf_active(12)
            .ospf_active(23)
            .bgp_internal("10.0.12.1".parse().unwrap(), None, None)
            .bgp_internal("10.0.23.3".parse().unwrap(), None, None)
            .subnet("s2");
        c.router("R3")
            .iface("R2", Some(23))
            .iface("R4", Some(34))
            .vlan(23, ip("10.0.23.3/24"))
            .vlan(34, ip("10.0.34.3/24"))
            .ospf_active(23)
            .ospf_active(34)
            .bgp_internal("10.0.12.1".parse().unwrap(), None, None)
            .bgp_internal("10.0.23.2".parse().unwrap(), None, None)
            .bgp_internal("10.0.34.4".parse().unwrap(), None, None)
            .subnet("s3");
        c.router("R4")
            .iface("R3", Some(34))
            .vlan(34, ip("10.0.34.4/24"))
            .ospf_active(34)
            .bgp_internal("10.0.34.3".parse().unwrap(), None, None)
            .subnet("s4");

        c.case(ReachabilityCase::new("s3", "t", true).via(vec!["R3", "R2", "R1", "E"]));
        c.case(ReachabilityCase::new("s2", "t", true).via(vec!["R2", "R1", "E"]));
        c.case(ReachabilityCase::new("s4", "t", false));
        c.case(ReachabilityCase::new("s3", "t", false).fail("R2", "R3"));
        c
    }
}
