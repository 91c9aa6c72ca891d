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

//! # Network Configuration
//!
//! This module contains the raw, unlinked description of a network, as it is stored in a JSON
//! document. A [`NetworkConfig`] references routers, VLANs and policies only by name or number.
//! It is turned into a [`NetworkModel`](super::NetworkModel) by
//! [`NetworkModel::from_config`](super::NetworkModel::from_config), which checks that all
//! references can be resolved.
//!
//! The configuration can either be loaded from a file, or built in code using the builder
//! functions on [`NetworkConfig`] and [`RouterConfig`]:
//!
//! ```
//! use tiramisu::netmodel::{NetworkConfig, NetworkModel};
//!
//! let mut cfg = NetworkConfig::new();
//! cfg.router("R1")
//!     .iface("R2", Some(1))
//!     .vlan(1, "10.0.0.1/24".parse().unwrap())
//!     .ospf_active(1)
//!     .ospf_origin("s1")
//!     .subnet("s1");
//! cfg.router("R2")
//!     .iface("R1", Some(1))
//!     .vlan(1, "10.0.0.2/24".parse().unwrap())
//!     .ospf_active(1);
//!
//! let net = NetworkModel::from_config(&cfg).unwrap();
//! assert_eq!(net.num_routers(), 2);
//! ```

use super::{Protocol, Subnet};
use crate::cases::ReachabilityCase;
use crate::tpg::EdgePolicy;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

/// Raw description of an entire network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// All routers (and switches) of the network
    #[serde(default)]
    pub routers: Vec<RouterConfig>,
    /// Named route policies, referenced by the BGP neighbors
    #[serde(default)]
    pub policies: BTreeMap<String, EdgePolicy>,
    /// Reachability test cases
    #[serde(default)]
    pub tests: Vec<ReachabilityCase>,
}

/// Raw description of a single router
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Unique name of the router
    pub name: String,
    /// Interfaces, one per neighbor
    #[serde(default)]
    pub ifaces: Vec<InterfaceConfig>,
    /// VLANs defined on this router
    #[serde(default)]
    pub vlans: Vec<VlanConfig>,
    /// OSPF process, if the router runs OSPF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ospf: Option<OspfConfig>,
    /// BGP process, if the router runs BGP
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp: Option<BgpConfig>,
    /// Subnets directly attached to this router
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

/// Interface towards a neighboring router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Name of the neighboring router
    pub neighbor: String,
    /// VLAN number to which this interface belongs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u32>,
}

/// VLAN with its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanConfig {
    /// VLAN number
    pub num: u32,
    /// Address and prefix length of the router on this VLAN
    pub addr: IpNet,
}

/// Reference to a VLAN on which OSPF is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveVlan {
    /// VLAN number
    pub vlan: u32,
}

/// Raw OSPF process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfConfig {
    /// VLANs on which OSPF is active
    #[serde(default)]
    pub active: Vec<ActiveVlan>,
    /// Subnets originated by this process
    #[serde(default)]
    pub origins: Vec<Subnet>,
    /// Protocols from which routes are redistributed into OSPF
    #[serde(default)]
    pub redistribute: Vec<Protocol>,
}

/// Raw BGP process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpConfig {
    /// eBGP neighbors
    #[serde(default)]
    pub external: Vec<NeighborConfig>,
    /// iBGP neighbors
    #[serde(default)]
    pub internal: Vec<NeighborConfig>,
    /// Subnets originated by this process
    #[serde(default)]
    pub origins: Vec<Subnet>,
    /// Protocols from which routes are redistributed into BGP
    #[serde(default)]
    pub redistribute: Vec<Protocol>,
}

/// Raw BGP neighbor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborConfig {
    /// Address of the peer
    pub addr: IpAddr,
    /// Name of the policy applied to routes received from this neighbor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
    /// Name of the policy applied to routes sent to this neighbor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,
}

/// Errors while reading a configuration document
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file cannot be read
    #[error("Cannot read the configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid
    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse the configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration into a pretty JSON string.
    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a new router with the given name and return a mutable reference to it.
    pub fn router(&mut self, name: impl Into<String>) -> &mut RouterConfig {
        self.routers.push(RouterConfig { name: name.into(), ..Default::default() });
        let last = self.routers.len() - 1;
        &mut self.routers[last]
    }

    /// Add a named policy
    pub fn policy(&mut self, name: impl Into<String>, policy: EdgePolicy) -> &mut Self {
        self.policies.insert(name.into(), policy);
        self
    }

    /// Add a reachability test case
    pub fn case(&mut self, case: ReachabilityCase) -> &mut Self {
        self.tests.push(case);
        self
    }
}

impl RouterConfig {
    /// Add an interface towards `neighbor`, optionally assigned to a VLAN.
    pub fn iface(&mut self, neighbor: impl Into<String>, vlan: Option<u32>) -> &mut Self {
        self.ifaces.push(InterfaceConfig { neighbor: neighbor.into(), vlan });
        self
    }

    /// Add a VLAN
    pub fn vlan(&mut self, num: u32, addr: IpNet) -> &mut Self {
        self.vlans.push(VlanConfig { num, addr });
        self
    }

    /// Attach a subnet to the router
    pub fn subnet(&mut self, subnet: impl Into<Subnet>) -> &mut Self {
        self.subnets.push(subnet.into());
        self
    }

    /// Enable OSPF on a VLAN. This creates the OSPF process if necessary.
    pub fn ospf_active(&mut self, vlan: u32) -> &mut Self {
        self.ospf_mut().active.push(ActiveVlan { vlan });
        self
    }

    /// Originate a subnet in OSPF. This creates the OSPF process if necessary.
    pub fn ospf_origin(&mut self, subnet: impl Into<Subnet>) -> &mut Self {
        self.ospf_mut().origins.push(subnet.into());
        self
    }

    /// Redistribute routes of `protocol` into OSPF.
    pub fn ospf_redistribute(&mut self, protocol: Protocol) -> &mut Self {
        self.ospf_mut().redistribute.push(protocol);
        self
    }

    /// Add an eBGP neighbor. This creates the BGP process if necessary.
    pub fn bgp_external(
        &mut self,
        addr: IpAddr,
        import: Option<&str>,
        export: Option<&str>,
    ) -> &mut Self {
        self.bgp_mut().external.push(neighbor(addr, import, export));
        self
    }

    /// Add an iBGP neighbor. This creates the BGP process if necessary.
    pub fn bgp_internal(
        &mut self,
        addr: IpAddr,
        import: Option<&str>,
        export: Option<&str>,
    ) -> &mut Self {
        self.bgp_mut().internal.push(neighbor(addr, import, export));
        self
    }

    /// Originate a subnet in BGP. This creates the BGP process if necessary.
    pub fn bgp_origin(&mut self, subnet: impl Into<Subnet>) -> &mut Self {
        self.bgp_mut().origins.push(subnet.into());
        self
    }

    /// Redistribute routes of `protocol` into BGP.
    pub fn bgp_redistribute(&mut self, protocol: Protocol) -> &mut Self {
        self.bgp_mut().redistribute.push(protocol);
        self
    }

    fn ospf_mut(&mut self) -> &mut OspfConfig {
        self.ospf.get_or_insert_with(OspfConfig::default)
    }

    fn bgp_mut(&mut self) -> &mut BgpConfig {
        self.bgp.get_or_insert_with(BgpConfig::default)
    }
}

fn neighbor(addr: IpAddr, import: Option<&str>, export: Option<&str>) -> NeighborConfig {
    NeighborConfig {
        addr,
        import: import.map(|s| s.to_string()),
        export: export.map(|s| s.to_string()),
    }
}
