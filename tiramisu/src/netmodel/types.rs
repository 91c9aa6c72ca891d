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

//! Module containing all type definitions of the network model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Router Identification (and index into the router table of the
/// [`NetworkModel`](super::NetworkModel))
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct RouterId(pub(crate) usize);

impl RouterId {
    /// Index of the router in the router table.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for RouterId {
    fn from(idx: usize) -> Self {
        Self(idx)
    }
}

/// VLAN Identification. A VLAN number is only unique within a single router.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct VlanId {
    /// Router owning the VLAN
    pub router: RouterId,
    /// VLAN number on that router
    pub num: u32,
}

impl VlanId {
    /// Create a new VLAN identifier
    pub fn new(router: RouterId, num: u32) -> Self {
        Self { router, num }
    }
}

/// Opaque subnet label
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subnet(pub String);

impl Subnet {
    /// Get the label as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Subnet {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Subnet {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing protocol, used to describe redistribution sources.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Link-state interior protocol
    Ospf,
    /// Path-vector exterior protocol
    Bgp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ospf => f.write_str("OSPF"),
            Self::Bgp => f.write_str("BGP"),
        }
    }
}

/// Type of a BGP session
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum BgpSessionType {
    /// Session with a router of a different AS
    EBgp,
    /// Session with a router in the same AS
    IBgp,
}

impl BgpSessionType {
    /// returns true if the session type is EBgp
    pub fn is_ebgp(&self) -> bool {
        matches!(self, Self::EBgp)
    }

    /// returns true if the session type is IBgp
    pub fn is_ibgp(&self) -> bool {
        matches!(self, Self::IBgp)
    }
}

/// Errors raised while linking the raw configuration into a
/// [`NetworkModel`](super::NetworkModel). All of them are fatal.
#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    /// Two routers share the same name
    #[error("Router {0} is defined multiple times")]
    DuplicateRouter(String),
    /// Two VLANs on the same router share the same number
    #[error("VLAN {vlan} is defined multiple times on router {router}")]
    DuplicateVlan {
        /// router name
        router: String,
        /// vlan number
        vlan: u32,
    },
    /// An interface points to a router which does not exist
    #[error("Interface of {router} points to unknown router {neighbor}")]
    UnknownNeighbor {
        /// router name
        router: String,
        /// name of the missing neighbor
        neighbor: String,
    },
    /// An interface points to the router itself
    #[error("Interface of {0} points to itself")]
    SelfInterface(String),
    /// The same neighbor is listed twice
    #[error("Router {router} has multiple interfaces towards {neighbor}")]
    DuplicateInterface {
        /// router name
        router: String,
        /// neighbor name
        neighbor: String,
    },
    /// The neighbor has no interface pointing back
    #[error("Interface {router} -> {neighbor} has no reciprocal interface")]
    UnpairedInterface {
        /// router name
        router: String,
        /// neighbor name
        neighbor: String,
    },
    /// Only one end of a link assigns the interface to a VLAN
    #[error("Link {router} -> {neighbor} is assigned to a VLAN on one end only")]
    InconsistentVlanMembership {
        /// router name
        router: String,
        /// neighbor name
        neighbor: String,
    },
    /// Two VLANs carry the same address
    #[error("Address {addr} of router {router} is already used by another VLAN")]
    DuplicateAddress {
        /// router name
        router: String,
        /// duplicated address
        addr: IpAddr,
    },
    /// A VLAN is referenced that is not defined on the router
    #[error("Router {router} references the undefined VLAN {vlan}")]
    UnknownVlan {
        /// router name
        router: String,
        /// vlan number
        vlan: u32,
    },
    /// No VLAN on any other router carries the BGP neighbor address
    #[error("BGP neighbor {addr} of router {router} cannot be resolved")]
    UnknownBgpPeer {
        /// router name
        router: String,
        /// neighbor address
        addr: IpAddr,
    },
    /// The resolved BGP peer does not run BGP
    #[error("BGP peer {peer} of router {router} has no BGP process")]
    PeerWithoutBgp {
        /// router name
        router: String,
        /// peer name
        peer: String,
    },
    /// A route policy is referenced which is not defined
    #[error("Router {router} references the undefined policy {policy}")]
    UnknownPolicy {
        /// router name
        router: String,
        /// policy name
        policy: String,
    },
    /// Redistribution from a protocol that the router does not run
    #[error("Router {router} redistributes from {protocol}, which it does not run")]
    InvalidRedistribution {
        /// router name
        router: String,
        /// protocol that is missing
        protocol: Protocol,
    },
}
