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

//! # Network Model
//!
//! This module contains the linked, immutable model of the network. Routers are stored in an
//! arena and referenced by [`RouterId`]. VLANs are referenced by [`VlanId`]. All cross-references
//! of the raw [`NetworkConfig`] (neighbor names, VLAN numbers, BGP peer addresses and policy
//! names) are resolved once during [`NetworkModel::from_config`].

use super::config::{BgpConfig, NeighborConfig, NetworkConfig, OspfConfig, RouterConfig};
use super::{BgpSessionType, ModelError, Protocol, RouterId, Subnet, VlanId};
use crate::tpg::EdgePolicy;

use ipnet::IpNet;
use log::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::IpAddr;

/// Interface of a router towards one of its neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    router: RouterId,
    neighbor: RouterId,
    vlan: Option<u32>,
}

impl Interface {
    /// Router owning this interface
    pub fn router(&self) -> RouterId {
        self.router
    }

    /// Router on the other end of the link
    pub fn neighbor(&self) -> RouterId {
        self.neighbor
    }

    /// VLAN to which this interface belongs, if any.
    pub fn vlan(&self) -> Option<VlanId> {
        self.vlan.map(|num| VlanId::new(self.router, num))
    }
}

/// VLAN on a router, with all interfaces that are members of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    id: VlanId,
    addr: IpNet,
    members: Vec<RouterId>,
}

impl Vlan {
    /// Identifier of the VLAN
    pub fn id(&self) -> VlanId {
        self.id
    }

    /// Address of the router on this VLAN, together with the prefix length.
    pub fn addr(&self) -> IpNet {
        self.addr
    }

    /// Returns the neighbors of all interfaces that are member of this VLAN, in the order in which
    /// they were configured.
    pub fn members(&self) -> &[RouterId] {
        &self.members
    }
}

/// OSPF process of a router
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OspfProcess {
    active: BTreeSet<u32>,
    origins: BTreeSet<Subnet>,
    redistribute: BTreeSet<Protocol>,
}

impl OspfProcess {
    /// Returns true if OSPF is active on the VLAN with number `num`.
    pub fn is_active(&self, num: u32) -> bool {
        self.active.contains(&num)
    }

    /// Iterate over all VLAN numbers on which OSPF is active.
    pub fn active_vlans(&self) -> impl Iterator<Item = u32> + '_ {
        self.active.iter().copied()
    }

    /// Returns true if the process originates `subnet`.
    pub fn originates(&self, subnet: &Subnet) -> bool {
        self.origins.contains(subnet)
    }

    /// Returns all originated subnets.
    pub fn origins(&self) -> &BTreeSet<Subnet> {
        &self.origins
    }

    /// Returns true if the process redistributes routes learned by `protocol`.
    pub fn redistributes(&self, protocol: Protocol) -> bool {
        self.redistribute.contains(&protocol)
    }
}

/// Resolved BGP session towards a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgpNeighbor {
    addr: IpAddr,
    session_type: BgpSessionType,
    peer: RouterId,
    peer_vlan: VlanId,
    local_vlan: Option<VlanId>,
    import: Option<String>,
    export: Option<String>,
}

impl BgpNeighbor {
    /// Address of the peer
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Type of the session
    pub fn session_type(&self) -> BgpSessionType {
        self.session_type
    }

    /// Router of the peer
    pub fn peer(&self) -> RouterId {
        self.peer
    }

    /// VLAN of the peer which carries the neighbor address
    pub fn peer_vlan(&self) -> VlanId {
        self.peer_vlan
    }

    /// Local VLAN whose prefix contains the peer address. This is `None` if the peer is not
    /// directly connected, in which case the session depends on the IGP.
    pub fn local_vlan(&self) -> Option<VlanId> {
        self.local_vlan
    }

    /// Returns true if the peer address lies in the prefix of a local VLAN.
    pub fn is_directly_connected(&self) -> bool {
        self.local_vlan.is_some()
    }

    /// Name of the import policy
    pub fn import_policy(&self) -> Option<&str> {
        self.import.as_deref()
    }

    /// Name of the export policy
    pub fn export_policy(&self) -> Option<&str> {
        self.export.as_deref()
    }
}

/// BGP process of a router
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BgpProcess {
    external: Vec<BgpNeighbor>,
    internal: Vec<BgpNeighbor>,
    origins: BTreeSet<Subnet>,
    redistribute: BTreeSet<Protocol>,
}

impl BgpProcess {
    /// Iterate over all sessions, first the eBGP ones, then the iBGP ones.
    pub fn neighbors(&self) -> impl Iterator<Item = &BgpNeighbor> {
        self.external.iter().chain(self.internal.iter())
    }

    /// Returns the (first) session towards `peer`.
    pub fn neighbor(&self, peer: RouterId) -> Option<&BgpNeighbor> {
        self.neighbors().find(|n| n.peer == peer)
    }

    /// Returns true if the process originates `subnet`.
    pub fn originates(&self, subnet: &Subnet) -> bool {
        self.origins.contains(subnet)
    }

    /// Returns all originated subnets.
    pub fn origins(&self) -> &BTreeSet<Subnet> {
        &self.origins
    }

    /// Returns true if the process redistributes routes learned by `protocol`.
    pub fn redistributes(&self, protocol: Protocol) -> bool {
        self.redistribute.contains(&protocol)
    }
}

/// Router (or plain switch, if it runs no routing process)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    id: RouterId,
    name: String,
    ifaces: BTreeMap<RouterId, Interface>,
    vlans: BTreeMap<u32, Vlan>,
    ospf: Option<OspfProcess>,
    bgp: Option<BgpProcess>,
    subnets: BTreeSet<Subnet>,
}

impl Router {
    /// Identifier of the router
    pub fn router_id(&self) -> RouterId {
        self.id
    }

    /// Name of the router
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface towards `neighbor`
    pub fn iface(&self, neighbor: RouterId) -> Option<&Interface> {
        self.ifaces.get(&neighbor)
    }

    /// Iterate over all interfaces, ordered by the neighbor id.
    pub fn ifaces(&self) -> impl Iterator<Item = &Interface> {
        self.ifaces.values()
    }

    /// Get the VLAN with number `num`.
    pub fn vlan(&self, num: u32) -> Option<&Vlan> {
        self.vlans.get(&num)
    }

    /// Iterate over all VLANs, ordered by number.
    pub fn vlans(&self) -> impl Iterator<Item = &Vlan> {
        self.vlans.values()
    }

    /// OSPF process
    pub fn ospf(&self) -> Option<&OspfProcess> {
        self.ospf.as_ref()
    }

    /// BGP process
    pub fn bgp(&self) -> Option<&BgpProcess> {
        self.bgp.as_ref()
    }

    /// Directly attached subnets
    pub fn subnets(&self) -> &BTreeSet<Subnet> {
        &self.subnets
    }

    /// Returns true if `subnet` is attached to this router.
    pub fn is_attached(&self, subnet: &Subnet) -> bool {
        self.subnets.contains(subnet)
    }

    /// Returns true if the router does not run any routing process.
    pub fn is_switch(&self) -> bool {
        self.ospf.is_none() && self.bgp.is_none()
    }
}

/// # Network Model
///
/// Immutable, fully linked representation of the network. It is built once from a
/// [`NetworkConfig`], and then shared (read-only) by all graphs built for the individual queries.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    routers: Vec<Router>,
    names: HashMap<String, RouterId>,
    policies: BTreeMap<String, EdgePolicy>,
}

impl NetworkModel {
    /// Link the raw configuration into a network model. This function checks all references of
    /// the configuration, and fails if any of them cannot be resolved.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, ModelError> {
        let mut names: HashMap<String, RouterId> = HashMap::new();
        for (idx, r) in config.routers.iter().enumerate() {
            if names.insert(r.name.clone(), RouterId(idx)).is_some() {
                return Err(ModelError::DuplicateRouter(r.name.clone()));
            }
        }

        // first pass: interfaces, VLANs and OSPF
        let mut routers = config
            .routers
            .iter()
            .enumerate()
            .map(|(idx, r)| link_router(RouterId(idx), r, &names))
            .collect::<Result<Vec<Router>, ModelError>>()?;

        // every interface must have a reciprocal one, and both ends agree on VLAN membership
        for r in routers.iter() {
            for iface in r.ifaces.values() {
                let neighbor = &routers[iface.neighbor.0];
                let peer = match neighbor.ifaces.get(&r.id) {
                    Some(peer) => peer,
                    None => {
                        return Err(ModelError::UnpairedInterface {
                            router: r.name.clone(),
                            neighbor: neighbor.name.clone(),
                        })
                    }
                };
                if iface.vlan.is_some() != peer.vlan.is_some() {
                    return Err(ModelError::InconsistentVlanMembership {
                        router: r.name.clone(),
                        neighbor: neighbor.name.clone(),
                    });
                }
            }
        }

        // second pass: BGP, which needs the VLAN addresses of all routers
        let mut addresses: HashMap<IpAddr, VlanId> = HashMap::new();
        for vlan in routers.iter().flat_map(|r| r.vlans.values()) {
            if addresses.insert(vlan.addr.addr(), vlan.id).is_some() {
                return Err(ModelError::DuplicateAddress {
                    router: routers[vlan.id.router.0].name.clone(),
                    addr: vlan.addr.addr(),
                });
            }
        }
        let has_bgp: Vec<bool> = config.routers.iter().map(|r| r.bgp.is_some()).collect();
        for (idx, r) in config.routers.iter().enumerate() {
            if let Some(bgp) = r.bgp.as_ref() {
                let process =
                    link_bgp(&routers[idx], bgp, &addresses, &has_bgp, &routers, config)?;
                routers[idx].bgp = Some(process);
            }
        }

        // redistribution is only possible from a process that exists
        for r in routers.iter() {
            let ospf_from_bgp = r.ospf.as_ref().map(|p| p.redistributes(Protocol::Bgp));
            let bgp_from_ospf = r.bgp.as_ref().map(|p| p.redistributes(Protocol::Ospf));
            if ospf_from_bgp == Some(true) && r.bgp.is_none() {
                return Err(ModelError::InvalidRedistribution {
                    router: r.name.clone(),
                    protocol: Protocol::Bgp,
                });
            }
            if bgp_from_ospf == Some(true) && r.ospf.is_none() {
                return Err(ModelError::InvalidRedistribution {
                    router: r.name.clone(),
                    protocol: Protocol::Ospf,
                });
            }
        }

        debug!(
            "Network model with {} routers, {} VLANs and {} policies",
            routers.len(),
            routers.iter().map(|r| r.vlans.len()).sum::<usize>(),
            config.policies.len()
        );

        Ok(Self { routers, names, policies: config.policies.clone() })
    }

    /// Number of routers (including plain switches)
    pub fn num_routers(&self) -> usize {
        self.routers.len()
    }

    /// Get a reference to a router.
    ///
    /// **Panics** if the id does not belong to this network.
    pub fn router(&self, id: RouterId) -> &Router {
        &self.routers[id.0]
    }

    /// Iterate over all routers, ordered by their id.
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.routers.iter()
    }

    /// Get the id of the router with the given name.
    pub fn get_router_id(&self, name: &str) -> Option<RouterId> {
        self.names.get(name).copied()
    }

    /// Get the name of a router. Unknown ids are reported as `?`.
    pub fn router_name(&self, id: RouterId) -> &str {
        self.routers.get(id.0).map(|r| r.name.as_str()).unwrap_or("?")
    }

    /// Get a VLAN by its id.
    pub fn vlan(&self, id: VlanId) -> Option<&Vlan> {
        self.routers.get(id.router.0).and_then(|r| r.vlans.get(&id.num))
    }

    /// Iterate over all VLANs of the network.
    pub fn vlans(&self) -> impl Iterator<Item = &Vlan> {
        self.routers.iter().flat_map(|r| r.vlans.values())
    }

    /// Get the interface on the other end of the link.
    pub fn peer_iface(&self, iface: &Interface) -> Option<&Interface> {
        self.routers.get(iface.neighbor.0).and_then(|n| n.ifaces.get(&iface.router))
    }

    /// Get a named policy
    pub fn policy(&self, name: &str) -> Option<&EdgePolicy> {
        self.policies.get(name)
    }

    /// Returns all subnets that are either attached to a router or originated by a process.
    pub fn subnets(&self) -> BTreeSet<&Subnet> {
        let mut result = BTreeSet::new();
        for r in self.routers.iter() {
            result.extend(r.subnets.iter());
            if let Some(ospf) = r.ospf.as_ref() {
                result.extend(ospf.origins.iter());
            }
            if let Some(bgp) = r.bgp.as_ref() {
                result.extend(bgp.origins.iter());
            }
        }
        result
    }

    /// Returns true if the subnet is attached to or originated by any router.
    pub fn knows_subnet(&self, subnet: &Subnet) -> bool {
        self.routers.iter().any(|r| {
            r.subnets.contains(subnet)
                || r.ospf.as_ref().map(|p| p.originates(subnet)).unwrap_or(false)
                || r.bgp.as_ref().map(|p| p.originates(subnet)).unwrap_or(false)
        })
    }
}

/// Link interfaces, VLANs and the OSPF process of a single router.
fn link_router(
    id: RouterId,
    cfg: &RouterConfig,
    names: &HashMap<String, RouterId>,
) -> Result<Router, ModelError> {
    let mut vlans: BTreeMap<u32, Vlan> = BTreeMap::new();
    for v in cfg.vlans.iter() {
        let vlan = Vlan { id: VlanId::new(id, v.num), addr: v.addr, members: Vec::new() };
        if vlans.insert(v.num, vlan).is_some() {
            return Err(ModelError::DuplicateVlan { router: cfg.name.clone(), vlan: v.num });
        }
    }

    let mut ifaces: BTreeMap<RouterId, Interface> = BTreeMap::new();
    for i in cfg.ifaces.iter() {
        let neighbor = *names.get(&i.neighbor).ok_or_else(|| ModelError::UnknownNeighbor {
            router: cfg.name.clone(),
            neighbor: i.neighbor.clone(),
        })?;
        if neighbor == id {
            return Err(ModelError::SelfInterface(cfg.name.clone()));
        }
        if let Some(num) = i.vlan {
            vlans
                .get_mut(&num)
                .ok_or_else(|| ModelError::UnknownVlan { router: cfg.name.clone(), vlan: num })?
                .members
                .push(neighbor);
        }
        let iface = Interface { router: id, neighbor, vlan: i.vlan };
        if ifaces.insert(neighbor, iface).is_some() {
            return Err(ModelError::DuplicateInterface {
                router: cfg.name.clone(),
                neighbor: i.neighbor.clone(),
            });
        }
    }

    let ospf = cfg.ospf.as_ref().map(|o| link_ospf(cfg, o, &vlans)).transpose()?;

    Ok(Router {
        id,
        name: cfg.name.clone(),
        ifaces,
        vlans,
        ospf,
        bgp: None,
        subnets: cfg.subnets.iter().cloned().collect(),
    })
}

fn link_ospf(
    cfg: &RouterConfig,
    ospf: &OspfConfig,
    vlans: &BTreeMap<u32, Vlan>,
) -> Result<OspfProcess, ModelError> {
    let mut active = BTreeSet::new();
    for a in ospf.active.iter() {
        if !vlans.contains_key(&a.vlan) {
            return Err(ModelError::UnknownVlan { router: cfg.name.clone(), vlan: a.vlan });
        }
        active.insert(a.vlan);
    }
    Ok(OspfProcess {
        active,
        origins: ospf.origins.iter().cloned().collect(),
        redistribute: ospf.redistribute.iter().copied().filter(|p| *p != Protocol::Ospf).collect(),
    })
}

fn link_bgp(
    router: &Router,
    bgp: &BgpConfig,
    addresses: &HashMap<IpAddr, VlanId>,
    has_bgp: &[bool],
    routers: &[Router],
    config: &NetworkConfig,
) -> Result<BgpProcess, ModelError> {
    let link = |n: &NeighborConfig, session_type: BgpSessionType| {
        link_neighbor(router, n, session_type, addresses, has_bgp, routers, config)
    };
    Ok(BgpProcess {
        external: bgp
            .external
            .iter()
            .map(|n| link(n, BgpSessionType::EBgp))
            .collect::<Result<_, _>>()?,
        internal: bgp
            .internal
            .iter()
            .map(|n| link(n, BgpSessionType::IBgp))
            .collect::<Result<_, _>>()?,
        origins: bgp.origins.iter().cloned().collect(),
        redistribute: bgp.redistribute.iter().copied().filter(|p| *p != Protocol::Bgp).collect(),
    })
}

fn link_neighbor(
    router: &Router,
    n: &NeighborConfig,
    session_type: BgpSessionType,
    addresses: &HashMap<IpAddr, VlanId>,
    has_bgp: &[bool],
    routers: &[Router],
    config: &NetworkConfig,
) -> Result<BgpNeighbor, ModelError> {
    let peer_vlan = match addresses.get(&n.addr) {
        Some(v) if v.router != router.id => *v,
        _ => {
            return Err(ModelError::UnknownBgpPeer { router: router.name.clone(), addr: n.addr })
        }
    };
    let peer = peer_vlan.router;
    if !has_bgp[peer.0] {
        return Err(ModelError::PeerWithoutBgp {
            router: router.name.clone(),
            peer: routers[peer.0].name.clone(),
        });
    }

    for policy in n.import.iter().chain(n.export.iter()) {
        if !config.policies.contains_key(policy) {
            return Err(ModelError::UnknownPolicy {
                router: router.name.clone(),
                policy: policy.clone(),
            });
        }
    }

    let local_vlan = router.vlans.values().find(|v| v.addr.contains(&n.addr)).map(|v| v.id);
    if local_vlan.is_none() && router.ospf.is_none() {
        warn!(
            "BGP peer {} of {} is neither directly connected nor reachable by OSPF",
            n.addr, router.name
        );
    }

    Ok(BgpNeighbor {
        addr: n.addr,
        session_type,
        peer,
        peer_vlan,
        local_vlan,
        import: n.import.clone(),
        export: n.export.clone(),
    })
}
