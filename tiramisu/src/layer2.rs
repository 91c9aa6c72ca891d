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

//! # Layer-2 Domains
//!
//! Two VLANs on different routers are L2-adjacent if they are connected by a chain of interfaces
//! that only passes through plain switches (routers without any routing process). This module
//! precomputes this relation for every VLAN of the network.

use crate::netmodel::{NetworkModel, VlanId};

use log::*;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Precomputed L2 adjacency of all VLANs in a network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct L2Domains {
    adjacency: HashMap<VlanId, BTreeSet<VlanId>>,
}

impl L2Domains {
    /// Compute the extended broadcast domain of every VLAN in the network.
    pub fn new(net: &NetworkModel) -> Self {
        let adjacency: HashMap<VlanId, BTreeSet<VlanId>> =
            net.vlans().map(|v| (v.id(), extended_domain(net, v.id()))).collect();
        debug!(
            "Computed L2 domains: {} VLANs, {} adjacencies",
            adjacency.len(),
            adjacency.values().map(|a| a.len()).sum::<usize>()
        );
        Self { adjacency }
    }

    /// Returns the set of VLANs that are L2-adjacent to `vlan`. Unknown VLANs have no neighbors.
    pub fn adjacent(&self, vlan: VlanId) -> impl Iterator<Item = VlanId> + '_ {
        self.adjacency.get(&vlan).into_iter().flat_map(|s| s.iter().copied())
    }

    /// Returns true if `a` and `b` are L2-adjacent.
    pub fn is_adjacent(&self, a: VlanId, b: VlanId) -> bool {
        self.adjacency.get(&a).map(|s| s.contains(&b)).unwrap_or(false)
    }

    /// Returns the domain of a VLAN as a set, if the VLAN is known.
    pub fn domain(&self, vlan: VlanId) -> Option<&BTreeSet<VlanId>> {
        self.adjacency.get(&vlan)
    }
}

/// Depth-first search over the physical links, starting at `origin`. The search only continues
/// through VLANs on plain switches.
fn extended_domain(net: &NetworkModel, origin: VlanId) -> BTreeSet<VlanId> {
    let mut result = BTreeSet::new();
    let mut visited: HashSet<VlanId> = HashSet::new();
    let mut stack = vec![origin];
    visited.insert(origin);

    while let Some(vlan_id) = stack.pop() {
        let router = net.router(vlan_id.router);
        let vlan = match router.vlan(vlan_id.num) {
            Some(v) => v,
            None => continue,
        };
        for neighbor in vlan.members() {
            let peer_vlan = router
                .iface(*neighbor)
                .and_then(|iface| net.peer_iface(iface))
                .and_then(|peer| peer.vlan());
            let peer_vlan = match peer_vlan {
                Some(v) => v,
                None => continue,
            };
            if !visited.insert(peer_vlan) {
                continue;
            }
            if peer_vlan.router != origin.router {
                result.insert(peer_vlan);
            }
            if net.router(peer_vlan.router).is_switch() {
                stack.push(peer_vlan);
            }
        }
    }

    result
}
