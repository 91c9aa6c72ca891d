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

//! Networks for testing

use crate::netmodel::{NetworkConfig, NetworkModel};

mod point_to_point;
pub use point_to_point::PointToPoint;

mod ospf_line;
pub use ospf_line::OspfLine;

mod ibgp_mesh;
pub use ibgp_mesh::IbgpMesh;

mod tagged_policy;
pub use tagged_policy::TaggedPolicy;

/// Trait for easier access to example networks.
pub trait ExampleNetwork {
    /// Get the configuration of the chosen variant, including its reachability cases.
    fn config(variant: usize) -> NetworkConfig;

    /// Get the network model of the chosen variant.
    fn net(variant: usize) -> NetworkModel {
        NetworkModel::from_config(&Self::config(variant)).unwrap()
    }
}

/// Get the configuration of an example network by its name. The name is matched case-insensitive,
/// and may contain the variant number after a colon, like `ospfline:1`.
pub fn by_name(name: &str) -> Option<NetworkConfig> {
    let mut parts = name.splitn(2, ':');
    let name = parts.next()?.to_lowercase();
    let variant = match parts.next() {
        Some(v) => v.parse().ok()?,
        None => 0,
    };
    match (name.as_str(), variant) {
        ("pointtopoint", 0) => Some(PointToPoint::config(0)),
        ("ospfline", 0..=1) => Some(OspfLine::config(variant)),
        ("ibgpmesh", 0) => Some(IbgpMesh::config(0)),
        ("taggedpolicy", 0..=1) => Some(TaggedPolicy::config(variant)),
        _ => None,
    }
}

/// Names of all example networks, as accepted by [`by_name`].
pub const NAMES: [&str; 4] = ["pointtopoint", "ospfline", "ibgpmesh", "taggedpolicy"];
