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

//! # NetModel
//!
//! This module contains the model of the network under verification: routers, their interfaces
//! and VLANs, and the OSPF and BGP processes running on them. The model is built once from a
//! [`NetworkConfig`](config::NetworkConfig), and is immutable afterwards.

pub mod config;
mod network;
pub mod printer;
mod types;

pub use config::{LoadError, NetworkConfig};
pub use network::{
    BgpNeighbor, BgpProcess, Interface, NetworkModel, OspfProcess, Router, Vlan,
};
pub use types::*;
