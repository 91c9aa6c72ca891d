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

#![deny(missing_docs)]

//! # Tiramisu
//!
//! This is a library for verifying the reachability between subnets in networks running OSPF and
//! BGP at the same time. Instead of simulating the protocols on every failure scenario, the
//! network is transformed into graphs, on which the questions can be answered with simple graph
//! algorithms.
//!
//! ## Structure
//!
//! - [`netmodel`]: The network model (routers, VLANs, OSPF and BGP processes), and how it is
//!   loaded from a JSON configuration.
//! - [`layer2`]: Computes which VLANs on different routers are connected on layer 2, possibly over
//!   plain switches.
//! - [`rag`]: The reachability taint graph decides which routing processes can learn a route
//!   towards the destination subnet.
//! - [`tpg`]: The topology path graph, built for a pair of destination and source subnet. It
//!   answers whether any path exists ([`tpg::TopologyPathGraph::has_path`]), and which path is
//!   selected by the protocols ([`tpg::TopologyPathGraph::best_path`]).
//! - [`cases`]: Checks expected reachability outcomes against the network.
//! - [`example_networks`]: Small networks used in tests and in the command line tool.
//!
//! ## Usage
//!
//! ```
//! use tiramisu::example_networks::{ExampleNetwork, OspfLine};
//! use tiramisu::layer2::L2Domains;
//! use tiramisu::netmodel::Subnet;
//! use tiramisu::rag::ReachabilityTaintGraph;
//! use tiramisu::tpg::{FailureSet, FidelityVariant, TopologyPathGraph};
//!
//! let net = OspfLine::net(0);
//! let l2 = L2Domains::new(&net);
//! let (dst, src) = (Subnet::from("s3"), Subnet::from("s1"));
//!
//! let mut rag = ReachabilityTaintGraph::new(&net, &l2, Some(&dst));
//! rag.taint();
//!
//! let tpg = TopologyPathGraph::build(&net, &l2, &rag, (&dst, &src), FidelityVariant::Coarse)
//!     .unwrap();
//! assert!(tpg.has_path(&FailureSet::new()).is_some());
//!
//! let failures = FailureSet::from_names(&net, vec![("R1", "R2")]);
//! assert!(tpg.has_path(&failures).is_none());
//!
//! let best = tpg.best_path(&FailureSet::new()).unwrap().unwrap();
//! assert_eq!(best.signature.cost, 2);
//! ```

pub mod cases;
mod error;
pub mod example_networks;
pub mod layer2;
pub mod netmodel;
pub mod rag;
mod test;
pub mod tpg;

pub use error::Error;
