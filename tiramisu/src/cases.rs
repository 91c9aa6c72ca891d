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

//! # Reachability Cases
//!
//! A [`ReachabilityCase`] describes an expected outcome: Is the destination reachable from the
//! origin, if some links have failed, and which routers does the traffic traverse? Cases are
//! usually stored together with the network configuration (see
//! [`NetworkConfig::tests`](crate::netmodel::NetworkConfig)).

use crate::layer2::L2Domains;
use crate::netmodel::{printer, NetworkModel, Subnet};
use crate::rag::ReachabilityTaintGraph;
use crate::tpg::{FailureSet, FidelityVariant, TopologyPathGraph};
use crate::Error;

use log::*;
use serde::{Deserialize, Serialize};

/// Expected reachability between two subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityCase {
    /// Subnet from which the packets are sent
    pub origin: Subnet,
    /// Subnet to which the packets are sent
    pub destination: Subnet,
    /// Failed links, as pairs of router names
    #[serde(default)]
    pub failures: Vec<(String, String)>,
    /// Whether any path should exist
    pub reachable: bool,
    /// Expected sequence of routers on the selected path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl ReachabilityCase {
    /// Create a new case without failures and without an expected path.
    pub fn new(origin: impl Into<Subnet>, destination: impl Into<Subnet>, reachable: bool) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            failures: Vec::new(),
            reachable,
            path: None,
        }
    }

    /// Add a failed link
    pub fn fail(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.failures.push((a.into(), b.into()));
        self
    }

    /// Set the expected sequence of routers
    pub fn via<S: Into<String>>(mut self, path: impl IntoIterator<Item = S>) -> Self {
        self.path = Some(path.into_iter().map(|r| r.into()).collect());
        self
    }
}

/// Result of checking a single case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    /// Whether any path exists, ignoring policies
    pub found: bool,
    /// Any path found by the existence query, as a sequence of routers
    pub witness: Option<Vec<String>>,
    /// Path selected by the routing protocols, as a sequence of routers
    pub best_path: Option<Vec<String>>,
    /// The outcome matches the expectation
    pub passed: bool,
}

/// Check a single case. The expected path is compared against the path selected by the
/// path-vector simulation, reconstructed router by router.
pub fn check(
    net: &NetworkModel,
    l2: &L2Domains,
    case: &ReachabilityCase,
    variant: FidelityVariant,
) -> Result<CaseOutcome, Error> {
    let mut rag = ReachabilityTaintGraph::new(net, l2, Some(&case.destination));
    rag.taint();
    let tpg = TopologyPathGraph::build(net, l2, &rag, (&case.destination, &case.origin), variant)?;
    let failures = FailureSet::from_names(net, case.failures.iter().map(|(a, b)| (a, b)));

    let witness = tpg.has_path(&failures).map(|p| printer::router_path(net, &p));
    let found = witness.is_some();
    let best_path = if found {
        tpg.best_path_reprocessed(&failures)?.map(|p| printer::router_path(net, &p))
    } else {
        None
    };

    let passed = found == case.reachable
        && match case.path.as_ref() {
            Some(expected) => best_path.as_ref() == Some(expected),
            None => true,
        };

    if passed {
        debug!("Case {} -> {} passed", case.origin, case.destination);
    } else {
        info!(
            "Case {} -> {} failed: expected reachable = {}, found = {}, path = {:?}",
            case.origin, case.destination, case.reachable, found, best_path
        );
    }

    Ok(CaseOutcome { found, witness, best_path, passed })
}

/// Check all cases, in order. Each case builds its own taint graph and topology path graph. An
/// error of a single case does not stop the others.
pub fn check_all(
    net: &NetworkModel,
    l2: &L2Domains,
    cases: &[ReachabilityCase],
    variant: FidelityVariant,
) -> Vec<Result<CaseOutcome, Error>> {
    cases.iter().map(|case| check(net, l2, case, variant)).collect()
}
