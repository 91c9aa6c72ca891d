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

//! # Routing Signatures
//!
//! A [`Signature`] contains the routing attributes accumulated along a path. Every edge of the
//! topology path graph carries a list of [`EdgePolicy`], which transform the signature of the
//! next vertex into the signature of the current one.

use super::RankDomain;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Local preference of a route that was not modified by any policy.
pub const DEFAULT_LOCAL_PREF: u32 = 100;

/// Routing attributes of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Local preference
    pub local_pref: u32,
    /// Path length
    pub len: u32,
    /// IGP cost
    pub cost: u32,
    /// Route tags (communities)
    pub tags: BTreeSet<String>,
}

impl Default for Signature {
    fn default() -> Self {
        Self::origin()
    }
}

impl Signature {
    /// Signature of the destination itself
    pub fn origin() -> Self {
        Self { local_pref: DEFAULT_LOCAL_PREF, len: 0, cost: 0, tags: BTreeSet::new() }
    }

    /// Compare two signatures, in the decision process of `domain`. `Ordering::Greater` means that
    /// `self` is preferred over `other`.
    pub fn compare(&self, other: &Self, domain: RankDomain) -> Ordering {
        let lower_cost = other.cost.cmp(&self.cost);
        let shorter = other.len.cmp(&self.len);
        let higher_lp = self.local_pref.cmp(&other.local_pref);
        match domain {
            RankDomain::Igp => lower_cost.then(shorter),
            RankDomain::Bgp => higher_lp.then(shorter).then(lower_cost),
            RankDomain::Neutral => lower_cost.then(shorter).then(higher_lp),
        }
    }
}

/// Transformation of a signature along an edge. The fields are applied in the following order:
/// cost and length are added, the local preference is overwritten, tags are added, tags are
/// removed, and finally the route is dropped if any of the remaining tags is blocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePolicy {
    /// Added to the cost
    #[serde(default)]
    pub cost: u32,
    /// Added to the path length
    #[serde(default)]
    pub len: u32,
    /// Overwrites the local preference
    #[serde(default, rename = "lp", skip_serializing_if = "Option::is_none")]
    pub local_pref: Option<u32>,
    /// Tags added to the route
    #[serde(default, alias = "at", skip_serializing_if = "BTreeSet::is_empty")]
    pub add_tags: BTreeSet<String>,
    /// Tags removed from the route
    #[serde(default, alias = "rt", skip_serializing_if = "BTreeSet::is_empty")]
    pub remove_tags: BTreeSet<String>,
    /// Routes carrying any of these tags are dropped
    #[serde(default, alias = "bt", skip_serializing_if = "BTreeSet::is_empty")]
    pub block_tags: BTreeSet<String>,
}

impl EdgePolicy {
    /// Create a policy that does nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy adding `cost` to the signature
    pub fn cost(cost: u32) -> Self {
        Self { cost, ..Default::default() }
    }

    /// Policy adding `len` to the path length
    pub fn len(len: u32) -> Self {
        Self { len, ..Default::default() }
    }

    /// Policy overwriting the local preference
    pub fn local_pref(local_pref: u32) -> Self {
        Self { local_pref: Some(local_pref), ..Default::default() }
    }

    /// Add a tag to the routes
    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tags.insert(tag.into());
        self
    }

    /// Remove a tag from the routes
    pub fn remove_tag(mut self, tag: impl Into<String>) -> Self {
        self.remove_tags.insert(tag.into());
        self
    }

    /// Drop all routes with the tag
    pub fn block_tag(mut self, tag: impl Into<String>) -> Self {
        self.block_tags.insert(tag.into());
        self
    }

    /// Apply the policy on a signature. Returns `None` if the route is dropped.
    pub fn apply(&self, sig: &Signature) -> Option<Signature> {
        let mut result = sig.clone();
        result.cost = result.cost.saturating_add(self.cost);
        result.len = result.len.saturating_add(self.len);
        if let Some(lp) = self.local_pref {
            result.local_pref = lp;
        }
        result.tags.extend(self.add_tags.iter().cloned());
        for tag in self.remove_tags.iter() {
            result.tags.remove(tag);
        }
        if result.tags.iter().any(|t| self.block_tags.contains(t)) {
            None
        } else {
            Some(result)
        }
    }
}

/// Apply a sequence of policies. Returns `None` if any of them drops the route.
pub fn apply_all(policies: &[EdgePolicy], sig: &Signature) -> Option<Signature> {
    policies.iter().try_fold(sig.clone(), |s, p| p.apply(&s))
}
