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

//! # Path-Vector Simulation (TPVP)
//!
//! Fixed-point computation of the path every vertex of a [`TopologyPathGraph`] selects towards
//! the destination. The destination starts with the trivial path and [`Signature::origin`]. In
//! every round, each vertex (in sorted order) recomputes its best path over all outgoing edges
//! that are not affected by a failure:
//!
//! 1. The next vertex `v` must know a path, and this path must not contain the current vertex.
//! 2. The policies of the edge are applied on the signature of `v`. A blocked tag drops the
//!    candidate.
//! 3. The candidates are ranked by the [`RankDomain`](super::RankDomain) of the vertex. Ties are
//!    broken by the number of vertices on the path, and then by the vertices themselves.
//!
//! Whenever the path of a vertex `u` changes, every vertex whose path continues directly at `u`
//! loses its path (retraction), such that no path computed against an old choice of `u` survives.
//! The simulation stops as soon as a round does not change any path. If this does not happen
//! within a number of rounds proportional to the size of the graph, the simulation fails with
//! [`SimulationError::Divergence`].

use super::{apply_all, Edge, FailureSet, Signature, SimulationError, TopologyPathGraph, Vertex};

use log::*;
use petgraph::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Allowed number of rounds per vertex of the graph
static MAX_ROUNDS_PER_VERTEX: usize = 8;
/// Allowed number of rounds, independent of the graph size
static MIN_ROUNDS: usize = 16;

/// Path selected by a vertex, together with its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPath {
    /// Vertices from the selecting vertex up to the destination
    pub path: Vec<Vertex>,
    /// Signature of the path
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    path: Vec<NodeIndex>,
    signature: Signature,
}

/// Converged state of the path-vector simulation.
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    tpg: &'a TopologyPathGraph,
    routes: HashMap<NodeIndex, Route>,
    rounds: usize,
}

impl<'a> Simulation<'a> {
    /// Number of rounds until convergence
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Path selected by `vertex`, or `None` if the vertex has no path (or is not part of the
    /// graph).
    pub fn route(&self, vertex: &Vertex) -> Option<BestPath> {
        let idx = self.tpg.index(vertex).ok()?;
        self.route_of(idx)
    }

    /// Path selected by the source vertex.
    pub fn best_path(&self) -> Option<BestPath> {
        self.route_of(self.tpg.src_index())
    }

    /// Reconstruct the path of the source router by router. Every time the path enters a new
    /// router, the walk continues with the path selected by the corresponding vertex of the main
    /// layer. This resolves the paths through next-hop layers into the path that packets take.
    /// Returns `None` if the source has no path, or if packets would loop.
    pub fn reprocess(&self) -> Option<Vec<Vertex>> {
        let g = self.tpg.graph();
        let dst = self.tpg.dst_index();
        let mut result: Vec<Vertex> = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut node = self.tpg.src_index();

        loop {
            if !visited.insert(node) {
                warn!("Forwarding loop at {:?}", g[node]);
                return None;
            }
            let route = self.routes.get(&node)?;
            let owner = g[node].router();
            let mut next = None;
            for hop in route.path.iter() {
                if *hop == dst {
                    result.push(g[*hop].clone());
                    return Some(result);
                }
                if g[*hop].router() != owner {
                    next = Some(*hop);
                    break;
                }
                result.push(g[*hop].clone());
            }
            node = self.tpg.index(&g[next?].to_main()).ok()?;
        }
    }

    fn route_of(&self, idx: NodeIndex) -> Option<BestPath> {
        let g = self.tpg.graph();
        self.routes.get(&idx).map(|r| BestPath {
            path: r.path.iter().map(|n| g[*n].clone()).collect(),
            signature: r.signature.clone(),
        })
    }
}

impl TopologyPathGraph {
    /// Run the path-vector simulation until it converges.
    pub fn simulate(&self, failures: &FailureSet) -> Result<Simulation<'_>, SimulationError> {
        let g = self.graph();
        let dst = self.dst_index();

        let mut order: Vec<NodeIndex> = g.node_indices().filter(|n| *n != dst).collect();
        order.sort_by(|a, b| g[*a].cmp(&g[*b]));

        let out: HashMap<NodeIndex, Vec<(NodeIndex, &Edge)>> = order
            .iter()
            .map(|u| {
                let edges = g
                    .edges(*u)
                    .filter(|e| !failures.is_failed(&g[*u], &g[e.target()]))
                    .map(|e| (e.target(), e.weight()))
                    .collect();
                (*u, edges)
            })
            .collect();

        let mut routes: HashMap<NodeIndex, Route> = HashMap::new();
        routes.insert(dst, Route { path: vec![dst], signature: Signature::origin() });

        let limit = MAX_ROUNDS_PER_VERTEX * g.node_count() + MIN_ROUNDS;
        let mut rounds = 0;
        loop {
            if rounds >= limit {
                return Err(SimulationError::Divergence(rounds));
            }
            rounds += 1;

            let mut changed = false;
            for u in order.iter() {
                let candidate = self.best_candidate(*u, &out[u], &routes);
                if routes.get(u) == candidate.as_ref() {
                    continue;
                }
                changed = true;
                match candidate {
                    Some(route) => routes.insert(*u, route),
                    None => routes.remove(u),
                };
                // retract every path that continues directly at u
                let stale: Vec<NodeIndex> = g
                    .neighbors_directed(*u, Incoming)
                    .filter(|w| routes.get(w).map(|r| r.path.get(1) == Some(u)).unwrap_or(false))
                    .collect();
                for w in stale {
                    trace!("Retract the path of {:?}", g[w]);
                    routes.remove(&w);
                }
            }

            trace!("Round {}: {} vertices know a path", rounds, routes.len());
            if !changed {
                break;
            }
        }

        debug!("Path-vector simulation converged after {} rounds", rounds);
        Ok(Simulation { tpg: self, routes, rounds })
    }

    /// Compute the path selected by the source vertex, and its signature. Returns `None` if the
    /// source does not select any path.
    pub fn best_path(&self, failures: &FailureSet) -> Result<Option<BestPath>, SimulationError> {
        Ok(self.simulate(failures)?.best_path())
    }

    /// Compute the path selected by the source, reconstructed router by router (see
    /// [`Simulation::reprocess`]).
    pub fn best_path_reprocessed(
        &self,
        failures: &FailureSet,
    ) -> Result<Option<Vec<Vertex>>, SimulationError> {
        Ok(self.simulate(failures)?.reprocess())
    }

    fn best_candidate(
        &self,
        u: NodeIndex,
        out: &[(NodeIndex, &Edge)],
        routes: &HashMap<NodeIndex, Route>,
    ) -> Option<Route> {
        let mut best: Option<Route> = None;
        for (v, edge) in out {
            let route = match routes.get(v) {
                Some(r) if !r.path.contains(&u) => r,
                _ => continue,
            };
            let signature = match apply_all(&edge.policies, &route.signature) {
                Some(s) => s,
                None => continue,
            };
            let mut path = Vec::with_capacity(route.path.len() + 1);
            path.push(u);
            path.extend(route.path.iter().copied());
            let candidate = Route { path, signature };
            let better = match best.as_ref() {
                None => true,
                Some(b) => self.prefer(u, &candidate, b) == Ordering::Greater,
            };
            if better {
                best = Some(candidate);
            }
        }
        best
    }

    /// Compare two routes of `u`. `Ordering::Greater` means that `a` is preferred.
    fn prefer(&self, u: NodeIndex, a: &Route, b: &Route) -> Ordering {
        let g = self.graph();
        a.signature
            .compare(&b.signature, g[u].kind.rank_domain())
            .then_with(|| b.path.len().cmp(&a.path.len()))
            .then_with(|| {
                let vertices_a = a.path.iter().map(|n| &g[*n]);
                let vertices_b = b.path.iter().map(|n| &g[*n]);
                vertices_b.cmp(vertices_a)
            })
    }
}
