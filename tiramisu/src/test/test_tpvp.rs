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

//! Test the path-vector simulation on hand-made graphs.

use crate::example_networks::{ExampleNetwork, IbgpMesh};
use crate::layer2::L2Domains;
use crate::netmodel::{RouterId, Subnet};
use crate::rag::ReachabilityTaintGraph;
use crate::tpg::{
    Edge, EdgeKind, EdgePolicy, FailureSet, FidelityVariant, Signature, SimulationError,
    TopologyPathGraph, Vertex, VertexKind::*,
};

use lazy_static::lazy_static;
use maplit::btreeset;

lazy_static! {
    static ref R0: RouterId = 0.into();
    static ref R1: RouterId = 1.into();
    static ref R2: RouterId = 2.into();
    static ref DST: Vertex = Vertex::main(Destination("d".into()));
    static ref SRC: Vertex = Vertex::main(Source("s".into()));
    static ref A: Vertex = Vertex::main(BgpIn(*R0));
    static ref B: Vertex = Vertex::main(BgpIn(*R1));
    static ref C: Vertex = Vertex::main(BgpIn(*R2));
}

fn graph(
    vertices: &[&Vertex],
    edges: Vec<(&Vertex, &Vertex, Vec<EdgePolicy>)>,
) -> TopologyPathGraph {
    let mut g = TopologyPathGraph::empty(FidelityVariant::Fine, &"d".into(), &"s".into());
    for v in vertices {
        g.add_vertex((*v).clone());
    }
    for (a, b, policies) in edges {
        assert!(g.add_edge(a, b, Edge::with_policies(EdgeKind::Relay, policies)));
    }
    g
}

/// Four vertices in a cycle. A first selects its direct route, and C learns it. Once A switches
/// to the route over B, the route of C must be withdrawn and recomputed, or else the source ends
/// up with the stale route over A directly.
///
/// ```text
///  SRC -> C -> A -> D
///         ^    |    ^
///         |    v    |
///         '--- B ---'
/// ```
fn retraction_graph(reversed: bool) -> TopologyPathGraph {
    let mut vertices = vec![&*A, &*B, &*C];
    let mut edges = vec![
        (&*A, &*DST, vec![EdgePolicy::local_pref(150)]),
        (&*A, &*B, vec![EdgePolicy::local_pref(300)]),
        (&*B, &*DST, vec![]),
        (&*B, &*C, vec![EdgePolicy::local_pref(200)]),
        (&*C, &*A, vec![]),
        (&*SRC, &*C, vec![]),
    ];
    if reversed {
        vertices.reverse();
        edges.reverse();
    }
    graph(&vertices, edges)
}

#[test]
fn retraction() {
    let _ = pretty_env_logger::try_init();
    let g = retraction_graph(false);
    let sim = g.simulate(&FailureSet::new()).unwrap();

    let best = sim.best_path().unwrap();
    assert_eq!(best.path, vec![SRC.clone(), C.clone(), A.clone(), B.clone(), DST.clone()]);
    assert_eq!(best.signature, Signature { local_pref: 300, ..Signature::origin() });

    assert_eq!(sim.route(&*A).unwrap().path, vec![A.clone(), B.clone(), DST.clone()]);
    assert_eq!(sim.route(&*B).unwrap().path, vec![B.clone(), DST.clone()]);
    assert_eq!(sim.route(&*C).unwrap().path, vec![C.clone(), A.clone(), B.clone(), DST.clone()]);
    assert_eq!(sim.route(&*DST).unwrap().path, vec![DST.clone()]);
    assert!(sim.rounds() >= 2);
}

#[test]
fn routes_are_consistent() {
    let g = retraction_graph(false);
    let sim = g.simulate(&FailureSet::new()).unwrap();
    for v in g.vertices() {
        if let Some(route) = sim.route(v) {
            assert_eq!(&route.path[0], v);
            if route.path.len() > 1 {
                let next = sim.route(&route.path[1]).unwrap();
                assert_eq!(next.path, route.path[1..].to_vec());
            }
        }
    }
}

#[test]
fn deterministic() {
    let first = retraction_graph(false).best_path(&FailureSet::new()).unwrap();
    let second = retraction_graph(true).best_path(&FailureSet::new()).unwrap();
    assert_eq!(first, second);

    let net = IbgpMesh::net(0);
    let l2 = L2Domains::new(&net);
    let (dst, src) = (Subnet::from("t"), Subnet::from("s3"));
    let mut rag = ReachabilityTaintGraph::new(&net, &l2, Some(&dst));
    rag.taint();
    let tpg =
        TopologyPathGraph::build(&net, &l2, &rag, (&dst, &src), FidelityVariant::Fine).unwrap();
    let reference = tpg.best_path(&FailureSet::new()).unwrap();
    for _ in 0..5 {
        assert_eq!(tpg.best_path(&FailureSet::new()).unwrap(), reference);
    }
}

#[test]
fn divergence() {
    let direct = |tag: &str| vec![EdgePolicy::new().add_tag(tag)];
    let relay = |a: &str, b: &str| vec![EdgePolicy::local_pref(200).block_tag(a).block_tag(b)];
    let g = graph(
        &[&*A, &*B, &*C],
        vec![
            (&*A, &*DST, direct("a-direct")),
            (&*B, &*DST, direct("b-direct")),
            (&*C, &*DST, direct("c-direct")),
            (&*A, &*B, relay("a-direct", "c-direct")),
            (&*B, &*C, relay("a-direct", "b-direct")),
            (&*C, &*A, relay("b-direct", "c-direct")),
            (&*SRC, &*A, vec![]),
        ],
    );
    match g.simulate(&FailureSet::new()) {
        Err(SimulationError::Divergence(rounds)) => assert!(rounds >= 16),
        Ok(_) => panic!("The simulation must not converge"),
    }
    assert!(g.best_path(&FailureSet::new()).is_err());
    // the graph still has a path
    assert!(g.has_path(&FailureSet::new()).is_some());
}

#[test]
fn veto_drops_candidate() {
    let g = graph(
        &[&*A, &*B],
        vec![
            (&*A, &*DST, vec![EdgePolicy::new().add_tag("x")]),
            (&*B, &*A, vec![EdgePolicy::local_pref(500).block_tag("x")]),
            (&*B, &*DST, vec![EdgePolicy::len(3)]),
            (&*SRC, &*B, vec![]),
        ],
    );
    let best = g.best_path(&FailureSet::new()).unwrap().unwrap();
    assert_eq!(best.path, vec![SRC.clone(), B.clone(), DST.clone()]);
    assert_eq!(best.signature.len, 3);
    assert!(best.signature.tags.is_empty());
}

#[test]
fn ranking_domains() {
    let ospf_a = Vertex::main(OspfIn(*R0));
    let ospf_b = Vertex::main(OspfIn(*R1));
    let ospf_c = Vertex::main(OspfIn(*R2));

    // IGP: lower cost wins over a shorter path
    let g = graph(
        &[&ospf_a, &ospf_b, &ospf_c],
        vec![
            (&ospf_a, &*DST, vec![EdgePolicy::cost(5)]),
            (&ospf_a, &ospf_b, vec![EdgePolicy::cost(1)]),
            (&ospf_b, &ospf_c, vec![EdgePolicy::cost(1)]),
            (&ospf_c, &*DST, vec![EdgePolicy::cost(1)]),
            (&*SRC, &ospf_a, vec![]),
        ],
    );
    let best = g.best_path(&FailureSet::new()).unwrap().unwrap();
    assert_eq!(best.signature.cost, 3);
    assert_eq!(best.path.len(), 5);

    // equal signatures: the path with fewer vertices, then the smaller one
    let g = graph(
        &[&ospf_a, &ospf_b, &ospf_c],
        vec![
            (&ospf_c, &*DST, vec![]),
            (&ospf_b, &*DST, vec![]),
            (&ospf_a, &ospf_c, vec![]),
            (&ospf_a, &ospf_b, vec![]),
            (&*SRC, &ospf_a, vec![]),
        ],
    );
    let best = g.best_path(&FailureSet::new()).unwrap().unwrap();
    assert_eq!(best.path, vec![SRC.clone(), ospf_a.clone(), ospf_b.clone(), DST.clone()]);
    assert_eq!(best.signature.tags, btreeset! {});
}

#[test]
fn failures_cut_routes() {
    let g = retraction_graph(false);
    // the failed link cuts the edge from A to B
    let mut f = FailureSet::new();
    f.insert(*R0, *R1);
    let sim = g.simulate(&f).unwrap();
    assert_eq!(sim.route(&*A).unwrap().path, vec![A.clone(), DST.clone()]);
    assert_eq!(
        sim.best_path().unwrap().path,
        vec![SRC.clone(), C.clone(), A.clone(), DST.clone()]
    );
    assert_eq!(sim.best_path().unwrap().signature.local_pref, 150);
}
