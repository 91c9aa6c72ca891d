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

//! Test building and querying the topology path graph on the example networks.

use crate::example_networks::{ExampleNetwork, IbgpMesh, OspfLine, PointToPoint, TaggedPolicy};
use crate::layer2::L2Domains;
use crate::netmodel::{printer, NetworkConfig, NetworkModel, RouterId, Subnet, VlanId};
use crate::rag::ReachabilityTaintGraph;
use crate::tpg::{
    EdgeKind, EdgePolicy, FailureSet, FidelityVariant, FidelityVariant::*, Layer, QueryError,
    TopologyPathGraph, Vertex, VertexKind::*,
};

use maplit::btreeset;

const VARIANTS: [FidelityVariant; 2] = [Coarse, Fine];

fn build(net: &NetworkModel, dst: &str, src: &str, variant: FidelityVariant) -> TopologyPathGraph {
    let l2 = L2Domains::new(net);
    let dst = Subnet::from(dst);
    let src = Subnet::from(src);
    let mut rag = ReachabilityTaintGraph::new(net, &l2, Some(&dst));
    rag.taint();
    TopologyPathGraph::build(net, &l2, &rag, (&dst, &src), variant).unwrap()
}

fn id(net: &NetworkModel, name: &str) -> RouterId {
    net.get_router_id(name).unwrap()
}

fn failures(net: &NetworkModel, a: &str, b: &str) -> FailureSet {
    FailureSet::from_names(net, vec![(a, b)])
}

fn routers(net: &NetworkModel, tpg: &TopologyPathGraph, f: &FailureSet) -> Option<Vec<String>> {
    tpg.best_path_reprocessed(f).unwrap().map(|p| printer::router_path(net, &p))
}

#[test]
fn point_to_point_coarse() {
    let net = PointToPoint::net(0);
    let (r1, r2) = (id(&net, "R1"), id(&net, "R2"));
    let tpg = build(&net, "s2", "s1", Coarse);
    let v = Vertex::main;

    assert_eq!(
        tpg.has_path(&FailureSet::new()),
        Some(vec![
            v(Source("s1".into())),
            v(Ospf(r1)),
            v(Vlan(VlanId::new(r1, 1))),
            v(Vlan(VlanId::new(r2, 1))),
            v(Destination("s2".into())),
        ])
    );

    let egress = tpg.edge(&v(Ospf(r1)), &v(Vlan(VlanId::new(r1, 1)))).unwrap();
    assert_eq!(egress.kind, EdgeKind::Egress);
    assert_eq!(egress.policies, vec![EdgePolicy::cost(1)]);

    let best = tpg.best_path(&FailureSet::new()).unwrap().unwrap();
    assert_eq!(best.signature.cost, 1);
    assert_eq!(best.path.len(), 5);
}

#[test]
fn point_to_point_fine() {
    let net = PointToPoint::net(0);
    let (r1, r2) = (id(&net, "R1"), id(&net, "R2"));
    let tpg = build(&net, "s2", "s1", Fine);
    let v = Vertex::main;

    assert!(tpg.has_path(&FailureSet::new()).is_some());
    // only the router that learned the route from its neighbor relays it
    assert!(tpg.contains_edge(&v(OspfIn(r1)), &v(OspfOut(r1))));
    assert!(!tpg.contains_edge(&v(OspfIn(r2)), &v(OspfOut(r2))));
    assert!(tpg.contains_edge(&v(OspfIn(r2)), tpg.destination()));

    let best = tpg.best_path(&FailureSet::new()).unwrap().unwrap();
    assert_eq!(best.signature.cost, 1);
    assert_eq!(routers(&net, &tpg, &FailureSet::new()), Some(vec!["R1".into(), "R2".into()]));
}

#[test]
fn ospf_line_failures() {
    let net = OspfLine::net(0);
    for variant in VARIANTS.iter() {
        let tpg = build(&net, "s3", "s1", *variant);
        assert!(tpg.has_path(&FailureSet::new()).is_some());
        assert_eq!(tpg.best_path(&FailureSet::new()).unwrap().unwrap().signature.cost, 2);

        assert!(tpg.has_path(&failures(&net, "R1", "R2")).is_none());
        assert!(tpg.has_path(&failures(&net, "R3", "R2")).is_none());
        assert!(tpg.best_path(&failures(&net, "R2", "R1")).unwrap().is_none());
        // links that do not exist
        assert!(tpg.has_path(&failures(&net, "R1", "R3")).is_some());
        assert!(tpg.has_path(&failures(&net, "R1", "R9")).is_some());
    }
}

#[test]
fn ospf_line_switch() {
    let net = OspfLine::net(1);
    for variant in VARIANTS.iter() {
        let tpg = build(&net, "s3", "s1", *variant);
        assert_eq!(
            routers(&net, &tpg, &FailureSet::new()),
            Some(vec!["R1".into(), "R2".into(), "SW".into(), "R3".into()])
        );
        assert!(tpg.has_path(&failures(&net, "R2", "SW")).is_none());
        assert!(tpg.has_path(&failures(&net, "R2", "R3")).is_some());
        // the switch does not add any cost
        assert_eq!(tpg.best_path(&FailureSet::new()).unwrap().unwrap().signature.cost, 2);
    }
}

#[test]
fn ibgp_mesh_paths() {
    let net = IbgpMesh::net(0);
    for variant in VARIANTS.iter() {
        let tpg = build(&net, "t", "s3", *variant);
        assert_eq!(
            routers(&net, &tpg, &FailureSet::new()),
            Some(vec!["R3".into(), "R2".into(), "R1".into(), "E".into()])
        );
        let tpg = build(&net, "t", "s2", *variant);
        assert_eq!(
            routers(&net, &tpg, &FailureSet::new()),
            Some(vec!["R2".into(), "R1".into(), "E".into()])
        );
        let tpg = build(&net, "t", "s4", *variant);
        assert!(tpg.has_path(&FailureSet::new()).is_none());
        assert!(tpg.best_path(&FailureSet::new()).unwrap().is_none());
    }
}

#[test]
fn ibgp_mesh_coarse_sessions() {
    let net = IbgpMesh::net(0);
    let (r1, r2, r3) = (id(&net, "R1"), id(&net, "R2"), id(&net, "R3"));
    let tpg = build(&net, "t", "s3", Coarse);
    let v = Vertex::main;

    // the session to R1 is resolved over OSPF
    let dep = tpg.edge(&v(BgpSession { router: r3, peer: r1 }), &v(Ospf(r3))).unwrap();
    assert_eq!(dep.kind, EdgeKind::Dependency);
    assert_eq!(dep.policies, vec![EdgePolicy::len(1)]);
    // R2 does not advertise the route learned over iBGP
    assert!(!tpg.contains_edge(&v(BgpSession { router: r3, peer: r2 }), &v(Ospf(r3))));
    // the directly connected session uses the VLAN
    let session = v(BgpSession { router: r2, peer: r1 });
    assert!(tpg.contains_edge(&session, &v(Vlan(VlanId::new(r2, 12)))));
}

#[test]
fn ibgp_mesh_next_hop_layer() {
    let net = IbgpMesh::net(0);
    let (r1, r3) = (id(&net, "R1"), id(&net, "R3"));
    let tpg = build(&net, "t", "s3", Fine);
    let layer = VlanId::new(r1, 12);

    let bgp_out = Vertex::main(BgpOut { router: r3, peer: r1 });
    let resolve = Vertex::next_hop(layer, OspfIn(r3));
    assert!(tpg.contains_edge(&bgp_out, &resolve));
    // the peer itself is not part of its own layer
    assert!(!tpg.contains(&Vertex::next_hop(layer, OspfIn(r1))));
    assert!(tpg.contains_edge(
        &Vertex::next_hop(layer, VlanIn(layer)),
        &Vertex::main(BgpIn(r1))
    ));

    let best = tpg.best_path(&FailureSet::new()).unwrap().unwrap();
    assert!(best.path.iter().any(|v| v.layer == Layer::NextHop(layer)));
    assert!(best.path.contains(&Vertex::main(BgpIn(r1))));

    // failing the link between R2 and R3 cuts the iBGP next hop
    assert!(tpg.has_path(&failures(&net, "R2", "R3")).is_none());
}

#[test]
fn tagged_policy() {
    for variant in VARIANTS.iter() {
        let net = TaggedPolicy::net(0);
        let tpg = build(&net, "t", "s", *variant);
        let best = tpg.best_path(&FailureSet::new()).unwrap().unwrap();
        assert_eq!(best.signature.local_pref, 100);
        assert_eq!(best.signature.len, 2);
        assert_eq!(best.signature.cost, 0);
        assert_eq!(best.signature.tags, btreeset! {"x".to_string()});

        // the import policy of R1 drops the route, but the graph still has a path
        let net = TaggedPolicy::net(1);
        let tpg = build(&net, "t", "s", *variant);
        assert!(tpg.has_path(&FailureSet::new()).is_some());
        assert!(tpg.best_path(&FailureSet::new()).unwrap().is_none());
        assert!(tpg.best_path_reprocessed(&FailureSet::new()).unwrap().is_none());
    }
}

#[test]
fn existence_matches_best_path() {
    let nets: Vec<NetworkModel> = vec![
        PointToPoint::net(0),
        OspfLine::net(0),
        OspfLine::net(1),
        IbgpMesh::net(0),
        TaggedPolicy::net(0),
    ];
    for net in nets.iter() {
        let subnets: Vec<Subnet> = net.subnets().into_iter().cloned().collect();
        let names: Vec<&str> = net.routers().map(|r| r.name()).collect();
        for dst in subnets.iter() {
            for src in subnets.iter().filter(|s| *s != dst) {
                for variant in VARIANTS.iter() {
                    let tpg = build(net, dst.as_str(), src.as_str(), *variant);
                    let mut scenarios = vec![FailureSet::new()];
                    for (a, b) in names.iter().zip(names.iter().skip(1)) {
                        scenarios.push(failures(net, a, b));
                    }
                    for f in scenarios.iter() {
                        assert_eq!(
                            tpg.has_path(f).is_some(),
                            tpg.best_path(f).unwrap().is_some(),
                            "{} -> {} ({:?}, {:?})",
                            src,
                            dst,
                            variant,
                            f
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn query_errors() {
    let net = OspfLine::net(0);
    let l2 = L2Domains::new(&net);
    let (s1, s3) = (Subnet::from("s1"), Subnet::from("s3"));
    let mut rag = ReachabilityTaintGraph::new(&net, &l2, Some(&s3));

    assert_eq!(
        TopologyPathGraph::build(&net, &l2, &rag, (&s3, &s3), Coarse).unwrap_err(),
        QueryError::IdenticalEndpoints(s3.clone())
    );
    assert_eq!(
        TopologyPathGraph::build(&net, &l2, &rag, (&s3, &"x".into()), Coarse).unwrap_err(),
        QueryError::UnknownSubnet("x".into())
    );
    assert_eq!(
        TopologyPathGraph::build(&net, &l2, &rag, (&s3, &s1), Coarse).unwrap_err(),
        QueryError::UntaintedRag
    );
    rag.taint();
    assert_eq!(
        TopologyPathGraph::build(&net, &l2, &rag, (&s1, &s3), Fine).unwrap_err(),
        QueryError::RagMismatch { expected: s1.clone(), found: Some(s3.clone()) }
    );

    let tpg = TopologyPathGraph::build(&net, &l2, &rag, (&s3, &s1), Coarse).unwrap();
    let unknown = Vertex::main(Rib(id(&net, "R1")));
    assert_eq!(
        tpg.has_path_between(tpg.source(), &unknown, &FailureSet::new()).unwrap_err(),
        QueryError::UnknownVertex(unknown.clone())
    );
    let r2 = id(&net, "R2");
    assert!(tpg
        .has_path_between(&Vertex::main(Ospf(r2)), tpg.destination(), &FailureSet::new())
        .unwrap()
        .is_some());
}

/// R2 has a single VLAN with interfaces towards both R1 and R3.
#[test]
fn shared_router_vlan() {
    let ip = |s: &str| -> ipnet::IpNet { s.parse().unwrap() };
    let mut cfg = NetworkConfig::new();
    cfg.router("R1").iface("R2", Some(1)).vlan(1, ip("10.0.0.1/24")).ospf_active(1).subnet("s1");
    cfg.router("R2")
        .iface("R1", Some(1))
        .iface("R3", Some(1))
        .vlan(1, ip("10.0.0.2/24"))
        .ospf_active(1);
    cfg.router("R3")
        .iface("R2", Some(1))
        .vlan(1, ip("10.0.0.3/24"))
        .ospf_active(1)
        .ospf_origin("s3")
        .subnet("s3");
    let net = NetworkModel::from_config(&cfg).unwrap();
    let (r2, r3) = (id(&net, "R2"), id(&net, "R3"));
    let (v2, v3) = (VlanId::new(r2, 1), VlanId::new(r3, 1));
    let v = Vertex::main;

    // the coarse variant bridges the links of the router VLAN
    let coarse = build(&net, "s3", "s1", Coarse);
    assert!(coarse.contains_edge(&v(Vlan(v2)), &v(Vlan(v3))));

    // the fine variant only switches on plain switches
    let fine = build(&net, "s3", "s1", Fine);
    assert!(!fine.contains_edge(&v(VlanIn(v2)), &v(VlanOut(v2))));
    assert!(fine.contains_edge(&v(VlanIn(v2)), &v(Rib(r2))));

    for tpg in [coarse, fine].iter() {
        assert_eq!(
            routers(&net, tpg, &FailureSet::new()),
            Some(vec!["R1".into(), "R2".into(), "R3".into()])
        );
    }
}
