/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::io::Cursor;

use proptest::prelude::*;
use simview::model::{NodeId, NodeType, TopologyKind};
use simview::transport::{JsonLinesSource, pump};
use simview::{ActivationState, EventDispatcher, GraphCoordinator, SimviewConfig, VERSION};

fn dispatcher() -> EventDispatcher {
    let config = SimviewConfig::default();
    EventDispatcher::new(GraphCoordinator::new(&config), &config)
}

fn assert_in_sync(coordinator: &GraphCoordinator) {
    for view in coordinator.views().iter() {
        assert_eq!(view.node_count(), coordinator.store().len());
        for id in coordinator.store().ids() {
            assert!(view.contains_node(id.as_str()), "{id} missing from {:?}", view.kind());
        }
    }
}

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}

#[test]
fn replay_event_log_scenario() {
    let log = r#"
{"ID": 1, "Nodes": ["A", "B", "C"], "PhysEdges": {"A": ["B"], "B": ["A", "C"]}, "TreeEdges": {"B": ["A"], "C": ["B"]}, "SnakeEdges": {}, "End": true}
{"ID": 9, "Node": "A", "Root": "A", "Sequence": 1, "Time": 1000, "Coords": []}
{"ID": 9, "Node": "B", "Root": "A", "Sequence": 1, "Time": 1000, "Coords": [1]}
{"ID": 9, "Node": "C", "Root": "C", "Sequence": 1, "Time": 1000, "Coords": []}
{"ID": 4, "Node": "A", "Peer": "B", "Port": 1}
{"ID": 4, "Node": "B", "Peer": "A", "Port": 1}
{"ID": 3, "Node": "B"}
{"ID": 3, "Node": "B"}
"#;
    let mut dispatcher = dispatcher();
    let report = pump(&mut dispatcher, &mut JsonLinesSource::new(Cursor::new(log))).unwrap();

    assert_eq!(report.discarded, 0);
    assert_eq!(dispatcher.state(), ActivationState::Live);

    let coordinator = dispatcher.coordinator();
    assert_eq!(coordinator.store().len(), 2);
    assert_eq!(coordinator.view(TopologyKind::Physical).edge_count(), 0);
    assert_eq!(coordinator.view(TopologyKind::Tree).edge_count(), 0);
    assert!(coordinator.node("A").unwrap().peers.is_empty());
    assert_in_sync(coordinator);

    let stats = coordinator.stats();
    assert_eq!(stats.node_count, 2);
    assert_eq!(stats.path_count, 0);
    let percents: Vec<f64> = stats.root_convergence.iter().map(|entry| entry.percent).collect();
    assert_eq!(percents, vec![50.0, 50.0]);
}

#[test]
fn snapshot_scenario_dedups_reverse_physical_edges() {
    let mut dispatcher = dispatcher();
    dispatcher.dispatch_frame(
        r#"{"ID": 1, "Nodes": ["A", "B", "C"], "PhysEdges": {"A": ["B"], "B": ["A", "C"]}, "TreeEdges": {"B": ["A"], "C": ["B"]}, "SnakeEdges": {}, "End": true}"#,
    );

    assert_eq!(dispatcher.state(), ActivationState::Live);
    let coordinator = dispatcher.coordinator();
    let physical = coordinator.view(TopologyKind::Physical);
    assert_eq!(physical.edge_count(), 2);
    assert_eq!(physical.degree("A"), 1);
    assert_eq!(physical.degree("B"), 2);
    assert_eq!(physical.degree("C"), 1);
    let tree = coordinator.view(TopologyKind::Tree);
    assert_eq!(tree.edge_count(), 2);
    assert!(tree.contains_edge("B", "A"));
    assert!(tree.contains_edge("C", "B"));
}

#[test]
fn removing_absent_edge_twice_is_noop() {
    let mut coordinator = GraphCoordinator::new(&SimviewConfig::default());
    for id in ["a", "b"] {
        coordinator.add_node(NodeId::new(id), "", NodeType::Peer).unwrap();
    }
    for kind in TopologyKind::ALL {
        assert_eq!(coordinator.remove_edge(kind, "a", "b"), 0);
        assert_eq!(coordinator.remove_edge(kind, "a", "b"), 0);
        assert_eq!(coordinator.view(kind).edge_count(), 0);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Remove(u8),
    Peer(u8, u8),
    Unpeer(u8, u8),
    Parent(u8, Option<u8>),
    Ascending(u8, Option<u8>),
}

fn op() -> impl Strategy<Value = Op> {
    let id = 0u8..8;
    prop_oneof![
        id.clone().prop_map(Op::Add),
        id.clone().prop_map(Op::Remove),
        (id.clone(), id.clone()).prop_map(|(a, b)| Op::Peer(a, b)),
        (id.clone(), id.clone()).prop_map(|(a, b)| Op::Unpeer(a, b)),
        (id.clone(), proptest::option::of(id.clone())).prop_map(|(a, b)| Op::Parent(a, b)),
        (id.clone(), proptest::option::of(id)).prop_map(|(a, b)| Op::Ascending(a, b)),
    ]
}

fn name(raw: u8) -> String {
    format!("n{raw}")
}

proptest! {
    #[test]
    fn store_and_views_never_drift(ops in proptest::collection::vec(op(), 1..80)) {
        let mut coordinator = GraphCoordinator::new(&SimviewConfig::default());

        for op in ops {
            match op {
                Op::Add(a) => {
                    coordinator.add_node(NodeId::new(name(a)), "k", NodeType::Peer).unwrap();
                },
                Op::Remove(a) => {
                    coordinator.remove_node(&name(a));
                },
                Op::Peer(a, b) => {
                    coordinator.add_peer_link(&name(a), &name(b), 0);
                },
                Op::Unpeer(a, b) => {
                    coordinator.remove_peer_link(&name(a), &name(b));
                },
                Op::Parent(a, b) => {
                    let prev = coordinator
                        .node(&name(a))
                        .and_then(|node| node.tree_parent.clone());
                    let next = b.map(name);
                    coordinator.set_tree_parent(
                        &name(a),
                        next.as_deref(),
                        prev.as_ref().map(NodeId::as_str),
                    );
                },
                Op::Ascending(a, b) => {
                    let prev = coordinator
                        .node(&name(a))
                        .and_then(|node| node.snek_asc.clone());
                    let next = b.map(name);
                    coordinator.set_snek_ascending(
                        &name(a),
                        next.as_deref(),
                        prev.as_ref().map(NodeId::as_str),
                        "",
                    );
                },
            }

            for view in coordinator.views().iter() {
                prop_assert_eq!(view.node_count(), coordinator.store().len());
                for id in coordinator.store().ids() {
                    prop_assert!(view.contains_node(id.as_str()));
                }
            }

            let physical = coordinator.view(TopologyKind::Physical);
            for edge in physical.edges() {
                let parallel = physical
                    .edges()
                    .filter(|other| {
                        (other.from == edge.from && other.to == edge.to)
                            || (other.from == edge.to && other.to == edge.from)
                    })
                    .count();
                prop_assert_eq!(parallel, 1);
            }

            for id in coordinator.store().ids() {
                let outgoing = |kind: TopologyKind| {
                    coordinator
                        .view(kind)
                        .edges()
                        .filter(|edge| edge.from == *id)
                        .count()
                };
                prop_assert!(outgoing(TopologyKind::Tree) <= 1);
                prop_assert!(outgoing(TopologyKind::Snake) <= 1);
            }
        }
    }
}
