/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Routes decoded simulator events onto coordinator operations.
//!
//! The dispatcher gates the stream on activation: nothing but a snapshot is
//! meaningful before the first snapshot arrives, and rendering only starts
//! once a snapshot chunk marked `End` has been applied.

use crate::app::GraphCoordinator;
use crate::config::{SimviewConfig, SnapshotPolicy};
use crate::model::{NodeId, TopologyKind};
use crate::protocol::{SimEvent, Snapshot, decode_frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    /// No snapshot seen yet.
    #[default]
    Uninitialized,
    /// Snapshot chunks are arriving; incremental events already apply.
    Populating,
    Live,
}

/// What happened to one event or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    /// Dropped before touching any state (decode failure, wrong phase, policy).
    Discarded,
}

/// A snapshot edge whose endpoints have not all arrived yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingEdge {
    kind: TopologyKind,
    from: NodeId,
    to: NodeId,
}

pub struct EventDispatcher {
    coordinator: GraphCoordinator,
    state: ActivationState,
    snapshot_policy: SnapshotPolicy,

    /// Snapshot edges held back until both endpoints are in the store.
    pending_edges: Vec<PendingEdge>,
}

impl EventDispatcher {
    pub fn new(coordinator: GraphCoordinator, config: &SimviewConfig) -> Self {
        Self {
            coordinator,
            state: ActivationState::Uninitialized,
            snapshot_policy: config.snapshot_after_live,
            pending_edges: Vec::new(),
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn coordinator(&self) -> &GraphCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut GraphCoordinator {
        &mut self.coordinator
    }

    pub fn into_coordinator(self) -> GraphCoordinator {
        self.coordinator
    }

    /// Decode and dispatch one raw frame. Bad frames are logged and dropped.
    pub fn dispatch_frame(&mut self, raw: &str) -> DispatchOutcome {
        match decode_frame(raw) {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                log::warn!("discarding frame: {e}");
                DispatchOutcome::Discarded
            },
        }
    }

    pub fn dispatch(&mut self, event: SimEvent) -> DispatchOutcome {
        match (self.state, event) {
            (ActivationState::Uninitialized, SimEvent::Snapshot(snapshot)) => {
                self.state = ActivationState::Populating;
                self.apply_snapshot(snapshot);
                DispatchOutcome::Applied
            },
            (ActivationState::Uninitialized, event) => {
                log::warn!("{} received before initial snapshot, discarding", event.name());
                DispatchOutcome::Discarded
            },
            (ActivationState::Populating, SimEvent::Snapshot(snapshot)) => {
                self.apply_snapshot(snapshot);
                DispatchOutcome::Applied
            },
            (ActivationState::Live, SimEvent::Snapshot(snapshot)) => match self.snapshot_policy {
                SnapshotPolicy::Ignore => {
                    log::info!("ignoring snapshot received while live");
                    DispatchOutcome::Discarded
                },
                SnapshotPolicy::Reset => {
                    log::info!("snapshot received while live, resetting state");
                    self.coordinator.reset();
                    self.pending_edges.clear();
                    self.state = ActivationState::Populating;
                    self.apply_snapshot(snapshot);
                    DispatchOutcome::Applied
                },
            },
            (_, event) => {
                self.apply_incremental(event);
                DispatchOutcome::Applied
            },
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let Snapshot {
            nodes,
            phys_edges,
            tree_edges,
            snake_edges,
            end,
        } = snapshot;
        log::debug!(
            "applying snapshot chunk: {} nodes, end: {end}",
            nodes.len()
        );

        for node in nodes {
            if let Err(e) = self
                .coordinator
                .add_node(node.id, node.key, node.node_type)
            {
                log::warn!("snapshot node skipped: {e}");
            }
        }
        // Physical, then snake, then tree.
        for (kind, adjacency) in [
            (TopologyKind::Physical, phys_edges),
            (TopologyKind::Snake, snake_edges),
            (TopologyKind::Tree, tree_edges),
        ] {
            for (from, targets) in adjacency {
                self.pending_edges
                    .extend(targets.into_iter().map(|to| PendingEdge {
                        kind,
                        from: from.clone(),
                        to,
                    }));
            }
        }
        self.apply_pending_edges();

        if end {
            if !self.pending_edges.is_empty() {
                log::warn!(
                    "snapshot ended with {} edges naming unknown nodes, dropping them",
                    self.pending_edges.len()
                );
                self.pending_edges.clear();
            }
            self.state = ActivationState::Live;
            self.coordinator.mark_live();
        }
    }

    /// Apply every held-back edge whose endpoints are now both present.
    fn apply_pending_edges(&mut self) {
        let pending = std::mem::take(&mut self.pending_edges);
        for edge in pending {
            let store = self.coordinator.store();
            if !store.contains(edge.from.as_str()) || !store.contains(edge.to.as_str()) {
                self.pending_edges.push(edge);
                continue;
            }
            match edge.kind {
                TopologyKind::Tree => {
                    self.coordinator.set_tree_parent(
                        edge.from.as_str(),
                        Some(edge.to.as_str()),
                        None,
                    );
                },
                kind => {
                    self.coordinator
                        .add_edge(kind, edge.from.as_str(), edge.to.as_str());
                },
            }
        }
    }

    fn apply_incremental(&mut self, event: SimEvent) {
        let coordinator = &mut self.coordinator;
        match event {
            SimEvent::Snapshot(_) => {},
            SimEvent::NodeAdded {
                node,
                key,
                node_type,
            } => {
                if let Err(e) = coordinator.add_node(node, key, node_type) {
                    log::warn!("NodeAdded rejected: {e}");
                }
                if !self.pending_edges.is_empty() {
                    self.apply_pending_edges();
                }
            },
            SimEvent::NodeRemoved { node } => {
                coordinator.remove_node(node.as_str());
            },
            SimEvent::PeerAdded { node, peer, port } => {
                coordinator.add_peer_link(node.as_str(), peer.as_str(), port);
            },
            SimEvent::PeerRemoved { node, peer } => {
                coordinator.remove_peer_link(node.as_str(), peer.as_str());
            },
            SimEvent::TreeParentUpdated { node, parent, prev } => {
                coordinator.set_tree_parent(
                    node.as_str(),
                    parent.as_ref().map(|id| id.as_str()),
                    prev.as_ref().map(|id| id.as_str()),
                );
            },
            SimEvent::SnakeAscUpdated {
                node,
                peer,
                prev,
                path,
            } => {
                coordinator.set_snek_ascending(
                    node.as_str(),
                    peer.as_ref().map(|id| id.as_str()),
                    prev.as_ref().map(|id| id.as_str()),
                    &path,
                );
            },
            SimEvent::SnakeDescUpdated {
                node,
                peer,
                prev,
                path,
            } => {
                coordinator.set_snek_descending(
                    node.as_str(),
                    peer.as_ref().map(|id| id.as_str()),
                    prev.as_ref().map(|id| id.as_str()),
                    &path,
                );
            },
            SimEvent::TreeRootAnnUpdated {
                node,
                root,
                sequence,
                time,
                coords,
            } => {
                coordinator.update_announcement(node.as_str(), root, sequence, time, coords);
            },
        }
    }
}
