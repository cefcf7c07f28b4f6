/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Simulator event frames.
//!
//! Frames are JSON objects tagged with a numeric `ID` and carrying PascalCase
//! fields. Empty id strings mean "no node". Absent or `null` collections
//! decode as empty.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SimviewError;
use crate::model::{NodeId, NodeType};

/// Numeric kind tags as sent by the simulator.
pub mod kind {
    pub const SNAPSHOT: u64 = 1;
    pub const NODE_ADDED: u64 = 2;
    pub const NODE_REMOVED: u64 = 3;
    pub const PEER_ADDED: u64 = 4;
    pub const PEER_REMOVED: u64 = 5;
    pub const TREE_PARENT_UPDATED: u64 = 6;
    pub const SNAKE_ASC_UPDATED: u64 = 7;
    pub const SNAKE_DESC_UPDATED: u64 = 8;
    pub const TREE_ROOT_ANN_UPDATED: u64 = 9;
}

/// A node as listed in a snapshot: either just its id or a full record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub key: String,
    pub node_type: NodeType,
}

/// One chunk of the initial state. `end` marks the last chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub nodes: Vec<SnapshotNode>,
    /// Adjacency keyed by source node, one entry per target.
    pub phys_edges: BTreeMap<NodeId, Vec<NodeId>>,
    pub tree_edges: BTreeMap<NodeId, Vec<NodeId>>,
    pub snake_edges: BTreeMap<NodeId, Vec<NodeId>>,
    pub end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Snapshot(Snapshot),
    NodeAdded {
        node: NodeId,
        key: String,
        node_type: NodeType,
    },
    NodeRemoved {
        node: NodeId,
    },
    PeerAdded {
        node: NodeId,
        peer: NodeId,
        port: u64,
    },
    PeerRemoved {
        node: NodeId,
        peer: NodeId,
    },
    TreeParentUpdated {
        node: NodeId,
        parent: Option<NodeId>,
        prev: Option<NodeId>,
    },
    SnakeAscUpdated {
        node: NodeId,
        peer: Option<NodeId>,
        prev: Option<NodeId>,
        path: String,
    },
    SnakeDescUpdated {
        node: NodeId,
        peer: Option<NodeId>,
        prev: Option<NodeId>,
        path: String,
    },
    TreeRootAnnUpdated {
        node: NodeId,
        root: Option<NodeId>,
        sequence: u64,
        time: u64,
        coords: Vec<u64>,
    },
}

impl SimEvent {
    pub fn kind(&self) -> u64 {
        match self {
            SimEvent::Snapshot(_) => kind::SNAPSHOT,
            SimEvent::NodeAdded { .. } => kind::NODE_ADDED,
            SimEvent::NodeRemoved { .. } => kind::NODE_REMOVED,
            SimEvent::PeerAdded { .. } => kind::PEER_ADDED,
            SimEvent::PeerRemoved { .. } => kind::PEER_REMOVED,
            SimEvent::TreeParentUpdated { .. } => kind::TREE_PARENT_UPDATED,
            SimEvent::SnakeAscUpdated { .. } => kind::SNAKE_ASC_UPDATED,
            SimEvent::SnakeDescUpdated { .. } => kind::SNAKE_DESC_UPDATED,
            SimEvent::TreeRootAnnUpdated { .. } => kind::TREE_ROOT_ANN_UPDATED,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::Snapshot(_) => "Snapshot",
            SimEvent::NodeAdded { .. } => "NodeAdded",
            SimEvent::NodeRemoved { .. } => "NodeRemoved",
            SimEvent::PeerAdded { .. } => "PeerAdded",
            SimEvent::PeerRemoved { .. } => "PeerRemoved",
            SimEvent::TreeParentUpdated { .. } => "TreeParentUpdated",
            SimEvent::SnakeAscUpdated { .. } => "SnakeAscUpdated",
            SimEvent::SnakeDescUpdated { .. } => "SnakeDescUpdated",
            SimEvent::TreeRootAnnUpdated { .. } => "TreeRootAnnUpdated",
        }
    }
}

/// Decode one JSON frame.
pub fn decode_frame(raw: &str) -> Result<SimEvent, SimviewError> {
    let value: Value = serde_json::from_str(raw)?;
    let kind = value
        .get("ID")
        .and_then(Value::as_u64)
        .ok_or_else(|| SimviewError::Decode("frame has no numeric ID".to_string()))?;

    let event = match kind {
        kind::SNAPSHOT => {
            let wire: WireSnapshot = payload(value)?;
            SimEvent::Snapshot(Snapshot {
                nodes: wire
                    .nodes
                    .unwrap_or_default()
                    .into_iter()
                    .map(WireSnapshotNode::into_node)
                    .collect(),
                phys_edges: adjacency(wire.phys_edges),
                tree_edges: adjacency(wire.tree_edges),
                snake_edges: adjacency(wire.snake_edges),
                end: wire.end,
            })
        },
        kind::NODE_ADDED => {
            let wire: WireNodeAdded = payload(value)?;
            SimEvent::NodeAdded {
                node: required(wire.node, "Node")?,
                key: wire.public_key,
                node_type: NodeType::from(wire.node_type),
            }
        },
        kind::NODE_REMOVED => {
            let wire: WireNode = payload(value)?;
            SimEvent::NodeRemoved {
                node: required(wire.node, "Node")?,
            }
        },
        kind::PEER_ADDED => {
            let wire: WirePeer = payload(value)?;
            SimEvent::PeerAdded {
                node: required(wire.node, "Node")?,
                peer: required(wire.peer, "Peer")?,
                port: wire.port,
            }
        },
        kind::PEER_REMOVED => {
            let wire: WirePeer = payload(value)?;
            SimEvent::PeerRemoved {
                node: required(wire.node, "Node")?,
                peer: required(wire.peer, "Peer")?,
            }
        },
        kind::TREE_PARENT_UPDATED => {
            let wire: WirePointer = payload(value)?;
            SimEvent::TreeParentUpdated {
                node: required(wire.node, "Node")?,
                parent: NodeId::from_wire(&wire.peer),
                prev: NodeId::from_wire(&wire.prev),
            }
        },
        kind::SNAKE_ASC_UPDATED => {
            let wire: WirePointer = payload(value)?;
            SimEvent::SnakeAscUpdated {
                node: required(wire.node, "Node")?,
                peer: NodeId::from_wire(&wire.peer),
                prev: NodeId::from_wire(&wire.prev),
                path: wire.path,
            }
        },
        kind::SNAKE_DESC_UPDATED => {
            let wire: WirePointer = payload(value)?;
            SimEvent::SnakeDescUpdated {
                node: required(wire.node, "Node")?,
                peer: NodeId::from_wire(&wire.peer),
                prev: NodeId::from_wire(&wire.prev),
                path: wire.path,
            }
        },
        kind::TREE_ROOT_ANN_UPDATED => {
            let wire: WireRootAnnouncement = payload(value)?;
            SimEvent::TreeRootAnnUpdated {
                node: required(wire.node, "Node")?,
                root: NodeId::from_wire(&wire.root),
                sequence: wire.sequence,
                time: wire.time,
                coords: wire.coords.unwrap_or_default(),
            }
        },
        other => return Err(SimviewError::UnknownEventKind(other)),
    };
    Ok(event)
}

fn payload<T: DeserializeOwned>(value: Value) -> Result<T, SimviewError> {
    Ok(serde_json::from_value(value)?)
}

fn required(raw: String, field: &str) -> Result<NodeId, SimviewError> {
    NodeId::from_wire(&raw).ok_or_else(|| SimviewError::Decode(format!("empty {field} id")))
}

fn adjacency(wire: Option<BTreeMap<String, Option<Vec<String>>>>) -> BTreeMap<NodeId, Vec<NodeId>> {
    wire.unwrap_or_default()
        .into_iter()
        .filter_map(|(from, targets)| {
            let from = NodeId::from_wire(&from)?;
            let targets = targets
                .unwrap_or_default()
                .iter()
                .filter_map(|to| NodeId::from_wire(to))
                .collect();
            Some((from, targets))
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireSnapshot {
    #[serde(default)]
    nodes: Option<Vec<WireSnapshotNode>>,
    #[serde(default)]
    phys_edges: Option<BTreeMap<String, Option<Vec<String>>>>,
    #[serde(default)]
    tree_edges: Option<BTreeMap<String, Option<Vec<String>>>>,
    #[serde(default)]
    snake_edges: Option<BTreeMap<String, Option<Vec<String>>>>,
    #[serde(default)]
    end: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireSnapshotNode {
    Bare(String),
    #[serde(rename_all = "PascalCase")]
    Record {
        id: String,
        #[serde(default)]
        key: String,
        #[serde(default, rename = "Type")]
        node_type: u8,
    },
}

impl WireSnapshotNode {
    fn into_node(self) -> SnapshotNode {
        match self {
            WireSnapshotNode::Bare(id) => SnapshotNode {
                id: NodeId::new(id),
                key: String::new(),
                node_type: NodeType::Unknown,
            },
            WireSnapshotNode::Record { id, key, node_type } => SnapshotNode {
                id: NodeId::new(id),
                key,
                node_type: NodeType::from(node_type),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireNode {
    node: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireNodeAdded {
    node: String,
    #[serde(default)]
    public_key: String,
    #[serde(default)]
    node_type: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WirePeer {
    node: String,
    peer: String,
    #[serde(default)]
    port: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WirePointer {
    node: String,
    #[serde(default)]
    peer: String,
    #[serde(default)]
    prev: String,
    #[serde(default)]
    path: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRootAnnouncement {
    node: String,
    #[serde(default)]
    root: String,
    #[serde(default)]
    sequence: u64,
    #[serde(default)]
    time: u64,
    #[serde(default)]
    coords: Option<Vec<u64>>,
}
