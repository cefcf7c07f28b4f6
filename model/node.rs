/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-node routing metadata and the store that owns it.
//!
//! The store is keyed by [`NodeId`] and ordered by id, so every derived view
//! (stats, summaries) iterates deterministically. Mutators are `pub(crate)`:
//! only the coordinator may change a node, because every change has to be
//! mirrored into the topology views in the same step.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable node identity as assigned by the simulator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Wire fields use the empty string for "no node".
    pub fn from_wire(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Role of a simulated node. Encoded as a small integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum NodeType {
    #[default]
    Unknown,
    /// Well-behaved router.
    Peer,
    GeneralAdversary,
}

impl From<u8> for NodeType {
    fn from(raw: u8) -> Self {
        match raw {
            1 => NodeType::Peer,
            2 => NodeType::GeneralAdversary,
            _ => NodeType::Unknown,
        }
    }
}

impl From<NodeType> for u8 {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Unknown => 0,
            NodeType::Peer => 1,
            NodeType::GeneralAdversary => 2,
        }
    }
}

/// Which root a node currently believes in, and how fresh that belief is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Announcement {
    pub root: Option<NodeId>,
    pub sequence: u64,
    /// Raw simulator timestamp (microseconds).
    pub time: u64,
}

/// One entry of a node's peer list. The same peer may appear on several ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerPort {
    pub id: NodeId,
    pub port: u64,
}

/// Metadata for one simulated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub node_type: NodeType,

    /// Public key exactly as received; display truncation happens in presentation.
    pub key: String,

    /// Tree coordinates, root first. Empty until the first announcement.
    pub coords: Vec<u64>,

    pub announcement: Announcement,

    pub peers: Vec<PeerPort>,

    pub tree_parent: Option<NodeId>,

    pub snek_asc: Option<NodeId>,
    pub snek_asc_path: String,

    pub snek_desc: Option<NodeId>,
    pub snek_desc_path: String,
}

impl Node {
    pub fn new(key: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            node_type,
            key: key.into(),
            coords: Vec::new(),
            announcement: Announcement::default(),
            peers: Vec::new(),
            tree_parent: None,
            snek_asc: None,
            snek_asc_path: String::new(),
            snek_desc: None,
            snek_desc_path: String::new(),
        }
    }

    pub fn has_peer(&self, peer: &str) -> bool {
        self.peers.iter().any(|entry| entry.id.as_str() == peer)
    }
}

/// Snake path ids arrive quoted and in mixed case.
pub fn normalize_path(path: &str) -> String {
    path.replace('"', "").to_uppercase()
}

/// Read-only existence capability.
///
/// Handed to the selection reconciler so it can check ids without being able
/// to touch the store it reconciles against.
pub trait NodeLookup {
    fn contains_node(&self, id: &str) -> bool;
}

/// Id-ordered map from node id to metadata.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Node type, or `NodeType::Unknown` for an absent id.
    pub fn node_type(&self, id: &str) -> NodeType {
        self.nodes
            .get(id)
            .map(|node| node.node_type)
            .unwrap_or_default()
    }

    /// Raw key, or `""` for an absent id.
    pub fn node_key(&self, id: &str) -> &str {
        self.nodes.get(id).map(|node| node.key.as_str()).unwrap_or("")
    }

    /// Insert a freshly initialized node. Returns the previous metadata when
    /// the id was already present.
    pub(crate) fn insert(&mut self, id: NodeId, key: String, node_type: NodeType) -> Option<Node> {
        self.nodes.insert(id, Node::new(key, node_type))
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.remove(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Replace root announcement and coordinates together.
    pub(crate) fn update_announcement(
        &mut self,
        id: &str,
        announcement: Announcement,
        coords: Vec<u64>,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.announcement = announcement;
        node.coords = coords;
        true
    }

    pub(crate) fn push_peer(&mut self, id: &str, peer: PeerPort) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.peers.push(peer);
        true
    }

    /// Drop every entry for `peer` from `id`'s peer list.
    pub(crate) fn remove_peer(&mut self, id: &str, peer: &str) -> usize {
        let Some(node) = self.nodes.get_mut(id) else {
            return 0;
        };
        let before = node.peers.len();
        node.peers.retain(|entry| entry.id.as_str() != peer);
        before - node.peers.len()
    }

    /// Drop `peer` from every node's peer list; used when `peer` is detached.
    pub(crate) fn forget_peer(&mut self, peer: &str) -> usize {
        let mut removed = 0usize;
        for node in self.nodes.values_mut() {
            let before = node.peers.len();
            node.peers.retain(|entry| entry.id.as_str() != peer);
            removed += before - node.peers.len();
        }
        removed
    }
}

impl NodeLookup for NodeStore {
    fn contains_node(&self, id: &str) -> bool {
        self.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, port: u64) -> PeerPort {
        PeerPort {
            id: NodeId::new(id),
            port,
        }
    }

    #[test]
    fn test_new_node_has_default_metadata() {
        let node = Node::new("abcd", NodeType::Peer);
        assert_eq!(node.key, "abcd");
        assert!(node.coords.is_empty());
        assert_eq!(node.announcement, Announcement::default());
        assert!(node.peers.is_empty());
        assert!(node.tree_parent.is_none());
        assert!(node.snek_asc.is_none());
        assert!(node.snek_desc.is_none());
        assert!(node.snek_asc_path.is_empty());
    }

    #[test]
    fn test_insert_reports_previous_node() {
        let mut store = NodeStore::new();
        assert!(
            store
                .insert(NodeId::new("a"), "k1".into(), NodeType::Peer)
                .is_none()
        );
        let previous = store
            .insert(NodeId::new("a"), "k2".into(), NodeType::GeneralAdversary)
            .unwrap();
        assert_eq!(previous.key, "k1");
        assert_eq!(store.node_key("a"), "k2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookups_on_absent_id_return_sentinels() {
        let store = NodeStore::new();
        assert_eq!(store.node_type("ghost"), NodeType::Unknown);
        assert_eq!(store.node_key("ghost"), "");
        assert!(!store.contains_node("ghost"));
    }

    #[test]
    fn test_update_announcement_absent_is_noop() {
        let mut store = NodeStore::new();
        assert!(!store.update_announcement("ghost", Announcement::default(), vec![1]));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_announcement_replaces_fields() {
        let mut store = NodeStore::new();
        store.insert(NodeId::new("a"), String::new(), NodeType::Peer);
        let announcement = Announcement {
            root: Some(NodeId::new("r")),
            sequence: 7,
            time: 123_000,
        };
        assert!(store.update_announcement("a", announcement.clone(), vec![1, 2]));
        let node = store.get("a").unwrap();
        assert_eq!(node.announcement, announcement);
        assert_eq!(node.coords, vec![1, 2]);
    }

    #[test]
    fn test_remove_peer_drops_all_ports_for_peer() {
        let mut store = NodeStore::new();
        store.insert(NodeId::new("a"), String::new(), NodeType::Peer);
        store.push_peer("a", peer("b", 1));
        store.push_peer("a", peer("b", 2));
        store.push_peer("a", peer("c", 3));

        assert_eq!(store.remove_peer("a", "b"), 2);
        assert_eq!(store.get("a").unwrap().peers, vec![peer("c", 3)]);
    }

    #[test]
    fn test_forget_peer_scans_every_node() {
        let mut store = NodeStore::new();
        store.insert(NodeId::new("a"), String::new(), NodeType::Peer);
        store.insert(NodeId::new("b"), String::new(), NodeType::Peer);
        store.push_peer("a", peer("x", 1));
        store.push_peer("b", peer("x", 1));
        store.push_peer("b", peer("a", 2));

        assert_eq!(store.forget_peer("x"), 2);
        assert!(!store.get("a").unwrap().has_peer("x"));
        assert!(store.get("b").unwrap().has_peer("a"));
    }

    #[test]
    fn test_normalize_path_strips_quotes_and_uppercases() {
        assert_eq!(normalize_path("\"ab12cd\""), "AB12CD");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_node_type_wire_mapping() {
        assert_eq!(NodeType::from(1), NodeType::Peer);
        assert_eq!(NodeType::from(2), NodeType::GeneralAdversary);
        assert_eq!(NodeType::from(9), NodeType::Unknown);
        assert_eq!(u8::from(NodeType::GeneralAdversary), 2);
    }

    #[test]
    fn test_node_id_from_wire_treats_empty_as_none() {
        assert_eq!(NodeId::from_wire(""), None);
        assert_eq!(NodeId::from_wire("n1"), Some(NodeId::new("n1")));
    }
}
