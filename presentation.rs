/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Read-only panel models derived from coordinator state.
//!
//! A presenter calls these after a refresh request; nothing here mutates.

use serde::Serialize;

use crate::app::GraphCoordinator;
use crate::model::{NodeId, NodeType};

/// Key width in the detail and hover panels.
pub const DETAIL_KEY_WIDTH: usize = 16;
/// Key width in the peer table.
pub const PEER_KEY_WIDTH: usize = 8;
/// Key width in the node summary table.
pub const SUMMARY_KEY_WIDTH: usize = 4;

/// Strip quotes, uppercase, then keep at most `width` characters.
pub fn display_key(raw: &str, width: usize) -> String {
    raw.chars()
        .filter(|c| *c != '"')
        .flat_map(char::to_uppercase)
        .take(width)
        .collect()
}

/// Keep the first `width` raw characters, then strip quotes and uppercase.
///
/// Detail, hover and summary panels cut the raw key first, so a quoted key
/// loses its opening quote to the width.
pub fn clipped_key(raw: &str, width: usize) -> String {
    raw.chars()
        .take(width)
        .filter(|c| *c != '"')
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn node_type_label(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Peer => "Peer",
        NodeType::GeneralAdversary => "General Adversary",
        NodeType::Unknown => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerRow {
    pub id: NodeId,
    /// Empty when the peer is not (or no longer) in the store.
    pub key: String,
    pub port: u64,
    pub root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDetails {
    pub id: NodeId,
    pub node_type: &'static str,
    pub coords: Vec<u64>,
    pub key: String,
    pub root_key: String,
    pub tree_parent: Option<NodeId>,
    pub snek_desc: Option<NodeId>,
    pub snek_desc_path: String,
    pub snek_asc: Option<NodeId>,
    pub snek_asc_path: String,
    pub peers: Vec<PeerRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverDetails {
    pub id: NodeId,
    pub key: String,
    pub node_type: &'static str,
    pub coords: Vec<u64>,
    pub tree_parent: Option<NodeId>,
    pub snek_desc: Option<NodeId>,
    pub snek_asc: Option<NodeId>,
    pub root: Option<NodeId>,
    pub sequence: u64,
    pub time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummaryRow {
    pub id: NodeId,
    pub coords: Vec<u64>,
    pub root: Option<NodeId>,
    pub desc_key: String,
    pub key: String,
    pub asc_key: String,
}

pub fn node_details(coordinator: &GraphCoordinator, id: &str) -> Option<NodeDetails> {
    let node = coordinator.node(id)?;
    let root_key = node
        .announcement
        .root
        .as_ref()
        .map(|root| coordinator.node_key(root.as_str()))
        .unwrap_or("");

    let peers = node
        .peers
        .iter()
        .map(|peer| {
            let (key, root) = coordinator
                .node(peer.id.as_str())
                .map(|info| {
                    let root = info
                        .announcement
                        .root
                        .as_ref()
                        .map(|root| display_key(root.as_str(), usize::MAX))
                        .unwrap_or_default();
                    (display_key(&info.key, PEER_KEY_WIDTH), root)
                })
                .unwrap_or_default();
            PeerRow {
                id: peer.id.clone(),
                key,
                port: peer.port,
                root,
            }
        })
        .collect();

    Some(NodeDetails {
        id: NodeId::new(id),
        node_type: node_type_label(node.node_type),
        coords: node.coords.clone(),
        key: clipped_key(&node.key, DETAIL_KEY_WIDTH),
        root_key: clipped_key(root_key, DETAIL_KEY_WIDTH),
        tree_parent: node.tree_parent.clone(),
        snek_desc: node.snek_desc.clone(),
        snek_desc_path: node.snek_desc_path.clone(),
        snek_asc: node.snek_asc.clone(),
        snek_asc_path: node.snek_asc_path.clone(),
        peers,
    })
}

/// Details for every selected node, in selection order.
pub fn selection_details(coordinator: &GraphCoordinator) -> Vec<NodeDetails> {
    coordinator
        .selection()
        .ordered()
        .iter()
        .filter_map(|id| node_details(coordinator, id.as_str()))
        .collect()
}

pub fn hover_details(coordinator: &GraphCoordinator) -> Option<HoverDetails> {
    let id = coordinator.hover()?;
    let node = coordinator.node(id.as_str())?;
    Some(HoverDetails {
        id: id.clone(),
        key: clipped_key(&node.key, DETAIL_KEY_WIDTH),
        node_type: node_type_label(node.node_type),
        coords: node.coords.clone(),
        tree_parent: node.tree_parent.clone(),
        snek_desc: node.snek_desc.clone(),
        snek_asc: node.snek_asc.clone(),
        root: node.announcement.root.clone(),
        sequence: node.announcement.sequence,
        time_ms: node.announcement.time / 1000,
    })
}

/// One row per node, ordered by id. Empty until live.
pub fn node_summary(coordinator: &GraphCoordinator) -> Vec<NodeSummaryRow> {
    if !coordinator.is_live() {
        return Vec::new();
    }
    let short_key = |id: Option<&NodeId>| {
        id.map(|id| clipped_key(coordinator.node_key(id.as_str()), SUMMARY_KEY_WIDTH))
            .unwrap_or_default()
    };
    coordinator
        .nodes()
        .map(|(id, node)| NodeSummaryRow {
            id: id.clone(),
            coords: node.coords.clone(),
            root: node.announcement.root.clone(),
            desc_key: short_key(node.snek_desc.as_ref()),
            key: clipped_key(&node.key, SUMMARY_KEY_WIDTH),
            asc_key: short_key(node.snek_asc.as_ref()),
        })
        .collect()
}
