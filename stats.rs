/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Aggregate statistics derived from the node store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{NodeId, NodeStore};

/// Share of nodes announcing one root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootConvergence {
    /// `None` groups nodes that have not heard any announcement yet.
    pub root: Option<NodeId>,
    pub nodes: usize,
    /// Percentage of all nodes, rounded to 2 decimal places.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SimStats {
    pub node_count: usize,
    /// Physical links, counted once per pair (peer-list entries halved).
    pub path_count: usize,
    /// One entry per distinct root, ordered by root id.
    pub root_convergence: Vec<RootConvergence>,
}

impl SimStats {
    pub fn is_empty(&self) -> bool {
        self.node_count == 0 && self.path_count == 0 && self.root_convergence.is_empty()
    }
}

/// Summarize the store. Yields an empty result until the view is live.
pub fn aggregate(store: &NodeStore, live: bool) -> SimStats {
    if !live || store.is_empty() {
        return SimStats::default();
    }

    let mut peer_entries = 0usize;
    let mut per_root: BTreeMap<Option<&NodeId>, usize> = BTreeMap::new();
    for (_, node) in store.iter() {
        peer_entries += node.peers.len();
        *per_root.entry(node.announcement.root.as_ref()).or_default() += 1;
    }

    let total = store.len();
    let root_convergence = per_root
        .into_iter()
        .map(|(root, nodes)| RootConvergence {
            root: root.cloned(),
            nodes,
            percent: round_2dp(nodes as f64 / total as f64 * 100.0),
        })
        .collect();

    SimStats {
        node_count: total,
        path_count: peer_entries / 2,
        root_convergence,
    }
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
