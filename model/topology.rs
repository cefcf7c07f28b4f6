/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Topology views over the simulated node set.
//!
//! Core structures:
//! - `TopologyKind`: which relation a view models
//! - `TopologyView`: one relation, backed by petgraph::StableGraph
//! - `TopologyViews`: the four views kept side by side
//!
//! Edge identity differs per kind. The physical view is an undirected
//! adjacency with at most one link per unordered pair. Tree, snake and
//! geographic views hold directed pointers and permit parallel edges; their
//! single-slot discipline is kept by the coordinator's replace operation.

use std::collections::HashMap;

use petgraph::{Directed, Direction};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Identity of one of the four views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    /// Direct peerings between routers.
    #[default]
    Physical,
    /// Spanning tree parent pointers.
    Tree,
    /// Virtual snake ascending/descending neighbours.
    Snake,
    /// Coordinate-space neighbours.
    Geographic,
}

impl TopologyKind {
    pub const ALL: [TopologyKind; 4] = [
        TopologyKind::Physical,
        TopologyKind::Tree,
        TopologyKind::Snake,
        TopologyKind::Geographic,
    ];

    /// Whether `(a, b)` and `(b, a)` name the same edge in this view.
    pub fn is_undirected(self) -> bool {
        matches!(self, TopologyKind::Physical)
    }

    pub fn label(self) -> &'static str {
        match self {
            TopologyKind::Physical => "physical",
            TopologyKind::Tree => "tree",
            TopologyKind::Snake => "snake",
            TopologyKind::Geographic => "geographic",
        }
    }
}

/// Owned copy of one edge, as stored (`from` is the side that added it).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeView {
    pub from: NodeId,
    pub to: NodeId,
}

impl EdgeView {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from.as_str() == id || self.to.as_str() == id
    }
}

/// One relation over the node set.
#[derive(Debug, Clone)]
pub struct TopologyView {
    kind: TopologyKind,

    inner: StableGraph<NodeId, (), Directed>,

    /// Node id to stable petgraph index.
    id_to_index: HashMap<NodeId, NodeIndex>,
}

impl TopologyView {
    pub fn new(kind: TopologyKind) -> Self {
        Self {
            kind,
            inner: StableGraph::new(),
            id_to_index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.inner
            .node_indices()
            .map(move |index| &self.inner[index])
    }

    /// Iterate over all edges in insertion-stable index order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView> + '_ {
        self.inner.edge_references().map(|edge| EdgeView {
            from: self.inner[edge.source()].clone(),
            to: self.inner[edge.target()].clone(),
        })
    }

    /// Edges with `id` on either end.
    pub fn edges_touching(&self, id: &str) -> Vec<EdgeView> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        self.touching(index)
            .into_iter()
            .filter_map(|edge| self.edge_view(edge))
            .collect()
    }

    /// Number of edges touching `id`; a self-loop counts once.
    pub fn degree(&self, id: &str) -> usize {
        self.index_of(id)
            .map(|index| self.touching(index).len())
            .unwrap_or(0)
    }

    /// Whether the edge exists under this view's identity rule.
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        let (Some(from), Some(to)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        !self.matching(from, to).is_empty()
    }

    pub(crate) fn add_node(&mut self, id: &NodeId) -> bool {
        if self.id_to_index.contains_key(id) {
            return false;
        }
        let index = self.inner.add_node(id.clone());
        self.id_to_index.insert(id.clone(), index);
        true
    }

    /// Remove a node and anything still attached to it.
    pub(crate) fn remove_node(&mut self, id: &str) -> bool {
        let Some(index) = self.id_to_index.remove(id) else {
            return false;
        };
        self.inner.remove_node(index).is_some()
    }

    /// Add an edge between two members.
    ///
    /// Returns `false` when either endpoint is not a member, or when the
    /// physical view already links the pair in either orientation.
    pub(crate) fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(from), Some(to)) = (self.index_of(from), self.index_of(to)) else {
            return false;
        };
        if self.kind.is_undirected() && !self.matching(from, to).is_empty() {
            return false;
        }
        let _ = self.inner.add_edge(from, to, ());
        true
    }

    /// Remove matching edges, returning what was removed.
    ///
    /// Physical: every edge between the pair, either orientation. Directed
    /// views: a single exact `(from, to)` edge, so a node whose two snake
    /// roles point at the same neighbour keeps the other role's edge.
    pub(crate) fn remove_edge(&mut self, from: &str, to: &str) -> Vec<EdgeView> {
        let (Some(from), Some(to)) = (self.index_of(from), self.index_of(to)) else {
            return Vec::new();
        };
        let mut matches = self.matching(from, to);
        if !self.kind.is_undirected() {
            matches.truncate(1);
        }
        self.remove_edges(matches)
    }

    /// Remove every edge with `id` on either end, returning what was removed.
    pub(crate) fn remove_all_edges(&mut self, id: &str) -> Vec<EdgeView> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        let touching = self.touching(index);
        self.remove_edges(touching)
    }

    /// Remove the edges `id` owns: its outgoing pointers in a directed view,
    /// every link touching it in the physical view.
    pub(crate) fn remove_outgoing_edges(&mut self, id: &str) -> Vec<EdgeView> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };
        let owned = if self.kind.is_undirected() {
            self.touching(index)
        } else {
            self.inner
                .edges_directed(index, Direction::Outgoing)
                .map(|edge| edge.id())
                .collect()
        };
        self.remove_edges(owned)
    }

    pub(crate) fn clear(&mut self) {
        self.inner.clear();
        self.id_to_index.clear();
    }

    fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    fn edge_view(&self, edge: EdgeIndex) -> Option<EdgeView> {
        let (source, target) = self.inner.edge_endpoints(edge)?;
        Some(EdgeView {
            from: self.inner.node_weight(source)?.clone(),
            to: self.inner.node_weight(target)?.clone(),
        })
    }

    fn remove_edges(&mut self, edges: Vec<EdgeIndex>) -> Vec<EdgeView> {
        let mut removed = Vec::with_capacity(edges.len());
        for edge in edges {
            let view = self.edge_view(edge);
            if self.inner.remove_edge(edge).is_some()
                && let Some(view) = view
            {
                removed.push(view);
            }
        }
        removed
    }

    fn touching(&self, index: NodeIndex) -> Vec<EdgeIndex> {
        self.inner
            .edge_references()
            .filter(|edge| edge.source() == index || edge.target() == index)
            .map(|edge| edge.id())
            .collect()
    }

    fn matching(&self, from: NodeIndex, to: NodeIndex) -> Vec<EdgeIndex> {
        let undirected = self.kind.is_undirected();
        self.inner
            .edge_references()
            .filter(|edge| {
                (edge.source() == from && edge.target() == to)
                    || (undirected && edge.source() == to && edge.target() == from)
            })
            .map(|edge| edge.id())
            .collect()
    }
}

/// The four views, always holding the same node set.
#[derive(Debug, Clone)]
pub struct TopologyViews {
    physical: TopologyView,
    tree: TopologyView,
    snake: TopologyView,
    geographic: TopologyView,
}

impl TopologyViews {
    pub fn new() -> Self {
        Self {
            physical: TopologyView::new(TopologyKind::Physical),
            tree: TopologyView::new(TopologyKind::Tree),
            snake: TopologyView::new(TopologyKind::Snake),
            geographic: TopologyView::new(TopologyKind::Geographic),
        }
    }

    pub fn get(&self, kind: TopologyKind) -> &TopologyView {
        match kind {
            TopologyKind::Physical => &self.physical,
            TopologyKind::Tree => &self.tree,
            TopologyKind::Snake => &self.snake,
            TopologyKind::Geographic => &self.geographic,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: TopologyKind) -> &mut TopologyView {
        match kind {
            TopologyKind::Physical => &mut self.physical,
            TopologyKind::Tree => &mut self.tree,
            TopologyKind::Snake => &mut self.snake,
            TopologyKind::Geographic => &mut self.geographic,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopologyView> {
        TopologyKind::ALL.into_iter().map(|kind| self.get(kind))
    }
}

impl Default for TopologyViews {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_with(kind: TopologyKind, ids: &[&str]) -> TopologyView {
        let mut view = TopologyView::new(kind);
        for id in ids {
            view.add_node(&NodeId::new(*id));
        }
        view
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut view = TopologyView::new(TopologyKind::Tree);
        assert!(view.add_node(&NodeId::new("a")));
        assert!(!view.add_node(&NodeId::new("a")));
        assert_eq!(view.node_count(), 1);
    }

    #[test]
    fn test_physical_edge_is_undirected_and_deduplicated() {
        let mut view = view_with(TopologyKind::Physical, &["a", "b"]);
        assert!(view.add_edge("a", "b"));
        assert!(!view.add_edge("b", "a"));
        assert!(!view.add_edge("a", "b"));
        assert_eq!(view.edge_count(), 1);
        assert!(view.contains_edge("b", "a"));
    }

    #[test]
    fn test_directed_views_allow_parallel_edges() {
        let mut view = view_with(TopologyKind::Snake, &["a", "b"]);
        assert!(view.add_edge("a", "b"));
        assert!(view.add_edge("a", "b"));
        assert!(view.add_edge("b", "a"));
        assert_eq!(view.edge_count(), 3);
        assert!(!view.contains_edge("a", "c"));
    }

    #[test]
    fn test_directed_remove_takes_one_exact_match() {
        let mut view = view_with(TopologyKind::Snake, &["a", "b"]);
        view.add_edge("a", "b");
        view.add_edge("a", "b");
        view.add_edge("b", "a");

        assert_eq!(view.remove_edge("a", "b"), vec![EdgeView::new("a", "b")]);
        assert_eq!(view.edge_count(), 2);
        assert!(view.contains_edge("a", "b"));
        assert!(view.contains_edge("b", "a"));
    }

    #[test]
    fn test_tree_remove_ignores_reverse_orientation() {
        let mut view = view_with(TopologyKind::Tree, &["a", "b"]);
        view.add_edge("a", "b");
        assert!(view.remove_edge("b", "a").is_empty());
        assert_eq!(view.edge_count(), 1);
    }

    #[test]
    fn test_physical_remove_takes_both_orientations() {
        let mut view = view_with(TopologyKind::Physical, &["a", "b"]);
        view.add_edge("a", "b");
        assert_eq!(view.remove_edge("b", "a"), vec![EdgeView::new("a", "b")]);
        assert_eq!(view.edge_count(), 0);
    }

    #[test]
    fn test_remove_absent_edge_twice_is_noop() {
        let mut view = view_with(TopologyKind::Geographic, &["a", "b"]);
        assert!(view.remove_edge("a", "b").is_empty());
        assert!(view.remove_edge("a", "b").is_empty());
        assert!(view.remove_edge("a", "ghost").is_empty());
        assert_eq!(view.edge_count(), 0);
        assert_eq!(view.node_count(), 2);
    }

    #[test]
    fn test_add_edge_requires_members() {
        let mut view = view_with(TopologyKind::Tree, &["a"]);
        assert!(!view.add_edge("a", "ghost"));
        assert!(!view.add_edge("ghost", "a"));
        assert_eq!(view.edge_count(), 0);
    }

    #[test]
    fn test_remove_outgoing_edges_keeps_incoming_pointers() {
        let mut view = view_with(TopologyKind::Snake, &["a", "b", "c"]);
        view.add_edge("a", "b");
        view.add_edge("c", "a");

        assert_eq!(view.remove_outgoing_edges("a"), vec![EdgeView::new("a", "b")]);
        assert_eq!(view.edges().collect::<Vec<_>>(), vec![EdgeView::new("c", "a")]);
    }

    #[test]
    fn test_remove_outgoing_edges_on_physical_takes_every_link() {
        let mut view = view_with(TopologyKind::Physical, &["a", "b", "c"]);
        view.add_edge("a", "b");
        view.add_edge("c", "a");

        assert_eq!(view.remove_outgoing_edges("a").len(), 2);
        assert_eq!(view.edge_count(), 0);
    }

    #[test]
    fn test_remove_all_edges_returns_removed_edges() {
        let mut view = view_with(TopologyKind::Tree, &["a", "b", "c"]);
        view.add_edge("a", "b");
        view.add_edge("c", "b");
        view.add_edge("a", "c");
        view.add_edge("b", "b");

        let mut removed = view.remove_all_edges("b");
        removed.sort_by(|x, y| (&x.from, &x.to).cmp(&(&y.from, &y.to)));
        assert_eq!(
            removed,
            vec![
                EdgeView::new("a", "b"),
                EdgeView::new("b", "b"),
                EdgeView::new("c", "b"),
            ]
        );
        assert_eq!(view.edges().collect::<Vec<_>>(), vec![EdgeView::new("a", "c")]);
    }

    #[test]
    fn test_degree_counts_both_directions() {
        let mut view = view_with(TopologyKind::Physical, &["a", "b", "c"]);
        view.add_edge("a", "b");
        view.add_edge("c", "b");
        assert_eq!(view.degree("b"), 2);
        assert_eq!(view.degree("a"), 1);
        assert_eq!(view.degree("ghost"), 0);
        assert_eq!(view.edges_touching("a"), vec![EdgeView::new("a", "b")]);
    }

    #[test]
    fn test_remove_node_drops_membership() {
        let mut view = view_with(TopologyKind::Snake, &["a", "b"]);
        view.add_edge("a", "b");
        assert!(view.remove_node("a"));
        assert!(!view.remove_node("a"));
        assert!(!view.contains_node("a"));
        assert_eq!(view.edge_count(), 0);
    }

    #[test]
    fn test_views_are_independent() {
        let mut views = TopologyViews::new();
        for kind in TopologyKind::ALL {
            views.get_mut(kind).add_node(&NodeId::new("a"));
            views.get_mut(kind).add_node(&NodeId::new("b"));
        }
        views.get_mut(TopologyKind::Tree).add_edge("a", "b");

        assert_eq!(views.get(TopologyKind::Tree).edge_count(), 1);
        assert_eq!(views.get(TopologyKind::Physical).edge_count(), 0);
        assert_eq!(views.iter().map(TopologyView::node_count).sum::<usize>(), 8);
    }
}
