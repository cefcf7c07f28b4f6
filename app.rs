/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The graph coordinator: single owner of node metadata, the four topology
//! views and transient UI state.
//!
//! Every mutation here runs to completion before returning: store, views,
//! renderer forwarding and presenter notification happen in one `&mut self`
//! call, so no observer sees a node in the store but missing from a view.

pub mod selection;

use crate::config::{DuplicateNodePolicy, SimviewConfig};
use crate::error::SimviewError;
use crate::model::{
    Announcement, EdgeView, Node, NodeId, NodeStore, NodeType, PeerPort, TopologyKind,
    TopologyView, TopologyViews, node::normalize_path,
};
use crate::render::{NullPresenter, NullRenderSink, Presenter, RefreshRequest, RenderSink};
use crate::stats::{SimStats, aggregate};

pub use selection::{ReconcileOutcome, SelectionState, reconcile_removed};

/// UI-originated changes to transient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiIntent {
    /// Replace the selection with `ids`; the last one becomes primary.
    SelectNodes {
        ids: Vec<NodeId>,
    },
    ClearSelection,
    SetHover {
        id: NodeId,
    },
    ClearHover,
    SetCurrentView {
        view: TopologyKind,
    },
}

/// Which snake role a pointer update addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeRole {
    Ascending,
    Descending,
}

pub struct GraphCoordinator {
    store: NodeStore,
    views: TopologyViews,

    selection: SelectionState,
    hover: Option<NodeId>,

    /// View currently shown by the renderer.
    current_view: TopologyKind,

    /// Set once the initial snapshot has completed.
    live: bool,

    duplicate_policy: DuplicateNodePolicy,

    renderer: Box<dyn RenderSink>,
    presenter: Box<dyn Presenter>,
}

impl GraphCoordinator {
    pub fn new(config: &SimviewConfig) -> Self {
        Self::with_collaborators(config, Box::new(NullRenderSink), Box::new(NullPresenter))
    }

    pub fn with_collaborators(
        config: &SimviewConfig,
        renderer: Box<dyn RenderSink>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            store: NodeStore::new(),
            views: TopologyViews::new(),
            selection: SelectionState::new(),
            hover: None,
            current_view: config.initial_view,
            live: false,
            duplicate_policy: config.duplicate_nodes,
            renderer,
            presenter,
        }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.store.iter()
    }

    pub fn view(&self, kind: TopologyKind) -> &TopologyView {
        self.views.get(kind)
    }

    pub fn views(&self) -> &TopologyViews {
        &self.views
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn hover(&self) -> Option<&NodeId> {
        self.hover.as_ref()
    }

    pub fn current_view(&self) -> TopologyKind {
        self.current_view
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn node_type(&self, id: &str) -> NodeType {
        self.store.node_type(id)
    }

    pub fn node_key(&self, id: &str) -> &str {
        self.store.node_key(id)
    }

    pub fn stats(&self) -> SimStats {
        aggregate(&self.store, self.live)
    }

    /// Physical links touching a selected node, while the physical view is shown.
    pub fn selected_peer_edges(&self) -> Vec<EdgeView> {
        if self.current_view != TopologyKind::Physical {
            return Vec::new();
        }
        self.views
            .get(TopologyKind::Physical)
            .edges()
            .filter(|edge| {
                self.selection.contains(edge.from.as_str())
                    || self.selection.contains(edge.to.as_str())
            })
            .collect()
    }

    /// Add a node to the store and all four views.
    ///
    /// An existing id is handled per [`DuplicateNodePolicy`].
    pub fn add_node(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        node_type: NodeType,
    ) -> Result<(), SimviewError> {
        let previous_type = self.store.get(id.as_str()).map(|node| node.node_type);
        if previous_type.is_some() {
            match self.duplicate_policy {
                DuplicateNodePolicy::Reject => return Err(SimviewError::DuplicateNode(id)),
                DuplicateNodePolicy::Overwrite => {
                    log::debug!("re-initializing existing node {id}");
                    self.release_owned_edges(id.as_str());
                },
            }
        }

        self.store.insert(id.clone(), key.into(), node_type);
        for kind in TopologyKind::ALL {
            if self.views.get_mut(kind).add_node(&id) {
                self.renderer.add_node(kind, &id, node_type);
            } else if previous_type != Some(node_type) {
                self.renderer.set_node_type(kind, &id, node_type);
            }
        }

        self.notify_node_changed(id.as_str());
        Ok(())
    }

    /// Remove a node, every edge touching it, and any UI reference to it.
    pub fn remove_node(&mut self, id: &str) -> bool {
        if !self.store.contains(id) {
            log::debug!("remove_node: {id} not present");
            return false;
        }

        self.detach_node(id);
        let node_id = NodeId::new(id);
        for kind in TopologyKind::ALL {
            if self.views.get_mut(kind).remove_node(id) {
                self.renderer.remove_node(kind, &node_id);
            }
        }
        let _ = self.store.remove(id);

        let outcome = reconcile_removed(&mut self.selection, &mut self.hover, &self.store);
        if outcome.changed() {
            log::debug!(
                "removal of {id} deselected {:?}, hover cleared: {}",
                outcome.deselected,
                outcome.hover_cleared
            );
        }
        self.presenter.refresh(RefreshRequest::ALL);
        true
    }

    pub fn update_announcement(
        &mut self,
        id: &str,
        root: Option<NodeId>,
        sequence: u64,
        time: u64,
        coords: Vec<u64>,
    ) -> bool {
        let announcement = Announcement {
            root,
            sequence,
            time,
        };
        if !self.store.update_announcement(id, announcement, coords) {
            log::debug!("update_announcement: {id} not present");
            return false;
        }
        self.notify_node_changed(id);
        true
    }

    /// Swap a directed pointer edge from `prev` to `next` in one step.
    ///
    /// The old edge goes first, so re-pointing at the same target leaves
    /// exactly one edge. A `next` that is not in the store makes the whole
    /// call a no-op. Physical links are not pointers and are refused.
    pub fn replace_directed_edge(
        &mut self,
        kind: TopologyKind,
        from: &str,
        prev: Option<&str>,
        next: Option<&str>,
    ) -> bool {
        if kind.is_undirected() {
            log::warn!("replace_directed_edge called on the {} view", kind.label());
            return false;
        }
        if !self.store.contains(from) {
            log::debug!("replace_directed_edge: {from} not present");
            return false;
        }
        if let Some(next) = next
            && !self.store.contains(next)
        {
            log::debug!("{} edge {from} -> {next}: target not present", kind.label());
            return false;
        }

        if let Some(prev) = prev {
            for edge in self.views.get_mut(kind).remove_edge(from, prev) {
                self.renderer.remove_edge(kind, &edge.from, &edge.to);
            }
        }
        if let Some(next) = next
            && self.views.get_mut(kind).add_edge(from, next)
        {
            self.renderer
                .add_edge(kind, &NodeId::new(from), &NodeId::new(next));
        }
        true
    }

    pub fn set_tree_parent(&mut self, id: &str, parent: Option<&str>, prev: Option<&str>) -> bool {
        if !self.replace_directed_edge(TopologyKind::Tree, id, prev, parent) {
            return false;
        }
        if let Some(node) = self.store.get_mut(id) {
            node.tree_parent = parent.map(NodeId::new);
        }
        self.notify_node_changed(id);
        true
    }

    pub fn set_snek_ascending(
        &mut self,
        id: &str,
        asc: Option<&str>,
        prev: Option<&str>,
        path: &str,
    ) -> bool {
        self.set_snek_neighbour(SnakeRole::Ascending, id, asc, prev, path)
    }

    pub fn set_snek_descending(
        &mut self,
        id: &str,
        desc: Option<&str>,
        prev: Option<&str>,
        path: &str,
    ) -> bool {
        self.set_snek_neighbour(SnakeRole::Descending, id, desc, prev, path)
    }

    fn set_snek_neighbour(
        &mut self,
        role: SnakeRole,
        id: &str,
        next: Option<&str>,
        prev: Option<&str>,
        path: &str,
    ) -> bool {
        if !self.replace_directed_edge(TopologyKind::Snake, id, prev, next) {
            return false;
        }
        if let Some(node) = self.store.get_mut(id) {
            let neighbour = next.map(NodeId::new);
            let path = normalize_path(path);
            match role {
                SnakeRole::Ascending => {
                    node.snek_asc = neighbour;
                    node.snek_asc_path = path;
                },
                SnakeRole::Descending => {
                    node.snek_desc = neighbour;
                    node.snek_desc_path = path;
                },
            }
        }
        self.notify_node_changed(id);
        true
    }

    /// Record a peering on `id` and link the pair in the physical view.
    ///
    /// Both endpoints must exist; otherwise neither the peer list nor the
    /// view changes.
    pub fn add_peer_link(&mut self, id: &str, peer: &str, port: u64) -> bool {
        if !self.store.contains(id) || !self.store.contains(peer) {
            log::debug!("add_peer_link: {id} <-> {peer} references a missing node");
            return false;
        }

        let peer_id = NodeId::new(peer);
        if self
            .views
            .get_mut(TopologyKind::Physical)
            .add_edge(id, peer)
        {
            self.renderer
                .add_edge(TopologyKind::Physical, &NodeId::new(id), &peer_id);
        }
        let _ = self.store.push_peer(id, PeerPort { id: peer_id, port });

        self.notify_node_changed(id);
        true
    }

    /// Drop `peer` from `id`'s peer list and unlink the pair.
    pub fn remove_peer_link(&mut self, id: &str, peer: &str) -> bool {
        if !self.store.contains(id) {
            log::debug!("remove_peer_link: {id} not present");
            return false;
        }

        for edge in self
            .views
            .get_mut(TopologyKind::Physical)
            .remove_edge(id, peer)
        {
            self.renderer
                .remove_edge(TopologyKind::Physical, &edge.from, &edge.to);
        }
        let _ = self.store.remove_peer(id, peer);

        self.notify_node_changed(id);
        true
    }

    /// Add a raw edge to one view. Used for snapshot edges and geographic links.
    pub fn add_edge(&mut self, kind: TopologyKind, from: &str, to: &str) -> bool {
        if !self.views.get_mut(kind).add_edge(from, to) {
            return false;
        }
        self.renderer
            .add_edge(kind, &NodeId::new(from), &NodeId::new(to));
        true
    }

    /// Remove a raw edge from one view under that view's identity rule.
    pub fn remove_edge(&mut self, kind: TopologyKind, from: &str, to: &str) -> usize {
        let removed = self.views.get_mut(kind).remove_edge(from, to);
        for edge in &removed {
            self.renderer.remove_edge(kind, &edge.from, &edge.to);
        }
        removed.len()
    }

    /// Apply UI intents in order.
    pub fn apply_ui_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = UiIntent>,
    {
        for intent in intents {
            self.apply_ui_intent(intent);
        }
    }

    fn apply_ui_intent(&mut self, intent: UiIntent) {
        match intent {
            UiIntent::SelectNodes { ids } => {
                let ids: Vec<NodeId> = ids
                    .into_iter()
                    .filter(|id| self.store.contains(id.as_str()))
                    .collect();
                self.selection.replace(ids);
                self.presenter.refresh(RefreshRequest {
                    selection: true,
                    ..RefreshRequest::default()
                });
            },
            UiIntent::ClearSelection => {
                self.selection.clear();
                self.presenter.refresh(RefreshRequest {
                    selection: true,
                    ..RefreshRequest::default()
                });
            },
            UiIntent::SetHover { id } => {
                self.hover = self.store.contains(id.as_str()).then_some(id);
                self.presenter.refresh(RefreshRequest {
                    hover: true,
                    ..RefreshRequest::default()
                });
            },
            UiIntent::ClearHover => {
                self.hover = None;
                self.presenter.refresh(RefreshRequest {
                    hover: true,
                    ..RefreshRequest::default()
                });
            },
            UiIntent::SetCurrentView { view } => {
                self.current_view = view;
                self.renderer.set_current_view(view);
                self.presenter.refresh(RefreshRequest {
                    selection: true,
                    ..RefreshRequest::default()
                });
            },
        }
    }

    /// Snapshot complete: start rendering and let stats report.
    pub(crate) fn mark_live(&mut self) {
        if self.live {
            return;
        }
        self.live = true;
        self.renderer.set_current_view(self.current_view);
        self.renderer.activate();
        self.presenter.refresh(RefreshRequest::ALL);
    }

    /// Drop every node, edge and UI reference ahead of a fresh snapshot.
    pub(crate) fn reset(&mut self) {
        let ids: Vec<NodeId> = self.store.ids().cloned().collect();
        for kind in TopologyKind::ALL {
            for id in &ids {
                self.renderer.remove_node(kind, id);
            }
            self.views.get_mut(kind).clear();
        }
        self.store.clear();
        self.live = false;
        let _ = reconcile_removed(&mut self.selection, &mut self.hover, &self.store);
        self.presenter.refresh(RefreshRequest::ALL);
    }

    /// Drop the edges a re-initialized node no longer backs: its own
    /// pointers and its physical links. Pointers other nodes hold at it stay.
    fn release_owned_edges(&mut self, id: &str) {
        for kind in TopologyKind::ALL {
            for edge in self.views.get_mut(kind).remove_outgoing_edges(id) {
                self.renderer.remove_edge(kind, &edge.from, &edge.to);
            }
        }
        let _ = self.store.forget_peer(id);
    }

    /// Cut a node loose: no edges in any view, no peer entries naming it.
    fn detach_node(&mut self, id: &str) {
        for kind in TopologyKind::ALL {
            for edge in self.views.get_mut(kind).remove_all_edges(id) {
                self.renderer.remove_edge(kind, &edge.from, &edge.to);
            }
        }
        let _ = self.store.forget_peer(id);
    }

    fn notify_node_changed(&mut self, id: &str) {
        self.presenter.refresh(RefreshRequest {
            selection: self.selection.contains(id),
            hover: self.hover.as_ref().is_some_and(|hover| hover.as_str() == id),
            stats: true,
        });
    }
}
