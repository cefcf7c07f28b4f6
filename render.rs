/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Outbound collaborator seams.
//!
//! The coordinator mirrors every view mutation into a [`RenderSink`] (the
//! graph drawing/physics engine) and asks a [`Presenter`] to re-read state
//! whenever panels may be stale. Both are black boxes to this crate.

use crate::model::{NodeId, NodeType, TopologyKind};

/// Receives view-level mutations in the order the coordinator applies them.
///
/// All methods default to doing nothing so sinks only implement what they draw.
pub trait RenderSink {
    fn add_node(&mut self, _view: TopologyKind, _id: &NodeId, _node_type: NodeType) {}

    fn remove_node(&mut self, _view: TopologyKind, _id: &NodeId) {}

    /// An already drawn node was re-initialized with a different type.
    fn set_node_type(&mut self, _view: TopologyKind, _id: &NodeId, _node_type: NodeType) {}

    fn add_edge(&mut self, _view: TopologyKind, _from: &NodeId, _to: &NodeId) {}

    fn remove_edge(&mut self, _view: TopologyKind, _from: &NodeId, _to: &NodeId) {}

    fn set_current_view(&mut self, _view: TopologyKind) {}

    /// The initial snapshot is complete; start drawing.
    fn activate(&mut self) {}
}

/// Which presentation panels should re-read coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshRequest {
    pub selection: bool,
    pub hover: bool,
    pub stats: bool,
}

impl RefreshRequest {
    pub const ALL: RefreshRequest = RefreshRequest {
        selection: true,
        hover: true,
        stats: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.selection || self.hover || self.stats)
    }
}

/// Pull-based panel owner: told *that* it should refresh, never *what* changed.
pub trait Presenter {
    fn refresh(&mut self, request: RefreshRequest);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderSink;

impl RenderSink for NullRenderSink {}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn refresh(&mut self, _request: RefreshRequest) {}
}

/// Render sink that traces every call; used by the replay binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderSink;

impl RenderSink for LogRenderSink {
    fn add_node(&mut self, view: TopologyKind, id: &NodeId, node_type: NodeType) {
        log::trace!("render[{}]: add node {id} ({node_type:?})", view.label());
    }

    fn remove_node(&mut self, view: TopologyKind, id: &NodeId) {
        log::trace!("render[{}]: remove node {id}", view.label());
    }

    fn set_node_type(&mut self, view: TopologyKind, id: &NodeId, node_type: NodeType) {
        log::trace!("render[{}]: node {id} is now {node_type:?}", view.label());
    }

    fn add_edge(&mut self, view: TopologyKind, from: &NodeId, to: &NodeId) {
        log::trace!("render[{}]: add edge {from} -> {to}", view.label());
    }

    fn remove_edge(&mut self, view: TopologyKind, from: &NodeId, to: &NodeId) {
        log::trace!("render[{}]: remove edge {from} -> {to}", view.label());
    }

    fn set_current_view(&mut self, view: TopologyKind) {
        log::debug!("render: showing {} view", view.label());
    }

    fn activate(&mut self) {
        log::info!("render: initial state loaded, rendering activated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_request_all_is_not_empty() {
        assert!(!RefreshRequest::ALL.is_empty());
        assert!(RefreshRequest::default().is_empty());
    }
}
