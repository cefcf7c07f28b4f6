/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Recording collaborators for tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::GraphCoordinator;
use crate::config::SimviewConfig;
use crate::model::{NodeId, NodeType, TopologyKind};
use crate::render::{Presenter, RefreshRequest, RenderSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    AddNode(TopologyKind, NodeId),
    RemoveNode(TopologyKind, NodeId),
    SetNodeType(TopologyKind, NodeId, NodeType),
    AddEdge(TopologyKind, NodeId, NodeId),
    RemoveEdge(TopologyKind, NodeId, NodeId),
    SetCurrentView(TopologyKind),
    Activate,
}

/// Render sink whose call log stays readable after the sink is boxed away.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderSink {
    calls: Rc<RefCell<Vec<RenderCall>>>,
}

impl RecordingRenderSink {
    /// Drain the calls recorded so far.
    pub fn take(&self) -> Vec<RenderCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn push(&self, call: RenderCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RenderSink for RecordingRenderSink {
    fn add_node(&mut self, view: TopologyKind, id: &NodeId, _node_type: NodeType) {
        self.push(RenderCall::AddNode(view, id.clone()));
    }

    fn remove_node(&mut self, view: TopologyKind, id: &NodeId) {
        self.push(RenderCall::RemoveNode(view, id.clone()));
    }

    fn set_node_type(&mut self, view: TopologyKind, id: &NodeId, node_type: NodeType) {
        self.push(RenderCall::SetNodeType(view, id.clone(), node_type));
    }

    fn add_edge(&mut self, view: TopologyKind, from: &NodeId, to: &NodeId) {
        self.push(RenderCall::AddEdge(view, from.clone(), to.clone()));
    }

    fn remove_edge(&mut self, view: TopologyKind, from: &NodeId, to: &NodeId) {
        self.push(RenderCall::RemoveEdge(view, from.clone(), to.clone()));
    }

    fn set_current_view(&mut self, view: TopologyKind) {
        self.push(RenderCall::SetCurrentView(view));
    }

    fn activate(&mut self) {
        self.push(RenderCall::Activate);
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    requests: Rc<RefCell<Vec<RefreshRequest>>>,
}

impl RecordingPresenter {
    pub fn take(&self) -> Vec<RefreshRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }
}

impl Presenter for RecordingPresenter {
    fn refresh(&mut self, request: RefreshRequest) {
        self.requests.borrow_mut().push(request);
    }
}

/// Coordinator wired to recorders, plus handles to read them back.
pub fn coordinator_with_recorders(
    config: &SimviewConfig,
) -> (GraphCoordinator, RecordingRenderSink, RecordingPresenter) {
    let renderer = RecordingRenderSink::default();
    let presenter = RecordingPresenter::default();
    let coordinator = GraphCoordinator::with_collaborators(
        config,
        Box::new(renderer.clone()),
        Box::new(presenter.clone()),
    );
    (coordinator, renderer, presenter)
}
