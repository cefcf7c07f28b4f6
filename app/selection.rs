/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Transient selection/hover state and its reconciliation against the store.

use std::collections::HashSet;
use std::ops::Deref;

use crate::model::{NodeId, NodeLookup};

/// Canonical node-selection state.
///
/// The selected-node set plus selection order, the primary (last listed)
/// node, and a revision counter bumped whenever the selection changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    nodes: HashSet<NodeId>,
    order: Vec<NodeId>,
    primary: Option<NodeId>,
    revision: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic revision incremented whenever the selection changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Primary selected node (last in the selection order).
    pub fn primary(&self) -> Option<&NodeId> {
        self.primary.as_ref()
    }

    /// Selected ids in the order they were listed.
    pub fn ordered(&self) -> &[NodeId] {
        &self.order
    }

    pub fn clear(&mut self) {
        if self.nodes.is_empty() && self.primary.is_none() {
            return;
        }
        self.nodes.clear();
        self.order.clear();
        self.primary = None;
        self.bump();
    }

    /// Select exactly `ids`, in order, ignoring repeats. The last id is primary.
    pub fn replace(&mut self, ids: Vec<NodeId>) {
        let mut nodes = HashSet::with_capacity(ids.len());
        let order: Vec<NodeId> = ids
            .into_iter()
            .filter(|id| nodes.insert(id.clone()))
            .collect();
        if order == self.order {
            return;
        }
        self.nodes = nodes;
        self.primary = order.last().cloned();
        self.order = order;
        self.bump();
    }

    /// Drop every selected id the lookup no longer knows; returns the dropped ids.
    pub fn retain_present(&mut self, lookup: &dyn NodeLookup) -> Vec<NodeId> {
        let dropped: Vec<NodeId> = self
            .order
            .iter()
            .filter(|id| !lookup.contains_node(id.as_str()))
            .cloned()
            .collect();
        if dropped.is_empty() {
            return dropped;
        }
        for id in &dropped {
            self.nodes.remove(id);
        }
        self.order.retain(|id| self.nodes.contains(id));
        self.primary = self.order.last().cloned();
        self.bump();
        dropped
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}

impl Deref for SelectionState {
    type Target = HashSet<NodeId>;

    fn deref(&self) -> &Self::Target {
        &self.nodes
    }
}

/// What a reconciliation pass removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    pub deselected: Vec<NodeId>,
    pub hover_cleared: bool,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        !self.deselected.is_empty() || self.hover_cleared
    }
}

/// Remove dangling references from selection and hover after node removal.
///
/// Node removal is authoritative: afterwards neither the selection nor the
/// hover slot names an id the lookup does not contain.
pub fn reconcile_removed(
    selection: &mut SelectionState,
    hover: &mut Option<NodeId>,
    lookup: &dyn NodeLookup,
) -> ReconcileOutcome {
    let deselected = selection.retain_present(lookup);
    let hover_cleared = hover
        .as_ref()
        .is_some_and(|id| !lookup.contains_node(id.as_str()));
    if hover_cleared {
        *hover = None;
    }
    ReconcileOutcome {
        deselected,
        hover_cleared,
    }
}
