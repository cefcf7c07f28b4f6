/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Node metadata and the four topology views.

pub mod node;
pub mod topology;

pub use node::{Announcement, Node, NodeId, NodeLookup, NodeStore, NodeType, PeerPort};
pub use topology::{EdgeView, TopologyKind, TopologyView, TopologyViews};
