/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::model::NodeId;

/// Errors surfaced by the synchronizer.
///
/// Event processing never propagates these to the transport: the dispatcher
/// logs them and keeps the stream going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimviewError {
    /// `add_node` on an id that is already present under the `Reject` policy.
    DuplicateNode(NodeId),
    /// A frame carried a kind tag this build does not understand.
    UnknownEventKind(u64),
    /// A frame was not valid JSON or did not match its kind's shape.
    Decode(String),
    Config(String),
    Io(String),
}

impl std::fmt::Display for SimviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimviewError::DuplicateNode(id) => write!(f, "node {id} already exists"),
            SimviewError::UnknownEventKind(kind) => write!(f, "unknown event kind {kind}"),
            SimviewError::Decode(e) => write!(f, "decode error: {e}"),
            SimviewError::Config(e) => write!(f, "config error: {e}"),
            SimviewError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for SimviewError {}

impl From<std::io::Error> for SimviewError {
    fn from(error: std::io::Error) -> Self {
        SimviewError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for SimviewError {
    fn from(error: serde_json::Error) -> Self {
        SimviewError::Decode(error.to_string())
    }
}
