/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Live topology view model for a routing-mesh simulator.
//!
//! Simulator events arrive as JSON frames, are decoded in [`protocol`],
//! gated and routed by [`dispatch`], and applied by the
//! [`app::GraphCoordinator`], which keeps the node store and the physical,
//! tree, snake and geographic views in lockstep and mirrors every change to
//! a [`render::RenderSink`].

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod presentation;
pub mod protocol;
pub mod render;
pub mod stats;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{GraphCoordinator, UiIntent};
pub use config::SimviewConfig;
pub use dispatch::{ActivationState, DispatchOutcome, EventDispatcher};
pub use error::SimviewError;
pub use protocol::{SimEvent, decode_frame};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
