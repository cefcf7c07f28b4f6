/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Frame sources and the pump that feeds them to the dispatcher.
//!
//! The dispatcher is single-owner. Concurrent producers each hold a cloned
//! `Sender<String>`; the pump is the one consumer, so events are applied one
//! at a time in arrival order.

use std::io::BufRead;

use crossbeam_channel::{Receiver, RecvError, Sender, TryRecvError, unbounded};

use crate::dispatch::{DispatchOutcome, EventDispatcher};
use crate::error::SimviewError;

/// Yields raw frames until exhausted.
pub trait EventSource {
    /// `Ok(None)` means the source is finished.
    fn next_frame(&mut self) -> Result<Option<String>, SimviewError>;
}

/// Frames pushed from any number of producer threads.
pub struct ChannelSource {
    receiver: Receiver<String>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Fresh unbounded channel; clone the sender for each producer.
    pub fn channel() -> (Sender<String>, Self) {
        let (sender, receiver) = unbounded();
        (sender, Self::new(receiver))
    }

    /// Non-blocking variant: `None` when nothing is queued right now.
    pub fn try_next_frame(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl EventSource for ChannelSource {
    /// Blocks until a frame arrives or every sender is dropped.
    fn next_frame(&mut self) -> Result<Option<String>, SimviewError> {
        match self.receiver.recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvError) => Ok(None),
        }
    }
}

/// Newline-delimited JSON frames, e.g. a recorded event log. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<String>, SimviewError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpReport {
    pub applied: usize,
    pub discarded: usize,
}

impl PumpReport {
    pub fn total(&self) -> usize {
        self.applied + self.discarded
    }
}

/// Drain `source` into `dispatcher` until the source is finished.
///
/// Only source I/O failures stop the pump; bad frames are counted and skipped.
pub fn pump(
    dispatcher: &mut EventDispatcher,
    source: &mut dyn EventSource,
) -> Result<PumpReport, SimviewError> {
    let mut report = PumpReport::default();
    while let Some(frame) = source.next_frame()? {
        match dispatcher.dispatch_frame(&frame) {
            DispatchOutcome::Applied => report.applied += 1,
            DispatchOutcome::Discarded => report.discarded += 1,
        }
    }
    log::debug!(
        "event source finished: {} applied, {} discarded",
        report.applied,
        report.discarded
    );
    Ok(report)
}
