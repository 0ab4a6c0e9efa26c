// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! In-process page host.
//!
//! Stands where a real page would: a set of frame contexts, each holding
//! media elements with their audio graphs. Services [`FrameOp`]s through
//! the [`FrameTransport`] contract, so the session/registry/controller
//! stack runs against it unchanged. Frames can be marked restricted to
//! model cross-origin documents, and elements can be removed mid-session
//! to model navigation and DOM teardown.

pub mod element;

pub use element::MediaElement;

use crate::transport::FrameTransport;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tabtune_proto::{ElementId, FrameId, FrameOp, FrameReply, TransportError};
use tracing::debug;

#[derive(Debug, Default)]
struct FrameContext {
    /// A restricted frame rejects every operation, like a cross-origin
    /// document rejects script injection.
    restricted: bool,
    elements: Vec<MediaElement>,
}

/// A page: frame contexts keyed by frame id.
#[derive(Debug, Default)]
pub struct PageHost {
    frames: Mutex<HashMap<FrameId, FrameContext>>,
}

impl PageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty, scriptable frame.
    pub fn add_frame(&self, frame: FrameId) {
        self.frames.lock().entry(frame).or_default();
    }

    /// Add a frame that rejects all operations.
    pub fn add_restricted_frame(&self, frame: FrameId) {
        let mut frames = self.frames.lock();
        frames.entry(frame).or_default().restricted = true;
    }

    /// Place an element into a frame, creating the frame if needed.
    pub fn add_element(&self, frame: FrameId, element: MediaElement) {
        let mut frames = self.frames.lock();
        frames.entry(frame).or_default().elements.push(element);
    }

    /// Remove an element by its marker id, as a navigated-away or
    /// DOM-removed element would disappear. Returns whether one was
    /// removed.
    pub fn remove_element(&self, frame: FrameId, element: ElementId) -> bool {
        let mut frames = self.frames.lock();
        let Some(ctx) = frames.get_mut(&frame) else {
            return false;
        };
        let before = ctx.elements.len();
        ctx.elements.retain(|e| e.marker() != Some(element));
        before != ctx.elements.len()
    }

    /// Tear a whole frame down.
    pub fn remove_frame(&self, frame: FrameId) {
        self.frames.lock().remove(&frame);
    }

    /// All frame ids currently present, in ascending order. This is the
    /// page context a popup session scans.
    pub fn frame_ids(&self) -> Vec<FrameId> {
        let mut ids: Vec<FrameId> = self.frames.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Run a closure against one element, by marker id.
    fn with_element<R>(
        &self,
        frame: FrameId,
        element: ElementId,
        f: impl FnOnce(&mut MediaElement) -> R,
    ) -> Result<R, TransportError> {
        let mut frames = self.frames.lock();
        let ctx = frames
            .get_mut(&frame)
            .ok_or(TransportError::FrameUnreachable(frame))?;
        if ctx.restricted {
            return Err(TransportError::FrameUnreachable(frame));
        }
        let el = ctx
            .elements
            .iter_mut()
            .find(|e| e.marker() == Some(element))
            .ok_or(TransportError::ElementNotFound(element))?;
        Ok(f(el))
    }
}

#[async_trait]
impl FrameTransport for PageHost {
    async fn execute_in_frame(
        &self,
        frame: FrameId,
        op: FrameOp,
    ) -> Result<FrameReply, TransportError> {
        match op {
            FrameOp::Discover => {
                let mut frames = self.frames.lock();
                let ctx = frames
                    .get_mut(&frame)
                    .ok_or(TransportError::FrameUnreachable(frame))?;
                if ctx.restricted {
                    return Err(TransportError::FrameUnreachable(frame));
                }
                let probes = ctx.elements.iter_mut().map(MediaElement::probe).collect();
                Ok(FrameReply::Elements(probes))
            }
            FrameOp::Apply { element, settings } => {
                debug!("Applying {:?} to element {} in frame {}", settings, element, frame);
                let snapshot =
                    self.with_element(frame, element, |el| el.ensure_graph().apply(&settings))?;
                Ok(FrameReply::Applied(snapshot))
            }
            FrameOp::ReadBack { element } => {
                let snapshot = self.with_element(frame, element, |el| {
                    el.graph().map(|g| g.snapshot()).unwrap_or_default()
                })?;
                Ok(FrameReply::State(snapshot))
            }
        }
    }
}
