// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Element discovery and settings fan-out.
//!
//! The registry owns the frame map for one popup session: every media
//! element found across the page's frames, keyed by frame and stable
//! element id, together with the element's last-known settings snapshot.
//! The map is rebuilt on every discovery pass and never persisted.

use crate::controller::GraphController;
use crate::transport::FrameTransport;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tabtune_proto::{
    ElementId, ElementKind, ElementProbe, FrameId, FrameOp, FrameReply, SettingsSnapshot,
    SoundSettings, TransportError,
};
use tracing::{debug, warn};

/// One tracked element.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedElement {
    pub kind: ElementKind,
    /// Heuristic playing/paused status observed at discovery time.
    pub playing: bool,
    /// Synchronized cache of the graph's last read-back state. Updated
    /// after every successful apply; pre-populates popup controls.
    pub snapshot: SettingsSnapshot,
}

impl TrackedElement {
    fn from_probe(probe: &ElementProbe) -> Self {
        Self {
            kind: probe.kind,
            playing: probe.playing,
            snapshot: probe.snapshot.unwrap_or_default(),
        }
    }
}

/// Frame id -> element id -> tracked element.
pub type FrameMap = HashMap<FrameId, HashMap<ElementId, TrackedElement>>;

/// Tracks discovered media elements and fans settings out to them.
pub struct ElementRegistry {
    transport: Arc<dyn FrameTransport>,
    controller: GraphController,
    map: FrameMap,
}

impl ElementRegistry {
    pub fn new(transport: Arc<dyn FrameTransport>) -> Self {
        let controller = GraphController::new(transport.clone());
        Self {
            transport,
            controller,
            map: FrameMap::new(),
        }
    }

    /// Scan the given frames and rebuild the frame map.
    ///
    /// Scans run concurrently across frames. A frame that rejects the
    /// probe (cross-origin restriction, teardown) is skipped and logged;
    /// its absence is the only user-visible trace.
    pub async fn discover(&mut self, frames: &[FrameId]) {
        let transport = self.transport.clone();
        let scans = frames.iter().map(|&frame| {
            let transport = transport.clone();
            async move { (frame, transport.execute_in_frame(frame, FrameOp::Discover).await) }
        });

        self.map.clear();
        for (frame, result) in join_all(scans).await {
            match result {
                Ok(FrameReply::Elements(probes)) => {
                    debug!("Frame {}: {} media element(s)", frame, probes.len());
                    let elements = probes
                        .iter()
                        .map(|p| (p.id, TrackedElement::from_probe(p)))
                        .collect();
                    self.map.insert(frame, elements);
                }
                Ok(other) => {
                    warn!("Frame {}: unexpected discovery reply {:?}", frame, other);
                }
                Err(e) => {
                    warn!("Frame {}: skipped ({})", frame, e);
                }
            }
        }
    }

    pub fn frame_map(&self) -> &FrameMap {
        &self.map
    }

    /// Total number of tracked elements across all frames.
    pub fn element_count(&self) -> usize {
        self.map.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Apply the given partial settings to every tracked element.
    ///
    /// Applications are independent; an element that vanished since
    /// discovery is dropped from the map and the rest of the batch
    /// continues. Returns the number of elements updated.
    pub async fn broadcast(&mut self, settings: &SoundSettings) -> usize {
        let targets: Vec<(FrameId, ElementId)> = self
            .map
            .iter()
            .flat_map(|(&frame, elements)| elements.keys().map(move |&id| (frame, id)))
            .collect();

        let controller = self.controller.clone();
        let applies = targets.iter().map(|&(frame, element)| {
            let controller = controller.clone();
            let settings = *settings;
            async move { (frame, element, controller.apply(frame, element, &settings).await) }
        });

        let mut applied = 0;
        for (frame, element, result) in join_all(applies).await {
            match result {
                Ok(snapshot) => {
                    self.record_snapshot(frame, element, snapshot);
                    applied += 1;
                }
                Err(TransportError::ElementNotFound(_)) => {
                    warn!("Element {} vanished, dropping from registry", element);
                    self.forget(frame, element);
                }
                Err(e) => {
                    warn!("Frame {}: apply failed ({})", frame, e);
                }
            }
        }
        applied
    }

    /// Apply partial settings to a single element, updating its cached
    /// snapshot on success. A vanished element is dropped from the map
    /// before the error is returned.
    pub async fn apply_to_one(
        &mut self,
        frame: FrameId,
        element: ElementId,
        settings: &SoundSettings,
    ) -> Result<SettingsSnapshot, TransportError> {
        match self.controller.apply(frame, element, settings).await {
            Ok(snapshot) => {
                self.record_snapshot(frame, element, snapshot);
                Ok(snapshot)
            }
            Err(e) => {
                if matches!(e, TransportError::ElementNotFound(_)) {
                    self.forget(frame, element);
                }
                Err(e)
            }
        }
    }

    fn record_snapshot(&mut self, frame: FrameId, element: ElementId, snapshot: SettingsSnapshot) {
        if let Some(tracked) = self.map.get_mut(&frame).and_then(|m| m.get_mut(&element)) {
            tracked.snapshot = snapshot;
        }
    }

    fn forget(&mut self, frame: FrameId, element: ElementId) {
        if let Some(elements) = self.map.get_mut(&frame) {
            elements.remove(&element);
        }
    }
}
