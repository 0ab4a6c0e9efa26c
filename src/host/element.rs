// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A media element living inside a frame context.

use crate::audio::AudioGraph;
use tabtune_proto::{ElementId, ElementKind, ElementProbe};
use tracing::debug;
use uuid::Uuid;

/// One audio/video element as a frame host sees it.
///
/// The element owns its audio graph exclusively; the controlling side
/// only ever reaches it through frame operations. The graph slot doubles
/// as the initialization guard: it is filled at most once, on the first
/// settings application.
#[derive(Debug, Clone)]
pub struct MediaElement {
    kind: ElementKind,
    playing: bool,
    /// Destination channel count the element would report before any
    /// mono downmix.
    channels: u32,
    /// Stable identity marker, persisted on the element so repeated
    /// discovery scans within one page load recognize it.
    marker: Option<ElementId>,
    graph: Option<AudioGraph>,
}

impl MediaElement {
    pub fn new(kind: ElementKind, channels: u32) -> Self {
        Self {
            kind,
            playing: false,
            channels,
            marker: None,
            graph: None,
        }
    }

    /// Stereo `<audio>` element.
    pub fn audio() -> Self {
        Self::new(ElementKind::Audio, 2)
    }

    /// Stereo `<video>` element.
    pub fn video() -> Self {
        Self::new(ElementKind::Video, 2)
    }

    pub fn playing(mut self, playing: bool) -> Self {
        self.playing = playing;
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn marker(&self) -> Option<ElementId> {
        self.marker
    }

    pub fn graph(&self) -> Option<&AudioGraph> {
        self.graph.as_ref()
    }

    /// Assign a marker if the element lacks one, returning the stable id.
    pub(crate) fn tag(&mut self) -> ElementId {
        *self.marker.get_or_insert_with(|| {
            let id = Uuid::new_v4();
            debug!("Tagging {} element as {}", self.kind.as_str(), id);
            id
        })
    }

    /// Idempotent graph construction: builds on first call, then always
    /// hands back the same instance.
    pub(crate) fn ensure_graph(&mut self) -> &mut AudioGraph {
        self.graph.get_or_insert_with(|| AudioGraph::new(self.channels))
    }

    /// Discovery record for this element. Tags it if needed.
    pub(crate) fn probe(&mut self) -> ElementProbe {
        ElementProbe {
            id: self.tag(),
            kind: self.kind,
            playing: self.playing,
            snapshot: self.graph.as_ref().map(AudioGraph::snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabtune_proto::SoundSettings;

    #[test]
    fn test_tag_is_stable_across_scans() {
        let mut el = MediaElement::video();
        let first = el.tag();
        let second = el.tag();
        assert_eq!(first, second);
        assert_eq!(el.probe().id, first);
    }

    #[test]
    fn test_graph_constructed_exactly_once() {
        let mut el = MediaElement::audio();
        assert!(el.graph().is_none());

        el.ensure_graph().apply(&SoundSettings::gain(2.0));
        el.ensure_graph().apply(&SoundSettings::pan(0.5));

        // A rebuilt graph would have lost the gain from the first apply.
        let snap = el.graph().unwrap().snapshot();
        assert_eq!(snap.gain, 2.0);
        assert_eq!(snap.pan, 0.5);
    }

    #[test]
    fn test_probe_reports_untouched_element_without_snapshot() {
        let mut el = MediaElement::audio().playing(true);
        let probe = el.probe();
        assert!(probe.playing);
        assert!(probe.snapshot.is_none());
        assert_eq!(probe.kind, ElementKind::Audio);
    }
}
