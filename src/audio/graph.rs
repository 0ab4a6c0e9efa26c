// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-element audio processing graph.
//!
//! One [`AudioGraph`] is built per media element, once, and then mutated
//! in place for the rest of the element's life. The graph is a fixed set
//! of nodes (source, gain, panner, splitter, merger, destination) plus an
//! explicit connection list; routing changes work by fully disconnecting
//! the previous output stage and reconnecting the new one, so a stale or
//! duplicated edge can never double-route audio.

use std::collections::BTreeSet;
use tabtune_proto::{SettingsSnapshot, SoundSettings};
use tracing::debug;

/// Nodes of the fixed processing topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// Wraps the media element's output.
    Source,
    /// Scalar volume multiplier.
    Gain,
    /// Stereo balance (equal-power pan law).
    Panner,
    /// Splits a stereo signal into per-channel taps.
    Splitter,
    /// Merges per-channel taps back into a stereo signal.
    Merger,
    /// The element's output sink; owns the channel count.
    Destination,
}

/// A directed connection between two nodes.
///
/// Channel taps are only meaningful on the splitter's output side and the
/// merger's input side; everywhere else both are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub from: NodeKind,
    pub from_channel: Option<u32>,
    pub to: NodeKind,
    pub to_channel: Option<u32>,
}

impl Edge {
    /// Whole-signal connection between two nodes.
    pub fn direct(from: NodeKind, to: NodeKind) -> Self {
        Self {
            from,
            from_channel: None,
            to,
            to_channel: None,
        }
    }

    /// Single-channel connection from a splitter tap to a merger input.
    pub fn tapped(from: NodeKind, from_channel: u32, to: NodeKind, to_channel: u32) -> Self {
        Self {
            from,
            from_channel: Some(from_channel),
            to,
            to_channel: Some(to_channel),
        }
    }
}

/// Per-element graph state. Constructed at most once per element; the
/// hosting element keeps it behind an `Option` that acts as the
/// initialization guard.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioGraph {
    gain: f32,
    pan: f32,
    /// Destination channel count recorded at construction, before any
    /// mono downmix. Restored when mono is switched off.
    original_channels: u32,
    output_channels: u32,
    flipped: bool,
    edges: BTreeSet<Edge>,
}

impl AudioGraph {
    /// Build the graph and wire the default path
    /// source -> gain -> panner -> destination.
    pub fn new(output_channels: u32) -> Self {
        let mut edges = BTreeSet::new();
        edges.insert(Edge::direct(NodeKind::Source, NodeKind::Gain));
        edges.insert(Edge::direct(NodeKind::Gain, NodeKind::Panner));
        edges.insert(Edge::direct(NodeKind::Panner, NodeKind::Destination));

        debug!("Constructed audio graph ({} channels)", output_channels);

        Self {
            gain: 1.0,
            pan: 0.0,
            original_channels: output_channels,
            output_channels,
            flipped: false,
            edges,
        }
    }

    /// Set the gain node's scalar multiplier.
    pub fn set_gain(&mut self, gain: f32) {
        debug!("Setting graph gain to {:.2}", gain);
        self.gain = gain;
    }

    /// Set the panner's pan value. Callers clamp to [-1, 1] before the
    /// value reaches the graph; the graph does not re-validate.
    pub fn set_pan(&mut self, pan: f32) {
        debug!("Setting graph pan to {:.2}", pan);
        self.pan = pan;
    }

    /// Collapse the destination to one channel, or restore the channel
    /// count recorded at construction.
    pub fn set_mono(&mut self, mono: bool) {
        self.output_channels = if mono { 1 } else { self.original_channels };
        debug!("Destination channel count now {}", self.output_channels);
    }

    /// Rewire the output stage.
    ///
    /// A `true` request toggles the crossed routing (so two consecutive
    /// flip requests cancel out); `false` always restores the direct
    /// panner -> destination path.
    pub fn set_flip(&mut self, request: bool) {
        let flipped = request && !self.flipped;

        // Tear the whole output stage down before rebuilding it. A stale
        // edge left behind would route audio twice.
        self.disconnect_outputs(NodeKind::Panner);
        self.disconnect_outputs(NodeKind::Splitter);
        self.disconnect_outputs(NodeKind::Merger);

        if flipped {
            self.connect(Edge::direct(NodeKind::Panner, NodeKind::Splitter));
            self.connect(Edge::tapped(NodeKind::Splitter, 0, NodeKind::Merger, 1));
            self.connect(Edge::tapped(NodeKind::Splitter, 1, NodeKind::Merger, 0));
            self.connect(Edge::direct(NodeKind::Merger, NodeKind::Destination));
        } else {
            self.connect(Edge::direct(NodeKind::Panner, NodeKind::Destination));
        }

        self.flipped = flipped;
        debug!("Output routing now {}", if flipped { "crossed" } else { "direct" });
    }

    /// Apply exactly the fields present in the update, then read the
    /// resulting state back from the nodes.
    pub fn apply(&mut self, settings: &SoundSettings) -> SettingsSnapshot {
        if let Some(gain) = settings.gain {
            self.set_gain(gain);
        }
        if let Some(pan) = settings.pan {
            self.set_pan(pan);
        }
        if let Some(mono) = settings.mono {
            self.set_mono(mono);
        }
        if let Some(flip) = settings.flip {
            self.set_flip(flip);
        }
        self.snapshot()
    }

    /// Read the graph's actual current state back from the nodes. This is
    /// the element's last-known settings record, never an echo of an
    /// input update.
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            gain: self.gain,
            pan: self.pan,
            mono: self.output_channels == 1,
            flip: self.flipped,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn original_channels(&self) -> u32 {
        self.original_channels
    }

    pub fn output_channels(&self) -> u32 {
        self.output_channels
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Current connection list.
    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    fn connect(&mut self, edge: Edge) {
        let inserted = self.edges.insert(edge);
        debug_assert!(inserted, "duplicate connection: {:?}", edge);
    }

    fn disconnect_outputs(&mut self, node: NodeKind) {
        self.edges.retain(|e| e.from != node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_edges() -> BTreeSet<Edge> {
        [
            Edge::direct(NodeKind::Source, NodeKind::Gain),
            Edge::direct(NodeKind::Gain, NodeKind::Panner),
            Edge::direct(NodeKind::Panner, NodeKind::Destination),
        ]
        .into_iter()
        .collect()
    }

    fn crossed_edges() -> BTreeSet<Edge> {
        [
            Edge::direct(NodeKind::Source, NodeKind::Gain),
            Edge::direct(NodeKind::Gain, NodeKind::Panner),
            Edge::direct(NodeKind::Panner, NodeKind::Splitter),
            Edge::tapped(NodeKind::Splitter, 0, NodeKind::Merger, 1),
            Edge::tapped(NodeKind::Splitter, 1, NodeKind::Merger, 0),
            Edge::direct(NodeKind::Merger, NodeKind::Destination),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_initial_wiring() {
        let graph = AudioGraph::new(2);
        assert_eq!(graph.edges(), &direct_edges());
        assert_eq!(graph.snapshot(), SettingsSnapshot::default());
    }

    #[test]
    fn test_partial_apply_touches_only_present_fields() {
        let mut graph = AudioGraph::new(2);
        graph.apply(&SoundSettings::gain(2.0));

        let snap = graph.apply(&SoundSettings::pan(-0.5));
        assert_eq!(snap.gain, 2.0);
        assert_eq!(snap.pan, -0.5);
        assert!(!snap.mono);
        assert!(!snap.flip);
    }

    #[test]
    fn test_combined_apply() {
        let mut graph = AudioGraph::new(2);
        let update = SoundSettings {
            gain: Some(0.5),
            pan: Some(1.0),
            mono: Some(true),
            flip: Some(true),
        };
        let snap = graph.apply(&update);
        assert_eq!(snap.gain, 0.5);
        assert_eq!(snap.pan, 1.0);
        assert!(snap.mono);
        assert!(snap.flip);
        assert_eq!(graph.output_channels(), 1);
        assert_eq!(graph.edges(), &crossed_edges());
    }

    #[test]
    fn test_flip_routing_exact() {
        let mut graph = AudioGraph::new(2);
        graph.set_flip(true);
        assert_eq!(graph.edges(), &crossed_edges());
        assert!(graph.is_flipped());
    }

    #[test]
    fn test_flip_is_self_inverse() {
        let mut graph = AudioGraph::new(2);
        graph.apply(&SoundSettings::flip(true));
        graph.apply(&SoundSettings::flip(true));
        assert!(!graph.is_flipped());
        assert_eq!(graph.edges(), &direct_edges());
    }

    #[test]
    fn test_flip_false_always_restores_direct_path() {
        let mut graph = AudioGraph::new(2);
        graph.set_flip(false);
        assert_eq!(graph.edges(), &direct_edges());

        graph.set_flip(true);
        graph.set_flip(false);
        assert_eq!(graph.edges(), &direct_edges());
        assert!(!graph.is_flipped());
    }

    #[test]
    fn test_mono_restores_original_channel_count() {
        let mut graph = AudioGraph::new(6);
        graph.set_mono(true);
        assert_eq!(graph.output_channels(), 1);
        graph.set_mono(false);
        assert_eq!(graph.output_channels(), 6);
        assert_eq!(graph.original_channels(), 6);
    }

    #[test]
    fn test_mono_survives_flip_rewire() {
        let mut graph = AudioGraph::new(2);
        graph.apply(&SoundSettings::mono(true));
        graph.apply(&SoundSettings::flip(true));
        assert_eq!(graph.output_channels(), 1);
        let snap = graph.snapshot();
        assert!(snap.mono);
        assert!(snap.flip);
    }

    #[test]
    fn test_snapshot_reads_back_from_nodes() {
        let mut graph = AudioGraph::new(2);
        // Clamping happens at the SoundSettings boundary; a constructor-made
        // update arrives pre-clamped and the snapshot reflects node state.
        let snap = graph.apply(&SoundSettings::pan(5.0));
        assert_eq!(snap.pan, 1.0);
        assert_eq!(graph.pan(), 1.0);
    }
}
