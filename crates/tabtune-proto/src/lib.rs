// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shared frame-operation and settings types for TabTune.
//!
//! This crate defines the message contract between the popup session
//! (controlling side) and a frame host (executing side): element
//! identifiers, partial sound settings, the operations a session may
//! dispatch into a frame, and the replies a frame host returns.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one page execution context (top document or sub-frame).
pub type FrameId = u32;

/// Stable identifier assigned to a media element on first discovery.
///
/// Persisted as a marker on the element itself, so repeated scans within
/// the same page load resolve to the same id. Random generation makes
/// collisions negligible.
pub type ElementId = Uuid;

/// Kind of media element hosting the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Audio,
    Video,
}

impl ElementKind {
    /// Parse a tag name into an element kind.
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// A partial settings update. Absent fields leave the corresponding
/// graph parameter untouched.
///
/// `flip` is a toggle request: `Some(true)` inverts the current channel
/// routing, `Some(false)` always restores the direct path. The other
/// fields are absolute values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    /// Linear volume multiplier, >= 0.
    pub gain: Option<f32>,
    /// Stereo balance in [-1, 1]; -1 = full left, 1 = full right.
    pub pan: Option<f32>,
    /// Collapse output to a single channel.
    pub mono: Option<bool>,
    /// Toggle the left/right channel exchange.
    pub flip: Option<bool>,
}

impl SoundSettings {
    /// Update carrying only a gain value. Negative input is clamped to 0.
    pub fn gain(gain: f32) -> Self {
        Self {
            gain: Some(gain.max(0.0)),
            ..Self::default()
        }
    }

    /// Update carrying only a pan value, clamped to [-1, 1].
    ///
    /// Clamping happens here, at the construction boundary: an
    /// out-of-range value can never reach a graph through this type's
    /// constructors.
    pub fn pan(pan: f32) -> Self {
        Self {
            pan: Some(pan.clamp(-1.0, 1.0)),
            ..Self::default()
        }
    }

    /// Update carrying only a mono flag.
    pub fn mono(mono: bool) -> Self {
        Self {
            mono: Some(mono),
            ..Self::default()
        }
    }

    /// Update carrying only a flip toggle request.
    pub fn flip(flip: bool) -> Self {
        Self {
            flip: Some(flip),
            ..Self::default()
        }
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.gain.is_none() && self.pan.is_none() && self.mono.is_none() && self.flip.is_none()
    }

    /// Overlay `other` on top of `self`; fields present in `other` win.
    pub fn merged(&self, other: &Self) -> Self {
        Self {
            gain: other.gain.or(self.gain),
            pan: other.pan.or(self.pan),
            mono: other.mono.or(self.mono),
            flip: other.flip.or(self.flip),
        }
    }
}

/// Fully-resolved graph state, read back from the nodes themselves after
/// an apply. Pre-populates the popup controls on the next open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub gain: f32,
    pub pan: f32,
    pub mono: bool,
    pub flip: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            gain: 1.0,
            pan: 0.0,
            mono: false,
            flip: false,
        }
    }
}

/// One element reported by a frame's discovery scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementProbe {
    /// Stable marker id (assigned during the scan if absent).
    pub id: ElementId,
    pub kind: ElementKind,
    /// Heuristic playing/paused status at scan time.
    pub playing: bool,
    /// Last-known graph state, present once a graph has been built.
    pub snapshot: Option<SettingsSnapshot>,
}

/// An operation dispatched into a frame context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameOp {
    /// Scan the frame for media elements, tagging any that lack a marker.
    Discover,
    /// Ensure a graph exists for the element and apply the given fields.
    Apply {
        element: ElementId,
        settings: SoundSettings,
    },
    /// Read the element's current graph state without mutating it.
    ReadBack { element: ElementId },
}

/// Reply to a [`FrameOp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameReply {
    /// Discovery result.
    Elements(Vec<ElementProbe>),
    /// State read back after an apply.
    Applied(SettingsSnapshot),
    /// State read back without mutation.
    State(SettingsSnapshot),
}

/// Failures crossing the frame transport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The frame rejected the operation (cross-origin or torn down).
    #[error("Frame unreachable: {0}")]
    FrameUnreachable(FrameId),
    /// The element vanished between discovery and application.
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    /// The frame answered with a reply the operation does not expect.
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_clamped_to_zero() {
        let s = SoundSettings::gain(-0.5);
        assert_eq!(s.gain, Some(0.0));
        assert!(s.pan.is_none());
    }

    #[test]
    fn test_pan_clamped_to_range() {
        assert_eq!(SoundSettings::pan(-3.0).pan, Some(-1.0));
        assert_eq!(SoundSettings::pan(0.25).pan, Some(0.25));
        assert_eq!(SoundSettings::pan(7.0).pan, Some(1.0));
    }

    #[test]
    fn test_empty_and_merged() {
        assert!(SoundSettings::default().is_empty());

        let base = SoundSettings::gain(1.5);
        let update = SoundSettings::pan(-0.5);
        let merged = base.merged(&update);
        assert_eq!(merged.gain, Some(1.5));
        assert_eq!(merged.pan, Some(-0.5));
        assert!(merged.mono.is_none());
    }

    #[test]
    fn test_element_kind_from_tag() {
        assert_eq!(ElementKind::from_tag("VIDEO"), Some(ElementKind::Video));
        assert_eq!(ElementKind::from_tag("audio"), Some(ElementKind::Audio));
        assert_eq!(ElementKind::from_tag("iframe"), None);
    }

    #[test]
    fn test_frame_op_serde() {
        let op = FrameOp::Apply {
            element: Uuid::new_v4(),
            settings: SoundSettings::mono(true),
        };
        let json = serde_json::to_string(&op).unwrap();
        let back: FrameOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
