// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sample rendering through an [`AudioGraph`].
//!
//! Makes the routing observable: a stereo buffer pushed through the graph
//! comes out with the gain, pan, flip, and downmix stages applied in
//! topology order. Used to verify channel content, not for playback.

use crate::audio::graph::AudioGraph;
use std::f32::consts::FRAC_PI_2;

/// Equal-power stereo pan law.
///
/// Returns the (left, right) stage gains for a pan value in [-1, 1].
/// At center the stage passes the signal through unchanged; at the
/// extremes the opposite channel is folded fully into the near one.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let x = if pan <= 0.0 { pan + 1.0 } else { pan };
    let theta = x * FRAC_PI_2;
    (theta.cos(), theta.sin())
}

/// Render a stereo buffer through the graph's current state.
///
/// Frames are `[left, right]` pairs. The output is always stereo; a mono
/// destination plays the downmixed signal on both speakers.
pub fn render(graph: &AudioGraph, input: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let gain = graph.gain();
    let pan = graph.pan();
    let (gain_l, gain_r) = pan_gains(pan);

    input
        .iter()
        .map(|frame| {
            // Gain stage.
            let l = frame[0] * gain;
            let r = frame[1] * gain;

            // Panner stage (stereo-input pan law).
            let (mut l, mut r) = if pan <= 0.0 {
                (l + r * gain_l, r * gain_r)
            } else {
                (l * gain_l, r + l * gain_r)
            };

            // Flip stage: splitter/merger with channels 0 and 1 crossed.
            if graph.is_flipped() {
                std::mem::swap(&mut l, &mut r);
            }

            // Destination: mono downmix when the channel count is 1.
            if graph.output_channels() == 1 {
                let m = (l + r) / 2.0;
                [m, m]
            } else {
                [l, r]
            }
        })
        .collect()
}
