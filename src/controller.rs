// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Client-side graph control.
//!
//! Issues apply/read-back operations into a frame and hands the read-back
//! snapshot to the caller. Graph construction is handled frame-side and
//! is idempotent, so the controller never has to know whether an element
//! has been touched before.

use crate::transport::FrameTransport;
use std::sync::Arc;
use tabtune_proto::{
    ElementId, FrameId, FrameOp, FrameReply, SettingsSnapshot, SoundSettings, TransportError,
};
use tracing::debug;

/// Applies partial settings to one element at a time through the
/// transport.
#[derive(Clone)]
pub struct GraphController {
    transport: Arc<dyn FrameTransport>,
}

impl GraphController {
    pub fn new(transport: Arc<dyn FrameTransport>) -> Self {
        Self { transport }
    }

    /// Ensure the element's graph exists and apply exactly the fields
    /// present in `settings`. Returns the state read back from the graph
    /// after the mutation.
    ///
    /// An empty update degenerates to a read-back, leaving the graph
    /// untouched.
    pub async fn apply(
        &self,
        frame: FrameId,
        element: ElementId,
        settings: &SoundSettings,
    ) -> Result<SettingsSnapshot, TransportError> {
        if settings.is_empty() {
            return self.read_back(frame, element).await;
        }

        debug!("Applying {:?} to {} (frame {})", settings, element, frame);
        let op = FrameOp::Apply {
            element,
            settings: *settings,
        };
        match self.transport.execute_in_frame(frame, op).await? {
            FrameReply::Applied(snapshot) => Ok(snapshot),
            other => Err(TransportError::Protocol(format!(
                "apply answered with {:?}",
                other
            ))),
        }
    }

    /// Read the element's current graph state without mutating it.
    pub async fn read_back(
        &self,
        frame: FrameId,
        element: ElementId,
    ) -> Result<SettingsSnapshot, TransportError> {
        let op = FrameOp::ReadBack { element };
        match self.transport.execute_in_frame(frame, op).await? {
            FrameReply::State(snapshot) => Ok(snapshot),
            other => Err(TransportError::Protocol(format!(
                "read-back answered with {:?}",
                other
            ))),
        }
    }
}
