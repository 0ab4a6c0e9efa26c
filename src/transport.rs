// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The execute-in-frame transport contract.
//!
//! The session side never holds a reference into a frame's execution
//! context; every mutation and probe crosses this boundary as a
//! [`FrameOp`] and comes back as a [`FrameReply`]. Any execution
//! mechanism that satisfies the contract can stand behind it; the crate
//! ships [`crate::host::PageHost`] as the in-process implementation.

use async_trait::async_trait;
use tabtune_proto::{FrameId, FrameOp, FrameReply, TransportError};

/// Executes operations inside a frame's context.
///
/// A frame that rejects execution (cross-origin restriction, teardown)
/// answers [`TransportError::FrameUnreachable`]; an operation that
/// targets a vanished element answers
/// [`TransportError::ElementNotFound`]. Both are local to the one
/// operation; callers running batches continue with the rest.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    async fn execute_in_frame(
        &self,
        frame: FrameId,
        op: FrameOp,
    ) -> Result<FrameReply, TransportError>;
}
