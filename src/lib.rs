// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! TabTune - per-page audio adjustment core.
//!
//! Models the pipeline behind a browser-popup audio utility: discover
//! media elements across a page's frames, resolve the gain that should
//! apply (global default vs. per-domain override), and mutate each
//! element's audio graph (gain, pan, mono downmix, channel flip) through
//! an execute-in-frame transport. Graph construction is idempotent and
//! routing changes always fully disconnect before reconnecting.
//!
//! The obvious entry point is [`session::PopupSession`], driven against
//! any [`transport::FrameTransport`]; [`host::PageHost`] is the
//! in-process implementation.

pub mod audio;
pub mod controller;
pub mod host;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod store;
pub mod transport;

pub use tabtune_proto as proto;

pub use controller::GraphController;
pub use registry::{ElementRegistry, FrameMap, TrackedElement};
pub use resolver::{domain_from_url, GlobalSettings, UNKNOWN_DOMAIN};
pub use session::{PopupSession, SessionError};
pub use store::{FileStore, MemoryStore, SettingsStore, StoreError, SETTINGS_KEY};
pub use tabtune_proto::{
    ElementId, ElementKind, ElementProbe, FrameId, FrameOp, FrameReply, SettingsSnapshot,
    SoundSettings, TransportError,
};
pub use transport::FrameTransport;
