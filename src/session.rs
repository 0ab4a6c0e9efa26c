// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One popup session, open to close.
//!
//! Everything that used to be ambient state (the current page, the live
//! frame map, the loaded settings) lives on one object created when the
//! popup opens and discarded when it closes. Page-level tweaks made
//! through the session are ephemeral; only explicit save/clear actions
//! reach the settings store.

use crate::registry::{ElementRegistry, FrameMap};
use crate::resolver::{domain_from_url, GlobalSettings};
use crate::store::{SettingsStore, StoreError};
use crate::transport::FrameTransport;
use std::sync::Arc;
use tabtune_proto::{ElementId, FrameId, SettingsSnapshot, SoundSettings, TransportError};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A live popup session against one page.
pub struct PopupSession {
    domain: String,
    settings: GlobalSettings,
    registry: ElementRegistry,
    store: Arc<dyn SettingsStore>,
}

impl PopupSession {
    /// Open a session: resolve the page's domain, load settings (falling
    /// back to defaults when the store cannot be read), and discover
    /// media elements across the given frames.
    pub async fn open(
        page_url: &str,
        frames: &[FrameId],
        transport: Arc<dyn FrameTransport>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let domain = domain_from_url(page_url);
        let settings = match store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => GlobalSettings::default(),
            Err(e) => {
                warn!("Settings unreadable ({}), using defaults", e);
                GlobalSettings::default()
            }
        };

        let mut registry = ElementRegistry::new(transport);
        registry.discover(frames).await;
        info!(
            "Session open on {}: {} element(s), effective gain {:.2}",
            domain,
            registry.element_count(),
            settings.effective_gain(&domain)
        );

        Self {
            domain,
            settings,
            registry,
            store,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn global_settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn frame_map(&self) -> &FrameMap {
        self.registry.frame_map()
    }

    /// Whether the page has any controllable media at all. When false the
    /// popup shows a plain informational message.
    pub fn has_media(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Gain resolved for this page's domain.
    pub fn effective_gain(&self) -> f32 {
        self.settings.effective_gain(&self.domain)
    }

    /// Re-scan the page, rebuilding the frame map.
    pub async fn rescan(&mut self, frames: &[FrameId]) {
        self.registry.discover(frames).await;
    }

    /// Apply a partial update to every tracked element. Returns how many
    /// elements were updated.
    pub async fn apply(&mut self, settings: &SoundSettings) -> usize {
        self.registry.broadcast(settings).await
    }

    /// Apply the resolved effective gain to every tracked element (the
    /// popup-open flow: discover, resolve, fan out).
    pub async fn apply_effective_gain(&mut self) -> usize {
        let gain = self.effective_gain();
        self.apply(&SoundSettings::gain(gain)).await
    }

    pub async fn set_gain(&mut self, gain: f32) -> usize {
        self.apply(&SoundSettings::gain(gain)).await
    }

    pub async fn set_pan(&mut self, pan: f32) -> usize {
        self.apply(&SoundSettings::pan(pan)).await
    }

    pub async fn set_mono(&mut self, mono: bool) -> usize {
        self.apply(&SoundSettings::mono(mono)).await
    }

    /// Request a channel-flip toggle on every tracked element.
    pub async fn flip(&mut self) -> usize {
        self.apply(&SoundSettings::flip(true)).await
    }

    /// Apply a partial update to one element.
    pub async fn apply_to_one(
        &mut self,
        frame: FrameId,
        element: ElementId,
        settings: &SoundSettings,
    ) -> Result<SettingsSnapshot, SessionError> {
        Ok(self.registry.apply_to_one(frame, element, settings).await?)
    }

    /// Persist `gain` as this domain's override. The in-memory settings
    /// are updated even when the write fails; the error is logged and
    /// returned without blocking further interaction.
    pub fn save_domain_override(&mut self, gain: f32) -> Result<(), SessionError> {
        let domain = self.domain.clone();
        self.settings.set_override(&domain, gain);
        self.persist()
    }

    /// Remove this domain's override, if any, and persist.
    pub fn clear_domain_override(&mut self) -> Result<(), SessionError> {
        let domain = self.domain.clone();
        self.settings.clear_override(&domain);
        self.persist()
    }

    /// Change the global default gain and persist.
    pub fn save_global_gain(&mut self, gain: f32) -> Result<(), SessionError> {
        self.settings.global_gain = gain.max(0.0);
        self.persist()
    }

    fn persist(&self) -> Result<(), SessionError> {
        if let Err(e) = self.store.save(&self.settings) {
            warn!("Settings save failed: {}", e);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MediaElement, PageHost};
    use crate::store::MemoryStore;

    async fn open_session(host: &Arc<PageHost>, store: &Arc<MemoryStore>) -> PopupSession {
        PopupSession::open(
            "https://example.com/page",
            &host.frame_ids(),
            host.clone(),
            store.clone(),
        )
        .await
    }

    #[tokio::test]
    async fn test_open_resolves_domain_and_defaults() {
        let host = Arc::new(PageHost::new());
        host.add_frame(0);
        let store = Arc::new(MemoryStore::new());

        let session = open_session(&host, &store).await;
        assert_eq!(session.domain(), "example.com");
        assert_eq!(session.effective_gain(), 1.5);
        assert!(!session.has_media());
    }

    #[tokio::test]
    async fn test_override_save_and_clear_change_effective_gain() {
        let host = Arc::new(PageHost::new());
        host.add_element(0, MediaElement::video());
        let store = Arc::new(MemoryStore::new());

        let mut session = open_session(&host, &store).await;
        session.save_domain_override(2.0).unwrap();
        assert_eq!(session.effective_gain(), 2.0);

        session.clear_domain_override().unwrap();
        assert_eq!(session.effective_gain(), 1.5);
    }

    #[tokio::test]
    async fn test_saved_override_survives_into_next_session() {
        let host = Arc::new(PageHost::new());
        host.add_element(0, MediaElement::video());
        let store = Arc::new(MemoryStore::new());

        let mut session = open_session(&host, &store).await;
        session.save_domain_override(0.25).unwrap();
        drop(session);

        let reopened = open_session(&host, &store).await;
        assert_eq!(reopened.effective_gain(), 0.25);
    }

    #[tokio::test]
    async fn test_apply_effective_gain_fans_out() {
        let host = Arc::new(PageHost::new());
        host.add_element(0, MediaElement::video());
        host.add_element(1, MediaElement::audio());
        let store = Arc::new(MemoryStore::new());

        let mut session = open_session(&host, &store).await;
        session.save_domain_override(2.0).unwrap();
        let applied = session.apply_effective_gain().await;
        assert_eq!(applied, 2);
        for elements in session.frame_map().values() {
            for tracked in elements.values() {
                assert_eq!(tracked.snapshot.gain, 2.0);
            }
        }
    }

    #[tokio::test]
    async fn test_unparseable_page_url_uses_sentinel() {
        let host = Arc::new(PageHost::new());
        let store = Arc::new(MemoryStore::new());
        let mut session =
            PopupSession::open("not a url", &[], host.clone(), store.clone()).await;

        assert_eq!(session.domain(), crate::resolver::UNKNOWN_DOMAIN);
        // Saving on the sentinel domain changes nothing.
        session.save_domain_override(3.0).unwrap();
        assert_eq!(session.effective_gain(), 1.5);
    }
}
