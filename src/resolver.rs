// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Settings precedence: global default vs. per-domain override.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Sentinel domain for pages whose URL cannot be parsed. Never matches a
/// stored override.
pub const UNKNOWN_DOMAIN: &str = "unknown";

fn default_global_gain() -> f32 {
    1.5
}

/// Persisted settings: the global gain default and per-domain overrides.
///
/// Read once at popup open, written only on explicit save/clear actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Gain applied on domains without an override.
    #[serde(default = "default_global_gain")]
    pub global_gain: f32,
    /// Domain -> gain. Keys unique, no ordering guarantee.
    #[serde(default)]
    pub domain_overrides: HashMap<String, f32>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            global_gain: default_global_gain(),
            domain_overrides: HashMap::new(),
        }
    }
}

impl GlobalSettings {
    /// Gain that should apply on `domain`: the domain's override when one
    /// is stored, otherwise the global default. The sentinel domain never
    /// matches an override.
    pub fn effective_gain(&self, domain: &str) -> f32 {
        if domain == UNKNOWN_DOMAIN {
            return self.global_gain;
        }
        self.domain_overrides
            .get(domain)
            .copied()
            .unwrap_or(self.global_gain)
    }

    /// Insert or overwrite the override for `domain`. Negative gain is
    /// clamped to 0. Refuses the sentinel domain.
    pub fn set_override(&mut self, domain: &str, gain: f32) {
        if domain == UNKNOWN_DOMAIN {
            debug!("Ignoring override for the sentinel domain");
            return;
        }
        self.domain_overrides.insert(domain.to_string(), gain.max(0.0));
    }

    /// Remove the override for `domain`. No-op when absent.
    pub fn clear_override(&mut self, domain: &str) {
        self.domain_overrides.remove(domain);
    }

    pub fn has_override(&self, domain: &str) -> bool {
        self.domain_overrides.contains_key(domain)
    }
}

/// Extract the override key from a page URL: the URL's host component,
/// or [`UNKNOWN_DOMAIN`] when the URL cannot be parsed or carries no
/// host (e.g. `about:blank`, `file:` URLs).
pub fn domain_from_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string()),
        Err(e) => {
            debug!("Unparseable page URL ({}), using sentinel domain", e);
            UNKNOWN_DOMAIN.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_global_gain() {
        let mut settings = GlobalSettings::default();
        settings.set_override("youtube.com", 2.0);

        assert_eq!(settings.effective_gain("youtube.com"), 2.0);
        assert_eq!(settings.effective_gain("netflix.com"), 1.5);
    }

    #[test]
    fn test_save_then_clear_round_trip() {
        let mut settings = GlobalSettings::default();
        assert_eq!(settings.effective_gain("example.com"), 1.5);

        settings.set_override("example.com", 2.0);
        assert_eq!(settings.effective_gain("example.com"), 2.0);

        settings.clear_override("example.com");
        assert_eq!(settings.effective_gain("example.com"), 1.5);
    }

    #[test]
    fn test_clear_absent_override_is_noop() {
        let mut settings = GlobalSettings::default();
        settings.clear_override("nowhere.example");
        assert!(settings.domain_overrides.is_empty());
    }

    #[test]
    fn test_override_gain_clamped_to_zero() {
        let mut settings = GlobalSettings::default();
        settings.set_override("example.com", -1.0);
        assert_eq!(settings.effective_gain("example.com"), 0.0);
    }

    #[test]
    fn test_sentinel_never_matches_an_override() {
        let mut settings = GlobalSettings::default();
        settings.set_override(UNKNOWN_DOMAIN, 3.0);
        assert!(!settings.has_override(UNKNOWN_DOMAIN));
        assert_eq!(settings.effective_gain(UNKNOWN_DOMAIN), 1.5);
    }

    #[test]
    fn test_domain_extraction() {
        assert_eq!(domain_from_url("https://www.youtube.com/watch?v=x"), "www.youtube.com");
        assert_eq!(domain_from_url("http://127.0.0.1:8080/"), "127.0.0.1");
        assert_eq!(domain_from_url("about:blank"), UNKNOWN_DOMAIN);
        assert_eq!(domain_from_url("not a url"), UNKNOWN_DOMAIN);
    }

    #[test]
    fn test_settings_toml_round_trip() {
        let mut settings = GlobalSettings::default();
        settings.set_override("example.com", 2.0);

        let text = toml::to_string_pretty(&settings).unwrap();
        let back: GlobalSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: GlobalSettings = toml::from_str("").unwrap();
        assert_eq!(settings.global_gain, 1.5);
        assert!(settings.domain_overrides.is_empty());
    }
}
