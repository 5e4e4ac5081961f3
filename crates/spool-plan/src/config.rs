// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Planner configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable that overrides [`PlannerConfig::sink_signature_cache`].
pub const SINK_CACHE_ENV: &str = "SPOOL_SINK_SIGNATURE_CACHE";

/// Settings read once when the planner is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Reuse reachability results across sinks with identical inbound filters.
    pub sink_signature_cache: bool,
}

impl PlannerConfig {
    /// Applies [`SINK_CACHE_ENV`] from the process environment, if set.
    pub fn with_env_override(self) -> Self {
        let value = std::env::var(SINK_CACHE_ENV).ok();
        self.with_override(value.as_deref())
    }

    /// Applies an override value (`1/true/yes/on` or `0/false/no/off`).
    ///
    /// Unrecognized values are logged and ignored.
    pub fn with_override(mut self, value: Option<&str>) -> Self {
        let Some(raw) = value else { return self };
        match parse_switch(raw) {
            Some(enabled) => self.sink_signature_cache = enabled,
            None => warn!(
                var = SINK_CACHE_ENV,
                value = raw,
                "ignoring unrecognized switch value"
            ),
        }
        self
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_disabled() {
        assert!(!PlannerConfig::default().sink_signature_cache);
        let parsed: PlannerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, PlannerConfig::default());
    }

    #[test]
    fn override_accepts_common_spellings() {
        let base = PlannerConfig::default();
        assert!(base.with_override(Some("ON")).sink_signature_cache);
        assert!(base.with_override(Some(" 1 ")).sink_signature_cache);
        let on = PlannerConfig {
            sink_signature_cache: true,
        };
        assert!(!on.with_override(Some("off")).sink_signature_cache);
        assert!(on.with_override(Some("maybe")).sink_signature_cache);
        assert!(on.with_override(None).sink_signature_cache);
    }
}
