//! Preferences persisted between runs.

use serde::{Deserialize, Serialize};

use super::app_config::ThemeMode;

/// Preferences saved between runs in `state.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Theme chosen with `carousel theme`, overriding the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,
}

impl StateConfig {
    /// Theme to use, given the configured default.
    #[must_use]
    pub fn effective_theme(&self, configured: ThemeMode) -> ThemeMode {
        self.theme.unwrap_or(configured)
    }
}
