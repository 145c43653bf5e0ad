//! Interaction settings, read from a TOML file such as:
//!
//! ```toml
//! enabled = true
//! fallback_window_ms = 150
//! cancel_on_pointer_leave = true
//!
//! [[interactions]]
//! source_type = "customer"
//! target_type = "calendar"
//! action_id = "create-appointment"
//! ```

use crate::error::InteractionResult;
use cardlink_model::InteractionBinding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default delay after pointer release before the fallback timer ends a
/// gesture that no other channel terminated.
pub const DEFAULT_FALLBACK_WINDOW_MS: u64 = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Initial value of the registry's global switch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_fallback_window_ms")]
    pub fallback_window_ms: u64,
    /// Whether the pointer leaving the workspace cancels the gesture.
    #[serde(default = "default_cancel_on_pointer_leave")]
    pub cancel_on_pointer_leave: bool,
    /// Declarative bindings registered when the registry is created.
    #[serde(default)]
    pub interactions: Vec<InteractionBinding>,
}

fn default_enabled() -> bool {
    true
}

fn default_fallback_window_ms() -> u64 {
    DEFAULT_FALLBACK_WINDOW_MS
}

fn default_cancel_on_pointer_leave() -> bool {
    true
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fallback_window_ms: default_fallback_window_ms(),
            cancel_on_pointer_leave: default_cancel_on_pointer_leave(),
            interactions: Vec::new(),
        }
    }
}

impl InteractionConfig {
    /// The fallback window as a [`Duration`].
    #[must_use]
    pub fn fallback_window(&self) -> Duration {
        Duration::from_millis(self.fallback_window_ms)
    }

    /// Parses a config from TOML text.
    pub fn from_toml_str(contents: &str) -> InteractionResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads a config file. A missing file yields the defaults; an
    /// unreadable or malformed one yields the defaults with a warning.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No interaction config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded interaction config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse interaction config {:?}: {}. Using defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read interaction config {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
