//! Error types for the interaction layer.

use cardlink_model::ConfigError;
use cardlink_types::{CardId, GestureId};
use std::any::Any;
use thiserror::Error;

/// Result type for interaction operations.
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Errors that can occur while registering cards or driving a gesture.
///
/// Needing a choice or a confirmation is not an error; those come back as
/// [`Resolution`](crate::Resolution) variants.
#[derive(Debug, Error)]
pub enum InteractionError {
    /// Malformed card registration.
    #[error("invalid card configuration: {0}")]
    Config(#[from] ConfigError),

    /// The target has no eligible action for the payload.
    #[error("no action available on card '{card_id}'")]
    NoActionAvailable {
        card_id: CardId,
        action_id: Option<String>,
    },

    /// Gesture start refused by the global switch.
    #[error("drag interactions are disabled")]
    Disabled,

    /// Gesture start refused because another session is still running.
    #[error("a drag session is already active")]
    SessionActive { gesture: Option<GestureId> },

    /// The gesture is not (or no longer) the active session.
    #[error("gesture {0} is not the active drag session")]
    InactiveGesture(GestureId),

    #[error("invalid drag payload: {0}")]
    InvalidPayload(String),

    #[error("card registry has been disposed")]
    Disposed,

    #[error("transfer error: {0}")]
    Transfer(#[from] cardlink_types::Error),

    /// An action handler returned an error or panicked.
    #[error("action handler failed: {0}")]
    Handler(String),

    #[error("invalid interaction config: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

/// Best-effort text of a caught panic.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
