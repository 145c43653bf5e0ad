//! Configuration errors raised when a card is registered.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("card config is missing an id")]
    MissingId,

    #[error("card '{card_id}' is missing a type")]
    MissingType { card_id: String },

    #[error("card '{card_id}' declares drop zone '{zone_id}' more than once")]
    DuplicateZone { card_id: String, zone_id: String },

    #[error("drop zone '{zone_id}' maps key '{key}' to action '{action_id}'")]
    ActionKeyMismatch {
        zone_id: String,
        key: String,
        action_id: String,
    },
}
