//! Core type definitions for cardlink.
//!
//! This crate defines the plugin-agnostic types that every other cardlink
//! crate speaks:
//! - Card and gesture identifiers
//! - The [`DragPayload`] carried by one drag gesture
//! - The [`DataTransfer`] medium a payload travels through between the
//!   source card and the drop target
//!
//! What a card actually renders, and what the entities inside a payload
//! mean, is entirely up to the card-owning UI modules.

mod ids;
mod payload;
mod transfer;

pub use ids::{CardId, GestureId};
pub use payload::{now_millis, DragPayload, DragPreview, PayloadData, SelectionMetadata};
pub use transfer::{DataTransfer, PAYLOAD_FORMAT, TEXT_FORMAT};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("transfer has no '{0}' representation")]
    MissingRepresentation(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
