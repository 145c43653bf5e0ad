//! Card configuration model for cardlink.
//!
//! Declares what each card can emit and accept:
//! - [`CardConfig`]: one card: id, type, optional [`DragConfig`], drop zones
//! - [`DropZoneConfig`]: an [`AcceptConfig`] plus the actions it offers
//! - [`ActionConfig`]: a labelled, possibly confirmation-gated [`CardAction`]
//! - [`InteractionBinding`]: declarative source-type → target-type wiring
//!
//! These types are data plus command objects. The registry in
//! `cardlink-session` stores them; UI modules build and register them.

mod action;
mod card;
mod error;
mod validator;
mod zone;

pub use action::{action_fn, ActionConfig, ActionResult, AvailableAction, CardAction, FnAction};
pub use card::{CardConfig, DragConfig, InteractionBinding};
pub use error::ConfigError;
pub use validator::{DropValidator, PayloadPredicate, Rejection, ValidationResult};
pub use zone::{AcceptConfig, DropZoneConfig};
