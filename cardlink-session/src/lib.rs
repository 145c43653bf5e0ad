//! Cross-card drag-and-drop interactions.
//!
//! # Architecture
//!
//! - **Registry**: [`CardRegistry`] holds what each card can emit and
//!   accept, and the single authoritative [`DragSessionState`].
//! - **Session**: [`DragSession`] drives one gesture from pick-up to drop
//!   or cancellation.
//! - **Resolver**: [`ActionResolver`] turns a drop into auto-execution, a
//!   confirmation prompt or a choice, and runs the chosen handler.
//! - **Reconciler**: [`Reconciler`] folds redundant, racily ordered gesture
//!   signals into single transitions and releases the preview once.
//!
//! # Example
//!
//! ```
//! use cardlink_session::{ActionResolver, CardRegistry, DragSession, InteractionConfig};
//! use std::sync::Arc;
//!
//! let registry = CardRegistry::create(&InteractionConfig::default());
//! let resolver = Arc::new(ActionResolver::new(Arc::clone(&registry)));
//! let session = DragSession::new(resolver);
//! assert!(session.state().is_idle());
//! ```

mod config;
mod error;
mod fallback;
mod reconciler;
mod registry;
mod resolver;
mod session;
mod state;

pub use config::{InteractionConfig, DEFAULT_FALLBACK_WINDOW_MS};
pub use error::{InteractionError, InteractionResult};
pub use fallback::{FallbackTimer, SignalReceiver, SignalSender};
pub use reconciler::{
    Channel, GestureSignal, IgnoreReason, PreviewReleaser, Reconciled, Reconciler, TerminalCause,
    Termination,
};
pub use registry::{CardRegistry, DragStateListener, Subscription};
pub use resolver::{
    ActionExecuted, ActionObserver, ActionResolver, DropResult, Resolution, ResolutionKind,
};
pub use session::{CancelReason, DragSession, DropOutcome, DropRejection, PendingDrop};
pub use state::{DragSessionState, DragStatePatch, HoverState, SessionPhase};
