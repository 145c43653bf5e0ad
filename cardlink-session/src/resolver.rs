//! Action resolution and execution.
//!
//! Given a target card and a payload, [`ActionResolver::resolve`] decides
//! what a drop means: run exactly one action, ask the user to confirm it,
//! or ask the user to pick one of several. Resolution is a pure function
//! of the registered configuration; [`ActionResolver::execute`] is the only
//! place a handler runs. Every drag state change made here is keyed by the
//! gesture that owns the session, so a late handler or a stale prompt
//! answer cannot touch a newer gesture.

use crate::error::{panic_message, InteractionError, InteractionResult};
use crate::registry::CardRegistry;
use crate::session::ensure_gesture;
use crate::state::{DragStatePatch, SessionPhase};
use cardlink_model::{ActionResult, AvailableAction};
use cardlink_types::{CardId, DragPayload, GestureId};
use futures::FutureExt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Outcome of resolving a drop.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Exactly one action, no confirmation needed.
    Execute(AvailableAction),
    /// Exactly one action that must be confirmed first.
    ConfirmationRequired {
        action: AvailableAction,
        message: Option<String>,
    },
    /// Several candidates; the caller re-invokes with an explicit id.
    SelectionRequired(Vec<AvailableAction>),
}

/// Discriminant of [`Resolution`], for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    Execute,
    Confirm,
    Choose,
}

impl Resolution {
    #[must_use]
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Self::Execute(_) => ResolutionKind::Execute,
            Self::ConfirmationRequired { .. } => ResolutionKind::Confirm,
            Self::SelectionRequired(_) => ResolutionKind::Choose,
        }
    }

    /// Selection keys of the actions involved, in order.
    #[must_use]
    pub fn action_keys(&self) -> Vec<String> {
        match self {
            Self::Execute(action) | Self::ConfirmationRequired { action, .. } => {
                vec![action.selection_key()]
            }
            Self::SelectionRequired(actions) => {
                actions.iter().map(AvailableAction::selection_key).collect()
            }
        }
    }

    /// Drag state change that publishes this resolution.
    pub(crate) fn phase_patch(&self) -> DragStatePatch {
        let patch = DragStatePatch::new().with_dragging(false);
        match self {
            Self::Execute(_) => patch.with_phase(SessionPhase::Executing),
            Self::ConfirmationRequired { action, .. } => patch
                .with_phase(SessionPhase::AwaitingConfirmation)
                .with_available_actions(vec![action.clone()]),
            Self::SelectionRequired(actions) => patch
                .with_phase(SessionPhase::AwaitingChoice)
                .with_available_actions(actions.clone()),
        }
    }
}

/// Result of [`ActionResolver::drop_on`].
#[derive(Debug, Clone)]
pub enum DropResult {
    Executed(ActionResult),
    ConfirmationRequired {
        action: AvailableAction,
        message: Option<String>,
    },
    SelectionRequired(Vec<AvailableAction>),
}

/// Notification sent after every handler run.
#[derive(Debug, Clone)]
pub struct ActionExecuted {
    pub card_id: CardId,
    pub action_id: String,
    pub selection_key: String,
    pub result: ActionResult,
}

/// Receives [`ActionExecuted`] notifications.
pub trait ActionObserver: Send + Sync {
    fn action_executed(&self, event: &ActionExecuted);
}

impl<F> ActionObserver for F
where
    F: Fn(&ActionExecuted) + Send + Sync,
{
    fn action_executed(&self, event: &ActionExecuted) {
        self(event)
    }
}

pub struct ActionResolver {
    registry: Arc<CardRegistry>,
    observers: Mutex<Vec<Arc<dyn ActionObserver>>>,
}

impl ActionResolver {
    pub fn new(registry: Arc<CardRegistry>) -> Self {
        Self {
            registry,
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Arc<CardRegistry> {
        &self.registry
    }

    pub fn subscribe_executed(&self, observer: impl ActionObserver + 'static) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(observer));
    }

    /// Decides what dropping `payload` on `target` means.
    ///
    /// With `explicit` set, only the matching action is considered. It may
    /// be given as a bare action id or as a `"<cardId>-<actionId>"`
    /// selection key, and must be a non-disabled action of a zone that
    /// accepts the payload. When two accepting zones expose the same action
    /// id, the first zone wins.
    pub fn resolve(
        &self,
        target: &CardId,
        payload: &DragPayload,
        explicit: Option<&str>,
    ) -> InteractionResult<Resolution> {
        if let Some(id) = explicit {
            return self.find_explicit(target, payload, id).map(Self::gate);
        }

        let mut actions = self.registry.get_available_actions(target.as_str(), payload);
        match actions.len() {
            0 => Err(InteractionError::NoActionAvailable {
                card_id: target.clone(),
                action_id: None,
            }),
            1 => Ok(Self::gate(actions.remove(0))),
            _ => Ok(Resolution::SelectionRequired(actions)),
        }
    }

    fn find_explicit(
        &self,
        target: &CardId,
        payload: &DragPayload,
        id: &str,
    ) -> InteractionResult<AvailableAction> {
        self.registry
            .get_available_actions(target.as_str(), payload)
            .into_iter()
            .find(|a| a.action_id() == id || a.selection_key() == id)
            .ok_or_else(|| InteractionError::NoActionAvailable {
                card_id: target.clone(),
                action_id: Some(id.to_string()),
            })
    }

    fn gate(action: AvailableAction) -> Resolution {
        if action.action.requires_confirmation {
            let message = action.action.confirmation_message.clone();
            Resolution::ConfirmationRequired { action, message }
        } else {
            Resolution::Execute(action)
        }
    }

    /// Runs the action's handler. Errors and panics become a failed
    /// [`ActionResult`].
    ///
    /// With `gesture` set, the handler only runs while that gesture owns
    /// an active session; the session moves to `Executing` for the
    /// duration and is reset afterwards unless another gesture has taken
    /// over by then. With `None` the drag state is left alone.
    pub async fn execute(
        &self,
        gesture: Option<GestureId>,
        action: &AvailableAction,
        payload: &DragPayload,
    ) -> InteractionResult<ActionResult> {
        self.enter(
            gesture,
            DragStatePatch::new()
                .with_phase(SessionPhase::Executing)
                .with_dragging(false),
            SessionPhase::is_active,
        )?;
        debug!(
            card_id = %action.card_id,
            action_id = %action.action_id(),
            "Executing action"
        );

        let outcome = AssertUnwindSafe(action.handler().execute(payload))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(result)) => {
                info!(
                    card_id = %action.card_id,
                    action_id = %action.action_id(),
                    success = result.success,
                    "Action finished"
                );
                result
            }
            Ok(Err(e)) => {
                warn!(
                    card_id = %action.card_id,
                    action_id = %action.action_id(),
                    "Action handler failed: {:#}",
                    e
                );
                ActionResult::failed(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    card_id = %action.card_id,
                    action_id = %action.action_id(),
                    "Action handler panicked: {}",
                    message
                );
                ActionResult::failed(InteractionError::Handler(message).to_string())
            }
        };

        self.finish(gesture);
        self.notify(&ActionExecuted {
            card_id: action.card_id.clone(),
            action_id: action.action_id().to_string(),
            selection_key: action.selection_key(),
            result: result.clone(),
        });
        Ok(result)
    }

    /// Executes a resolution that needs no further input. Confirmation and
    /// selection are handed back to the caller and published on the drag
    /// state of `gesture`.
    pub async fn run(
        &self,
        gesture: Option<GestureId>,
        resolution: Resolution,
        payload: &DragPayload,
    ) -> InteractionResult<DropResult> {
        let patch = resolution.phase_patch();
        match resolution {
            Resolution::Execute(action) => Ok(DropResult::Executed(
                self.execute(gesture, &action, payload).await?,
            )),
            Resolution::ConfirmationRequired { action, message } => {
                self.enter(gesture, patch, SessionPhase::is_active)?;
                Ok(DropResult::ConfirmationRequired { action, message })
            }
            Resolution::SelectionRequired(actions) => {
                self.enter(gesture, patch, SessionPhase::is_active)?;
                Ok(DropResult::SelectionRequired(actions))
            }
        }
    }

    /// Resolves and, when possible, executes a drop in one step. A drop with
    /// no eligible action resets the session of `gesture` before the error
    /// is returned.
    pub async fn drop_on(
        &self,
        gesture: Option<GestureId>,
        target: &CardId,
        payload: &DragPayload,
        explicit: Option<&str>,
    ) -> InteractionResult<DropResult> {
        match self.resolve(target, payload, explicit) {
            Ok(resolution) => self.run(gesture, resolution, payload).await,
            Err(e) => {
                debug!(card_id = %target, "Drop resolved to nothing: {}", e);
                self.finish(gesture);
                Err(e)
            }
        }
    }

    /// Executes an action the user confirmed, skipping the confirmation gate.
    ///
    /// With `gesture` set, that gesture must be waiting for a confirmation
    /// or a choice; otherwise nothing runs and `InactiveGesture` is returned.
    pub async fn confirm(
        &self,
        gesture: Option<GestureId>,
        target: &CardId,
        payload: &DragPayload,
        action_id: &str,
    ) -> InteractionResult<ActionResult> {
        self.enter(gesture, DragStatePatch::new(), SessionPhase::is_awaiting_input)?;
        let action = match self.find_explicit(target, payload, action_id) {
            Ok(action) => action,
            Err(e) => {
                self.finish(gesture);
                return Err(e);
            }
        };
        self.execute(gesture, &action, payload).await
    }

    /// Abandons the pending confirmation or choice of `gesture`. Returns
    /// false if that gesture is not waiting for one.
    pub fn dismiss(&self, gesture: GestureId) -> bool {
        let dismissed = self
            .registry
            .transition(|state| {
                ensure_gesture(state, gesture)?;
                if !state.drag.phase.is_awaiting_input() {
                    return Err(InteractionError::InactiveGesture(gesture));
                }
                Ok((DragStatePatch::reset(), ()))
            })
            .is_ok();
        if dismissed {
            debug!(gesture = %gesture, "Pending drop dismissed");
        }
        dismissed
    }

    /// Applies `patch` if `gesture` owns the session and its phase passes
    /// `allowed`.
    fn enter(
        &self,
        gesture: Option<GestureId>,
        patch: DragStatePatch,
        allowed: impl FnOnce(&SessionPhase) -> bool,
    ) -> InteractionResult<()> {
        let Some(gesture) = gesture else {
            return Ok(());
        };
        self.registry.transition(|state| {
            ensure_gesture(state, gesture)?;
            if !allowed(&state.drag.phase) {
                return Err(InteractionError::InactiveGesture(gesture));
            }
            Ok((patch, ()))
        })
    }

    /// Resets the session if `gesture` still owns it.
    fn finish(&self, gesture: Option<GestureId>) {
        let Some(gesture) = gesture else {
            return;
        };
        let reset = self.registry.transition(|state| {
            ensure_gesture(state, gesture)?;
            Ok((DragStatePatch::reset(), ()))
        });
        if reset.is_err() {
            debug!(gesture = %gesture, "Session moved on, reset skipped");
        }
    }

    fn notify(&self, event: &ActionExecuted) {
        let observers: Vec<Arc<dyn ActionObserver>> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| observer.action_executed(event))) {
                error!(
                    card_id = %event.card_id,
                    action_id = %event.action_id,
                    "Action observer panicked: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}
