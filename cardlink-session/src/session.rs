//! The drag session state machine.
//!
//! A [`DragSession`] drives exactly one gesture at a time through
//! `Idle -> Dragging -> Hovering* -> (Executing | AwaitingConfirmation |
//! AwaitingChoice | Idle)`. Every transition is a check-and-set on the
//! registry's drag state, keyed by the gesture id handed out by
//! [`DragSession::begin`], so signals for a finished gesture cannot touch
//! the next one.

use crate::error::{InteractionError, InteractionResult};
use crate::registry::{CardRegistry, RegistryState};
use crate::resolver::{ActionResolver, DropResult, Resolution};
use crate::state::{DragSessionState, DragStatePatch, HoverState, SessionPhase};
use cardlink_types::{CardId, DataTransfer, DragPayload, GestureId};
use std::sync::Arc;
use tracing::{debug, info};

/// Why a gesture ended without a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    PointerLeave,
    Escape,
    Blur,
    /// The gesture source reported the end without a drop.
    End,
    FallbackTimeout,
    /// The session was reset by something other than the gesture's own
    /// signals, e.g. [`CardRegistry::reset_drag_state`].
    External,
}

/// Why a drop resolved to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropRejection {
    /// Released over no card.
    NoTarget,
    /// Released over the card it came from.
    SourceCard,
    NotAccepted(CardId),
    NoActionAvailable(CardId),
}

/// A drop that resolved to something the caller must act on.
#[derive(Debug, Clone)]
pub struct PendingDrop {
    pub gesture: GestureId,
    pub target: CardId,
    pub payload: Arc<DragPayload>,
    pub resolution: Resolution,
}

impl PendingDrop {
    /// Runs the action if it needs no further input. Pending confirmations
    /// and choices are returned as-is; the session already shows them.
    /// Fails with `InactiveGesture` if the gesture no longer owns the
    /// session, in which case the handler does not run.
    pub async fn run(self, resolver: &ActionResolver) -> InteractionResult<DropResult> {
        match self.resolution {
            Resolution::Execute(action) => Ok(DropResult::Executed(
                resolver
                    .execute(Some(self.gesture), &action, &self.payload)
                    .await?,
            )),
            Resolution::ConfirmationRequired { action, message } => {
                Ok(DropResult::ConfirmationRequired { action, message })
            }
            Resolution::SelectionRequired(actions) => Ok(DropResult::SelectionRequired(actions)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DropOutcome {
    Resolved(PendingDrop),
    /// The session has already been reset.
    Rejected(DropRejection),
}

impl DropOutcome {
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

pub struct DragSession {
    registry: Arc<CardRegistry>,
    resolver: Arc<ActionResolver>,
}

impl DragSession {
    pub fn new(resolver: Arc<ActionResolver>) -> Self {
        Self {
            registry: Arc::clone(resolver.registry()),
            resolver,
        }
    }

    pub fn registry(&self) -> &Arc<CardRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &Arc<ActionResolver> {
        &self.resolver
    }

    pub fn state(&self) -> DragSessionState {
        self.registry.get_drag_state()
    }

    pub fn active_gesture(&self) -> Option<GestureId> {
        self.registry.get_drag_state().gesture
    }

    /// Starts a gesture carrying `payload`.
    ///
    /// Fails if the registry is disposed or disabled, if another session is
    /// still running, or if the payload has no source card or data type.
    pub fn begin(&self, payload: DragPayload) -> InteractionResult<GestureId> {
        payload
            .validate()
            .map_err(|e| InteractionError::InvalidPayload(e.to_string()))?;

        let gesture = GestureId::new();
        let source = payload.source_card_id.clone();
        let data_type = payload.source_data_type.clone();
        let payload = Arc::new(payload);

        self.registry.transition(|state| {
            if state.disposed {
                return Err(InteractionError::Disposed);
            }
            if !state.enabled {
                return Err(InteractionError::Disabled);
            }
            if state.drag.phase.is_active() || state.drag.is_dragging {
                return Err(InteractionError::SessionActive {
                    gesture: state.drag.gesture,
                });
            }
            let patch = DragStatePatch::reset()
                .with_gesture(Some(gesture))
                .with_phase(SessionPhase::Dragging)
                .with_dragging(true)
                .with_payload(Some(payload));
            Ok((patch, ()))
        })?;

        info!(
            gesture = %gesture,
            source_card_id = %source,
            data_type = %data_type,
            "Drag session started"
        );
        Ok(gesture)
    }

    /// Starts a gesture from the structured form of a transfer medium.
    pub fn begin_from_transfer(&self, transfer: &DataTransfer) -> InteractionResult<GestureId> {
        let payload = transfer.read_payload()?;
        self.begin(payload)
    }

    /// Re-evaluates the element under the pointer. Acceptance is computed
    /// fresh on every call.
    pub fn hover(&self, gesture: GestureId, element: Option<&CardId>) -> InteractionResult<HoverState> {
        let current = self.registry.get_drag_state();
        ensure_pointer_phase(&current, gesture)?;
        let payload = current
            .payload
            .ok_or_else(|| InteractionError::InvalidPayload("session has no payload".into()))?;

        let (hover, target, actions) = match element {
            None => (HoverState::None, None, Vec::new()),
            Some(id) if *id == payload.source_card_id => (HoverState::None, None, Vec::new()),
            Some(id) if self.registry.can_card_accept(id.as_str(), &payload) => (
                HoverState::Accepting,
                Some(id.clone()),
                self.registry.get_available_actions(id.as_str(), &payload),
            ),
            Some(_) => (HoverState::Rejecting, None, Vec::new()),
        };

        self.registry.transition(|state| {
            ensure_pointer_phase(&state.drag, gesture)?;
            let patch = DragStatePatch::new()
                .with_phase(SessionPhase::Hovering(hover))
                .with_drop_target(target.clone())
                .with_highlight(target)
                .with_available_actions(actions);
            Ok((patch, hover))
        })
    }

    /// Ends the pointer part of a gesture over `target`.
    ///
    /// `payload` overrides the payload retained at [`DragSession::begin`];
    /// pass the structured transfer payload here when one was delivered.
    /// Rejections reset the session immediately. A resolved drop moves the
    /// session to the phase matching its [`Resolution`]; the caller then
    /// completes it through the [`ActionResolver`].
    pub fn drop(
        &self,
        gesture: GestureId,
        target: Option<&CardId>,
        payload: Option<Arc<DragPayload>>,
    ) -> InteractionResult<DropOutcome> {
        let current = self.registry.get_drag_state();
        ensure_pointer_phase(&current, gesture)?;
        let payload = payload
            .or(current.payload)
            .ok_or_else(|| InteractionError::InvalidPayload("session has no payload".into()))?;

        let target = match self.classify_target(target, &payload) {
            Ok(target) => target,
            Err(rejection) => return self.reject(gesture, rejection),
        };

        let resolution = match self.resolver.resolve(&target, &payload, None) {
            Ok(resolution) => resolution,
            Err(InteractionError::NoActionAvailable { .. }) => {
                return self.reject(gesture, DropRejection::NoActionAvailable(target));
            }
            Err(e) => return Err(e),
        };

        let patch = resolution
            .phase_patch()
            .with_drop_target(Some(target.clone()))
            .with_highlight(None)
            .with_payload(Some(Arc::clone(&payload)));
        self.registry.transition(|state| {
            ensure_pointer_phase(&state.drag, gesture)?;
            Ok((patch, ()))
        })?;

        debug!(
            gesture = %gesture,
            target = %target,
            resolution = ?resolution.kind(),
            "Drop resolved"
        );
        Ok(DropOutcome::Resolved(PendingDrop {
            gesture,
            target,
            payload,
            resolution,
        }))
    }

    fn classify_target(
        &self,
        target: Option<&CardId>,
        payload: &DragPayload,
    ) -> Result<CardId, DropRejection> {
        let Some(target) = target else {
            return Err(DropRejection::NoTarget);
        };
        if *target == payload.source_card_id {
            return Err(DropRejection::SourceCard);
        }
        if !self.registry.can_card_accept(target.as_str(), payload) {
            return Err(DropRejection::NotAccepted(target.clone()));
        }
        Ok(target.clone())
    }

    fn reject(&self, gesture: GestureId, rejection: DropRejection) -> InteractionResult<DropOutcome> {
        self.registry.transition(|state| {
            ensure_gesture(state, gesture)?;
            Ok((DragStatePatch::reset(), ()))
        })?;
        debug!(gesture = %gesture, rejection = ?rejection, "Drop rejected");
        Ok(DropOutcome::Rejected(rejection))
    }

    /// Abandons the gesture. Returns false if it was not the active one,
    /// or if its action handler is already running; the handler's own
    /// completion ends that session.
    pub fn cancel(&self, gesture: GestureId, reason: CancelReason) -> bool {
        let result = self.registry.transition(|state| {
            ensure_gesture(state, gesture)?;
            if state.drag.phase == SessionPhase::Executing {
                return Err(InteractionError::SessionActive {
                    gesture: Some(gesture),
                });
            }
            Ok((DragStatePatch::reset(), ()))
        });
        match result {
            Ok(()) => {
                info!(gesture = %gesture, reason = ?reason, "Drag session cancelled");
                true
            }
            Err(InteractionError::SessionActive { .. }) => {
                debug!(gesture = %gesture, reason = ?reason, "Cancel refused while action runs");
                false
            }
            Err(_) => false,
        }
    }
}

pub(crate) fn ensure_gesture(state: &RegistryState, gesture: GestureId) -> InteractionResult<()> {
    if state.drag.gesture == Some(gesture) && state.drag.phase.is_active() {
        Ok(())
    } else {
        Err(InteractionError::InactiveGesture(gesture))
    }
}

fn ensure_pointer_phase(state: &DragSessionState, gesture: GestureId) -> InteractionResult<()> {
    if state.gesture == Some(gesture) && state.phase.is_pointer_phase() {
        Ok(())
    } else {
        Err(InteractionError::InactiveGesture(gesture))
    }
}
