//! Drag session state.
//!
//! [`DragSessionState`] is the single authoritative record of the gesture
//! in progress. It lives inside the registry and is only changed by
//! merging a [`DragStatePatch`]; everything else works on snapshots.

use cardlink_model::AvailableAction;
use cardlink_types::{CardId, DragPayload, GestureId};
use std::sync::Arc;

/// Lifecycle phase of the drag session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    #[default]
    Idle,
    /// Picked up, no movement sample evaluated yet.
    Dragging,
    /// Re-evaluated on every movement sample.
    Hovering(HoverState),
    /// The selected action's handler is running.
    Executing,
    AwaitingConfirmation,
    AwaitingChoice,
}

/// What the pointer is over during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoverState {
    /// Nothing, or the source card itself.
    None,
    Accepting,
    Rejecting,
}

impl SessionPhase {
    /// True for every phase except [`SessionPhase::Idle`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// True while the pointer is still carrying the payload.
    #[must_use]
    pub fn is_pointer_phase(&self) -> bool {
        matches!(self, Self::Dragging | Self::Hovering(_))
    }

    /// True while a confirmation or a choice is pending.
    #[must_use]
    pub fn is_awaiting_input(&self) -> bool {
        matches!(self, Self::AwaitingConfirmation | Self::AwaitingChoice)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragSessionState {
    pub gesture: Option<GestureId>,
    pub phase: SessionPhase,
    pub is_dragging: bool,
    pub payload: Option<Arc<DragPayload>>,
    pub drop_target: Option<CardId>,
    /// May differ from `drop_target` while hovering is ambiguous.
    pub drop_zone_highlight: Option<CardId>,
    pub available_actions: Vec<AvailableAction>,
}

impl DragSessionState {
    /// True if this is the empty state every gesture ends in.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.gesture.is_none()
            && self.phase == SessionPhase::Idle
            && !self.is_dragging
            && self.payload.is_none()
            && self.drop_target.is_none()
            && self.drop_zone_highlight.is_none()
            && self.available_actions.is_empty()
    }

    /// Selection keys of the published actions, in order.
    #[must_use]
    pub fn available_action_keys(&self) -> Vec<String> {
        self.available_actions
            .iter()
            .map(AvailableAction::selection_key)
            .collect()
    }
}

/// A partial update to [`DragSessionState`]. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct DragStatePatch {
    pub gesture: Option<Option<GestureId>>,
    pub phase: Option<SessionPhase>,
    pub is_dragging: Option<bool>,
    pub payload: Option<Option<Arc<DragPayload>>>,
    pub drop_target: Option<Option<CardId>>,
    pub drop_zone_highlight: Option<Option<CardId>>,
    pub available_actions: Option<Vec<AvailableAction>>,
}

impl DragStatePatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that returns every field to the idle state.
    #[must_use]
    pub fn reset() -> Self {
        Self {
            gesture: Some(None),
            phase: Some(SessionPhase::Idle),
            is_dragging: Some(false),
            payload: Some(None),
            drop_target: Some(None),
            drop_zone_highlight: Some(None),
            available_actions: Some(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_gesture(mut self, gesture: Option<GestureId>) -> Self {
        self.gesture = Some(gesture);
        self
    }

    #[must_use]
    pub fn with_phase(mut self, phase: SessionPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn with_dragging(mut self, dragging: bool) -> Self {
        self.is_dragging = Some(dragging);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Option<Arc<DragPayload>>) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_drop_target(mut self, target: Option<CardId>) -> Self {
        self.drop_target = Some(target);
        self
    }

    #[must_use]
    pub fn with_highlight(mut self, target: Option<CardId>) -> Self {
        self.drop_zone_highlight = Some(target);
        self
    }

    #[must_use]
    pub fn with_available_actions(mut self, actions: Vec<AvailableAction>) -> Self {
        self.available_actions = Some(actions);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gesture.is_none()
            && self.phase.is_none()
            && self.is_dragging.is_none()
            && self.payload.is_none()
            && self.drop_target.is_none()
            && self.drop_zone_highlight.is_none()
            && self.available_actions.is_none()
    }

    pub(crate) fn apply_to(self, state: &mut DragSessionState) {
        if let Some(gesture) = self.gesture {
            state.gesture = gesture;
        }
        if let Some(phase) = self.phase {
            state.phase = phase;
        }
        if let Some(dragging) = self.is_dragging {
            state.is_dragging = dragging;
        }
        if let Some(payload) = self.payload {
            state.payload = payload;
        }
        if let Some(target) = self.drop_target {
            state.drop_target = target;
        }
        if let Some(highlight) = self.drop_zone_highlight {
            state.drop_zone_highlight = highlight;
        }
        if let Some(actions) = self.available_actions {
            state.available_actions = actions;
        }
    }
}
