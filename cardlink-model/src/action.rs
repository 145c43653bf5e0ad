use async_trait::async_trait;
use cardlink_types::{CardId, DragPayload};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A command executed when a payload is dropped on an accepting zone.
///
/// Implementations are opaque to the interaction core: they may await
/// network calls or dialogs. Returning `Err` (or panicking) is reported to
/// the caller as a failed [`ActionResult`], never as a crash of the session.
#[async_trait]
pub trait CardAction: Send + Sync {
    async fn execute(&self, payload: &DragPayload) -> anyhow::Result<ActionResult>;
}

/// Adapts an async closure taking an owned payload into a [`CardAction`].
pub struct FnAction<F>(F);

/// Wraps `f` as a [`CardAction`].
pub fn action_fn<F, Fut>(f: F) -> FnAction<F>
where
    F: Fn(DragPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ActionResult>> + Send + 'static,
{
    FnAction(f)
}

#[async_trait]
impl<F, Fut> CardAction for FnAction<F>
where
    F: Fn(DragPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ActionResult>> + Send + 'static,
{
    async fn execute(&self, payload: &DragPayload) -> anyhow::Result<ActionResult> {
        (self.0)(payload.clone()).await
    }
}

/// Result of running an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Action-specific output (e.g. the created appointment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionResult {
    /// A successful result with no message.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A failed result carrying `error`.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// One action offered by a drop zone.
#[derive(Clone)]
pub struct ActionConfig {
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
    pub handler: Arc<dyn CardAction>,
    pub requires_confirmation: bool,
    pub confirmation_message: Option<String>,
    /// Disabled actions stay registered but are never offered.
    pub disabled: bool,
}

impl ActionConfig {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl CardAction + 'static,
    ) -> Self {
        Self::with_shared_handler(id, label, Arc::new(handler))
    }

    /// Creates an action around a handler shared with other actions.
    pub fn with_shared_handler(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: Arc<dyn CardAction>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            handler,
            requires_confirmation: false,
            confirmation_message: None,
            disabled: false,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Gates the action behind an explicit confirmation.
    #[must_use]
    pub fn requiring_confirmation(mut self, message: Option<String>) -> Self {
        self.requires_confirmation = true;
        self.confirmation_message = message;
        self
    }

    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("requires_confirmation", &self.requires_confirmation)
            .field("confirmation_message", &self.confirmation_message)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// An action eligible for a specific (target card, payload) pair, tagged
/// with where it came from.
#[derive(Debug, Clone)]
pub struct AvailableAction {
    pub card_id: CardId,
    pub target_card_type: String,
    pub source_data_type: String,
    pub drop_zone_id: String,
    pub action: ActionConfig,
}

impl AvailableAction {
    #[must_use]
    pub fn action_id(&self) -> &str {
        &self.action.id
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn CardAction> {
        &self.action.handler
    }

    /// Identity used when the user picks among several actions:
    /// `"<cardId>-<actionId>"`.
    #[must_use]
    pub fn selection_key(&self) -> String {
        format!("{}-{}", self.card_id, self.action.id)
    }
}
