use crate::{ConfigError, DropZoneConfig};
use cardlink_types::{CardId, DragPreview};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a card can emit when dragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    pub data_type: String,
    /// Template for the drag preview; sources fill in per-item details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<DragPreview>,
    #[serde(default)]
    pub multi_select: bool,
}

impl DragConfig {
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            preview: None,
            multi_select: false,
        }
    }

    #[must_use]
    pub fn with_preview(mut self, preview: DragPreview) -> Self {
        self.preview = Some(preview);
        self
    }

    #[must_use]
    pub fn with_multi_select(mut self) -> Self {
        self.multi_select = true;
        self
    }
}

/// Registration record of one card.
#[derive(Debug, Clone)]
pub struct CardConfig {
    pub id: CardId,
    pub card_type: String,
    pub drag_config: Option<DragConfig>,
    pub drop_zones: Vec<DropZoneConfig>,
}

impl CardConfig {
    pub fn new(id: impl Into<CardId>, card_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            card_type: card_type.into(),
            drag_config: None,
            drop_zones: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_drag_config(mut self, drag_config: DragConfig) -> Self {
        self.drag_config = Some(drag_config);
        self
    }

    #[must_use]
    pub fn with_drop_zone(mut self, zone: DropZoneConfig) -> Self {
        self.drop_zones.push(zone);
        self
    }

    /// Checks the structural rules a card must satisfy to be registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_blank() {
            return Err(ConfigError::MissingId);
        }
        if self.card_type.trim().is_empty() {
            return Err(ConfigError::MissingType {
                card_id: self.id.to_string(),
            });
        }

        let mut zone_ids = HashSet::new();
        for zone in &self.drop_zones {
            if !zone_ids.insert(zone.id.as_str()) {
                return Err(ConfigError::DuplicateZone {
                    card_id: self.id.to_string(),
                    zone_id: zone.id.clone(),
                });
            }
            if let Some((key, action)) = zone.actions.iter().find(|(key, a)| **key != a.id) {
                return Err(ConfigError::ActionKeyMismatch {
                    zone_id: zone.id.clone(),
                    key: key.clone(),
                    action_id: action.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// True if the card can be used as a drag source.
    #[must_use]
    pub fn is_draggable(&self) -> bool {
        self.drag_config.is_some()
    }
}

/// Declarative wiring: dropping `source_type` data on a `target_type`
/// card is meant to run `action_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionBinding {
    pub source_type: String,
    pub target_type: String,
    pub action_id: String,
}

impl InteractionBinding {
    pub fn new(
        source_type: impl Into<String>,
        target_type: impl Into<String>,
        action_id: impl Into<String>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            target_type: target_type.into(),
            action_id: action_id.into(),
        }
    }
}
