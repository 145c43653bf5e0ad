//! The drag payload: the unit of data transferred by one gesture.
//!
//! A payload is created once when a gesture starts and is read-only from
//! then on. Starting another gesture requires a fresh payload.

use crate::{CardId, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, saturating to zero if the clock is
/// set before it.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Everything a drop target needs to know about the dragged item(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    /// Card the gesture started on.
    pub source_card_id: CardId,
    /// Category label of the source card (e.g. "customers").
    pub source_card_type: String,
    /// Data type carried (e.g. "customer"). Drop zones match on this.
    pub source_data_type: String,
    /// The dragged entity.
    pub data: PayloadData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drag_preview: Option<DragPreview>,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// The entity part of a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadData {
    /// Entity id within its own domain.
    pub id: String,
    /// Entity type, normally equal to the payload's `source_data_type`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Full snapshot of the entity at gesture start.
    pub entity: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SelectionMetadata>,
}

/// Multi-select metadata attached by sources that support it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_items: Option<Vec<Value>>,
    /// Source-specific keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Preview hints for the (external) drag image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPreview {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl PayloadData {
    /// Creates payload data for a single entity.
    #[must_use]
    pub fn new(id: impl Into<String>, data_type: impl Into<String>, entity: Value) -> Self {
        Self {
            id: id.into(),
            data_type: data_type.into(),
            entity,
            metadata: None,
        }
    }

    /// Attaches the items of a multi-selection.
    #[must_use]
    pub fn with_selection(mut self, items: Vec<Value>) -> Self {
        self.metadata
            .get_or_insert_with(SelectionMetadata::default)
            .selected_items = Some(items);
        self
    }
}

impl DragPreview {
    /// Creates a preview with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            color: None,
            count: None,
        }
    }
}

impl DragPayload {
    /// Creates a payload stamped with the current time. The source data
    /// type is taken from `data`.
    #[must_use]
    pub fn new(
        source_card_id: impl Into<CardId>,
        source_card_type: impl Into<String>,
        data: PayloadData,
    ) -> Self {
        Self {
            source_card_id: source_card_id.into(),
            source_card_type: source_card_type.into(),
            source_data_type: data.data_type.clone(),
            data,
            drag_preview: None,
            timestamp: now_millis(),
            user_id: None,
        }
    }

    /// Sets the drag preview.
    #[must_use]
    pub fn with_preview(mut self, preview: DragPreview) -> Self {
        self.drag_preview = Some(preview);
        self
    }

    /// Sets the user that started the gesture.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Number of items carried: the multi-selection size when present,
    /// otherwise one.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.data
            .metadata
            .as_ref()
            .and_then(|m| m.selected_items.as_ref())
            .map_or(1, Vec::len)
    }

    /// Looks up a top-level field on the entity snapshot.
    #[must_use]
    pub fn entity_field(&self, field: &str) -> Option<&Value> {
        self.data.entity.as_object().and_then(|o| o.get(field))
    }

    /// Title used for the plain-text transfer representation.
    #[must_use]
    pub fn preview_title(&self) -> &str {
        self.drag_preview
            .as_ref()
            .map_or(self.data.id.as_str(), |p| p.title.as_str())
    }

    /// Checks the fields every gesture needs before it may start.
    pub fn validate(&self) -> Result<()> {
        if self.source_card_id.is_blank() {
            return Err(Error::InvalidPayload("source card id is empty".into()));
        }
        if self.source_data_type.trim().is_empty() {
            return Err(Error::InvalidPayload("source data type is empty".into()));
        }
        Ok(())
    }

    /// Serializes the payload to its JSON transfer form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a payload from its JSON transfer form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
