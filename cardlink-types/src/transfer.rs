//! The transfer medium a payload travels through during a gesture.
//!
//! A source writes the payload under two representations before the
//! gesture may proceed: the JSON form under [`PAYLOAD_FORMAT`] and the
//! preview title under [`TEXT_FORMAT`]. Depending on the delivering
//! channel either one may be the only one that survives, so readers must
//! tolerate a missing structured form.

use crate::{DragPayload, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the structured (JSON) representation.
pub const PAYLOAD_FORMAT: &str = "application/json";

/// Key of the plain-text fallback representation.
pub const TEXT_FORMAT: &str = "text/plain";

/// Format-keyed string store, modelled on a platform drag data transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTransfer {
    items: BTreeMap<String, String>,
}

impl DataTransfer {
    /// Creates an empty transfer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `format`, replacing any previous value.
    pub fn set_data(&mut self, format: impl Into<String>, data: impl Into<String>) {
        self.items.insert(format.into(), data.into());
    }

    /// Returns the data stored under `format`.
    #[must_use]
    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.items.get(format).map(String::as_str)
    }

    /// Lists the formats present.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Removes every representation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reads the payload from the structured representation.
    pub fn read_payload(&self) -> Result<DragPayload> {
        let json = self
            .get_data(PAYLOAD_FORMAT)
            .ok_or_else(|| Error::MissingRepresentation(PAYLOAD_FORMAT.to_string()))?;
        DragPayload::from_json(json)
    }

    /// Returns the plain-text representation, if any.
    #[must_use]
    pub fn preview_text(&self) -> Option<&str> {
        self.get_data(TEXT_FORMAT)
    }
}

impl DragPayload {
    /// Writes both transfer representations of this payload.
    pub fn write_to(&self, transfer: &mut DataTransfer) -> Result<()> {
        transfer.set_data(PAYLOAD_FORMAT, self.to_json()?);
        transfer.set_data(TEXT_FORMAT, self.preview_title());
        Ok(())
    }

    /// Builds a fresh transfer carrying this payload.
    pub fn to_transfer(&self) -> Result<DataTransfer> {
        let mut transfer = DataTransfer::new();
        self.write_to(&mut transfer)?;
        Ok(transfer)
    }
}
