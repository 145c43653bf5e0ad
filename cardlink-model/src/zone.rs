use crate::validator::{DropValidator, PayloadPredicate, Rejection};
use crate::ActionConfig;
use cardlink_types::DragPayload;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a drop zone is willing to accept. All checks must pass.
#[derive(Clone, Default)]
pub struct AcceptConfig {
    pub data_types: Vec<String>,
    /// Upper bound on [`DragPayload::item_count`].
    pub max_items: Option<usize>,
    /// Top-level entity fields that must be present.
    pub required_fields: Vec<String>,
    pub custom_validator: Option<Arc<dyn PayloadPredicate>>,
}

impl AcceptConfig {
    /// Accepts the given data types, with no further restrictions.
    pub fn data_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data_types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    #[must_use]
    pub fn with_required_field(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }

    #[must_use]
    pub fn with_custom_validator(mut self, predicate: impl PayloadPredicate + 'static) -> Self {
        self.custom_validator = Some(Arc::new(predicate));
        self
    }

    /// Runs every check in order: data type, item count, required
    /// fields, custom predicate.
    pub fn check(&self, payload: &DragPayload) -> Result<(), Rejection> {
        if !self.data_types.iter().any(|t| *t == payload.source_data_type) {
            return Err(Rejection::DataType(payload.source_data_type.clone()));
        }

        if let Some(max) = self.max_items {
            let count = payload.item_count();
            if count > max {
                return Err(Rejection::TooManyItems { count, max });
            }
        }

        if let Some(missing) = self
            .required_fields
            .iter()
            .find(|field| payload.entity_field(field).is_none())
        {
            return Err(Rejection::MissingField(missing.clone()));
        }

        if let Some(predicate) = &self.custom_validator {
            if !predicate.test(payload) {
                return Err(Rejection::CustomValidator);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for AcceptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceptConfig")
            .field("data_types", &self.data_types)
            .field("max_items", &self.max_items)
            .field("required_fields", &self.required_fields)
            .field("custom_validator", &self.custom_validator.is_some())
            .finish()
    }
}

/// A card's declared willingness to accept certain payloads, and the
/// actions it offers for them.
#[derive(Clone)]
pub struct DropZoneConfig {
    pub id: String,
    pub accepts: AcceptConfig,
    /// Keyed by action id; ordered so enumeration is deterministic.
    pub actions: BTreeMap<String, ActionConfig>,
    pub validator: Option<Arc<dyn DropValidator>>,
}

impl DropZoneConfig {
    pub fn new(id: impl Into<String>, accepts: AcceptConfig) -> Self {
        Self {
            id: id.into(),
            accepts,
            actions: BTreeMap::new(),
            validator: None,
        }
    }

    /// Adds an action, replacing any action with the same id.
    #[must_use]
    pub fn with_action(mut self, action: ActionConfig) -> Self {
        self.actions.insert(action.id.clone(), action);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: impl DropValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Checks the accept rules, then the zone validator.
    pub fn evaluate(&self, payload: &DragPayload) -> Result<(), Rejection> {
        self.accepts.check(payload)?;
        if let Some(validator) = &self.validator {
            let result = validator.validate(payload);
            if !result.valid {
                return Err(Rejection::ZoneValidator(
                    result.reason.unwrap_or_else(|| "no reason given".to_string()),
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn accepts(&self, payload: &DragPayload) -> bool {
        self.evaluate(payload).is_ok()
    }

    pub fn action(&self, id: &str) -> Option<&ActionConfig> {
        self.actions.get(id)
    }

    /// Actions that are not disabled, in id order.
    pub fn enabled_actions(&self) -> impl Iterator<Item = &ActionConfig> {
        self.actions.values().filter(|a| !a.disabled)
    }
}

impl fmt::Debug for DropZoneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropZoneConfig")
            .field("id", &self.id)
            .field("accepts", &self.accepts)
            .field("actions", &self.actions)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
