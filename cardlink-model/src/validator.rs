use cardlink_types::DragPayload;
use thiserror::Error;

/// Custom acceptance predicate attached to an [`AcceptConfig`](crate::AcceptConfig).
///
/// Closures of the form `Fn(&DragPayload) -> bool` implement this trait.
pub trait PayloadPredicate: Send + Sync {
    fn test(&self, payload: &DragPayload) -> bool;
}

impl<F> PayloadPredicate for F
where
    F: Fn(&DragPayload) -> bool + Send + Sync,
{
    fn test(&self, payload: &DragPayload) -> bool {
        self(payload)
    }
}

/// Zone-level validator that can explain a rejection.
///
/// Closures of the form `Fn(&DragPayload) -> ValidationResult` implement
/// this trait.
pub trait DropValidator: Send + Sync {
    fn validate(&self, payload: &DragPayload) -> ValidationResult;
}

impl<F> DropValidator for F
where
    F: Fn(&DragPayload) -> ValidationResult + Send + Sync,
{
    fn validate(&self, payload: &DragPayload) -> ValidationResult {
        self(payload)
    }
}

/// Outcome of a [`DropValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ValidationResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Why a drop zone refused a payload. The first failing check wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("data type '{0}' is not accepted")]
    DataType(String),

    #[error("{count} items exceed the limit of {max}")]
    TooManyItems { count: usize, max: usize },

    #[error("required field '{0}' is missing")]
    MissingField(String),

    #[error("custom validator refused the payload")]
    CustomValidator,

    #[error("zone validator refused the payload: {0}")]
    ZoneValidator(String),
}
