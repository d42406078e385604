use stepform_gateway::GatewayError;
use stepform_spec::{SchemaError, ValidationReport};
use thiserror::Error;

/// Errors raised by [`crate::StepBuilder`] and [`crate::FormCatalog`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("validation failed: {0}")]
    Validation(ValidationReport),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("a save is already in flight")]
    SaveInFlight,
    #[error("no step is being edited")]
    NotEditing,
    #[error("a step is already being edited")]
    AlreadyEditing,
    #[error("no form selected")]
    NoFormSelected,
    #[error("step '{0}' is not in the listing")]
    UnknownStep(String),
    #[error("response discarded: the builder session was closed or switched")]
    Stale,
}

impl BuilderError {
    pub fn validation(&self) -> Option<&ValidationReport> {
        match self {
            BuilderError::Validation(report) => Some(report),
            _ => None,
        }
    }
}
