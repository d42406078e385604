#![allow(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use stepform_spec::{Form, FormPatch, Step};
use thiserror::Error;

pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;

pub use config::{ConfigError, GatewayConfig};
#[cfg(feature = "http")]
pub use http::HttpGateway;
pub use memory::{GatewayCall, MemoryGateway};

/// Errors raised by gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    pub(crate) fn form_not_found(id: &str) -> Self {
        GatewayError::NotFound {
            resource: "form",
            id: id.to_string(),
        }
    }

    pub(crate) fn step_not_found(id: &str) -> Self {
        GatewayError::NotFound {
            resource: "step",
            id: id.to_string(),
        }
    }
}

/// CRUD contract of the remote form API.
///
/// Form ids passed here are the opaque `_id` assigned on creation, not the slug.
/// Implementations never retry; failures are returned to the caller as-is.
#[async_trait]
pub trait FormGateway: Send + Sync {
    async fn list_forms(&self) -> Result<Vec<Form>, GatewayError>;
    async fn create_form(&self, form: &Form) -> Result<Form, GatewayError>;
    async fn update_form(&self, id: &str, patch: &FormPatch) -> Result<Form, GatewayError>;
    async fn delete_form(&self, id: &str) -> Result<(), GatewayError>;
    /// Steps in storage order; callers sort by `order`.
    async fn list_steps(&self, form_id: &str) -> Result<Vec<Step>, GatewayError>;
    async fn create_step(&self, form_id: &str, step: &Step) -> Result<Step, GatewayError>;
    async fn update_step(
        &self,
        form_id: &str,
        step_id: &str,
        step: &Step,
    ) -> Result<Step, GatewayError>;
    async fn delete_step(&self, form_id: &str, step_id: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G> FormGateway for Arc<G>
where
    G: FormGateway + ?Sized,
{
    async fn list_forms(&self) -> Result<Vec<Form>, GatewayError> {
        (**self).list_forms().await
    }

    async fn create_form(&self, form: &Form) -> Result<Form, GatewayError> {
        (**self).create_form(form).await
    }

    async fn update_form(&self, id: &str, patch: &FormPatch) -> Result<Form, GatewayError> {
        (**self).update_form(id, patch).await
    }

    async fn delete_form(&self, id: &str) -> Result<(), GatewayError> {
        (**self).delete_form(id).await
    }

    async fn list_steps(&self, form_id: &str) -> Result<Vec<Step>, GatewayError> {
        (**self).list_steps(form_id).await
    }

    async fn create_step(&self, form_id: &str, step: &Step) -> Result<Step, GatewayError> {
        (**self).create_step(form_id, step).await
    }

    async fn update_step(
        &self,
        form_id: &str,
        step_id: &str,
        step: &Step,
    ) -> Result<Step, GatewayError> {
        (**self).update_step(form_id, step_id, step).await
    }

    async fn delete_step(&self, form_id: &str, step_id: &str) -> Result<(), GatewayError> {
        (**self).delete_step(form_id, step_id).await
    }
}
