use stepform_gateway::FormGateway;
use stepform_spec::{Form, FormPatch, ValidationError, ValidationReport};
use tracing::debug;

use crate::error::BuilderError;

/// Form-level metadata operations: list, create, patch, delete.
pub struct FormCatalog<G> {
    gateway: G,
}

impl<G: FormGateway> FormCatalog<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn list(&self) -> Result<Vec<Form>, BuilderError> {
        Ok(self.gateway.list_forms().await?)
    }

    /// Creates a form; its slug is derived from the title here and never again.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        price: f64,
    ) -> Result<Form, BuilderError> {
        let mut report = ValidationReport::default();
        check_title(Some(title), &mut report);
        check_price(Some(price), &mut report);
        report.into_result().map_err(BuilderError::Validation)?;

        let form = Form::new(title.trim(), description, price);
        debug!(slug = %form.slug, "creating form");
        Ok(self.gateway.create_form(&form).await?)
    }

    pub async fn update(&self, id: &str, patch: &FormPatch) -> Result<Form, BuilderError> {
        let mut report = ValidationReport::default();
        if patch.is_empty() {
            report.errors.push(error(None, "Nothing to update", "empty_patch"));
        }
        if patch.title.is_some() {
            check_title(patch.title.as_deref(), &mut report);
        }
        check_price(patch.price, &mut report);
        report.into_result().map_err(BuilderError::Validation)?;

        debug!(id, "updating form");
        Ok(self.gateway.update_form(id, patch).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), BuilderError> {
        debug!(id, "deleting form");
        Ok(self.gateway.delete_form(id).await?)
    }
}

fn check_title(title: Option<&str>, report: &mut ValidationReport) {
    if title.is_none_or(|title| title.trim().is_empty()) {
        report.errors.push(error(
            Some("/formTitle"),
            "Form Title is required",
            "form_title_required",
        ));
    }
}

fn check_price(price: Option<f64>, report: &mut ValidationReport) {
    if let Some(price) = price
        && !(price.is_finite() && price >= 0.0)
    {
        report.errors.push(error(
            Some("/price"),
            "Price must be a non-negative number",
            "form_price_invalid",
        ));
    }
}

fn error(path: Option<&str>, message: &str, code: &str) -> ValidationError {
    ValidationError {
        field: None,
        path: path.map(str::to_string),
        message: message.to_string(),
        code: code.to_string(),
    }
}
