use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{Field, Form, Step, sort_by_order};
use crate::validate::{ValidationReport, validate_step_values, validate_values};
use crate::values::{FieldValue, FormValues};

/// How required fields are enforced before moving on or submitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredCheck {
    /// Leave required semantics to the host inputs; never block.
    Native,
    /// Run a validation pass and block on failures.
    #[default]
    Enforce,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub required: RequiredCheck,
}

/// Errors raised by a form-filling session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("field '{0}' is not part of this form")]
    UnknownField(String),
    #[error("field '{0}' does not take multiple selections")]
    NotMultiChoice(String),
    #[error("{0}")]
    Invalid(ValidationReport),
    #[error("already on the last step")]
    LastStep,
    #[error("already on the first step")]
    FirstStep,
    #[error("form was already submitted")]
    Finished,
}

/// One fill-out session of a persisted form.
#[derive(Debug, Clone)]
pub struct FormRenderer {
    form: Form,
    steps: Vec<Step>,
    options: RenderOptions,
    values: FormValues,
    current: usize,
    finished: bool,
}

impl FormRenderer {
    pub fn new(form: Form, mut steps: Vec<Step>, options: RenderOptions) -> Self {
        sort_by_order(&mut steps);
        Self {
            form,
            steps,
            options,
            values: FormValues::new(),
            current: 0,
            finished: false,
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Steps in display order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current)
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.steps.iter().find_map(|step| step.field(name))
    }

    /// Replaces the value stored under `name`; every other entry is untouched.
    pub fn on_change(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), RenderError> {
        self.ensure_open()?;
        if self.field(name).is_none() {
            return Err(RenderError::UnknownField(name.to_string()));
        }
        self.values.set(name, value.into());
        Ok(())
    }

    /// Selects every option of a checkbox field, in declared order.
    pub fn select_all(&mut self, name: &str) -> Result<(), RenderError> {
        let options = self.multi_choice(name)?.options.clone();
        self.on_change(name, FieldValue::Many(options))
    }

    pub fn clear_all(&mut self, name: &str) -> Result<(), RenderError> {
        self.multi_choice(name)?;
        self.on_change(name, FieldValue::Many(Vec::new()))
    }

    pub fn next_step(&mut self) -> Result<usize, RenderError> {
        self.ensure_open()?;
        if self.is_last_step() {
            return Err(RenderError::LastStep);
        }
        if self.options.required == RequiredCheck::Enforce
            && let Some(step) = self.current_step()
        {
            validate_step_values(step, &self.values)
                .into_result()
                .map_err(RenderError::Invalid)?;
        }
        self.current += 1;
        Ok(self.current)
    }

    pub fn previous_step(&mut self) -> Result<usize, RenderError> {
        self.ensure_open()?;
        if self.current == 0 {
            return Err(RenderError::FirstStep);
        }
        self.current -= 1;
        Ok(self.current)
    }

    /// Validates every step regardless of the configured check.
    pub fn validate(&self) -> ValidationReport {
        validate_values(&self.steps, &self.values)
    }

    /// Hands the collected values to `on_submit` and ends the session.
    ///
    /// With [`RequiredCheck::Enforce`] a failing validation pass blocks the
    /// submission and the session stays open with its values intact.
    pub fn submit<F, R>(&mut self, on_submit: F) -> Result<R, RenderError>
    where
        F: FnOnce(FormValues) -> R,
    {
        self.ensure_open()?;
        if self.options.required == RequiredCheck::Enforce {
            self.validate().into_result().map_err(RenderError::Invalid)?;
        }
        self.finished = true;
        Ok(on_submit(std::mem::take(&mut self.values)))
    }

    fn multi_choice(&self, name: &str) -> Result<&Field, RenderError> {
        let field = self
            .field(name)
            .ok_or_else(|| RenderError::UnknownField(name.to_string()))?;
        if !field.kind.is_multi_choice() {
            return Err(RenderError::NotMultiChoice(name.to_string()));
        }
        Ok(field)
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.finished {
            Err(RenderError::Finished)
        } else {
            Ok(())
        }
    }
}
