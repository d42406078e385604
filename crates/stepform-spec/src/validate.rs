use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::render::SELECT_PLACEHOLDER;
use crate::spec::{Field, FieldType, Step};
use crate::values::{FieldValue, FormValues};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    fn new(
        field: Option<&str>,
        path: impl Into<String>,
        message: impl Into<String>,
        code: &str,
    ) -> Self {
        Self {
            field: field.map(str::to_string),
            path: Some(path.into()),
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every failure found by one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors
            .iter()
            .map(|error| error.message.as_str())
            .collect()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }

    fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationReport {}

/// Checks a draft step before it is persisted.
pub fn validate_step(step: &Step) -> ValidationReport {
    let mut report = ValidationReport::default();

    if step.title.trim().is_empty() {
        report.push(ValidationError::new(
            None,
            "/stepTitle",
            "Step Title is required",
            "step_title_required",
        ));
    }

    if step.order == 0 {
        report.push(ValidationError::new(
            None,
            "/stepOrder",
            "Step order must be 1 or greater",
            "step_order_invalid",
        ));
    }

    let mut seen = BTreeSet::new();
    for (idx, field) in step.fields.iter().enumerate() {
        let position = idx + 1;
        if field.label.trim().is_empty() {
            report.push(ValidationError::new(
                Some(field.name.as_str()).filter(|name| !name.is_empty()),
                format!("/fields/{idx}/label"),
                format!("Field {position}: Label is required"),
                "field_label_required",
            ));
        }
        if field.name.trim().is_empty() {
            report.push(ValidationError::new(
                None,
                format!("/fields/{idx}/name"),
                format!("Field {position}: Name is required"),
                "field_name_required",
            ));
        } else if !seen.insert(field.name.as_str()) {
            report.push(ValidationError::new(
                Some(field.name.as_str()),
                format!("/fields/{idx}/name"),
                format!("Field {position}: Name '{}' is already used", field.name),
                "duplicate_field_name",
            ));
        }
    }

    report
}

/// Same as [`validate_step`], also rejecting an order already taken by a sibling.
///
/// `siblings` are the persisted steps of the form; the step being edited is
/// skipped by id.
pub fn validate_step_against(step: &Step, siblings: &[Step]) -> ValidationReport {
    let mut report = validate_step(step);
    if step.order == 0 {
        return report;
    }
    let clash = siblings
        .iter()
        .filter(|other| other.id.is_none() || other.id != step.id)
        .find(|other| other.order == step.order);
    if let Some(other) = clash {
        report.push(ValidationError::new(
            None,
            "/stepOrder",
            format!(
                "Step order {} is already used by '{}'",
                step.order, other.title
            ),
            "step_order_taken",
        ));
    }
    report
}

/// Checks the values entered for one step.
pub fn validate_step_values(step: &Step, values: &FormValues) -> ValidationReport {
    let mut report = ValidationReport::default();
    for field in &step.fields {
        if let Some(error) = validate_field_value(field, values.get(&field.name)) {
            report.push(error);
        }
    }
    report
}

/// Checks the values entered across every step.
pub fn validate_values(steps: &[Step], values: &FormValues) -> ValidationReport {
    let mut report = ValidationReport::default();
    for step in steps {
        report.extend(validate_step_values(step, values));
    }
    report
}

fn validate_field_value(field: &Field, value: Option<&FieldValue>) -> Option<ValidationError> {
    let value = match value {
        Some(value) if !value.is_blank() && !is_select_sentinel(field, value) => value,
        _ => {
            if field.required {
                return Some(value_error(
                    field,
                    format!("{} is required", field.display_label()),
                    "required",
                ));
            }
            return None;
        }
    };

    match (field.kind, value) {
        (FieldType::Checkbox, FieldValue::Many(items)) => items
            .iter()
            .find(|item| !field.options.is_empty() && !field.options.contains(*item))
            .map(|item| invalid_option(field, item)),
        (FieldType::Checkbox, FieldValue::Text(_)) | (_, FieldValue::Many(_)) => Some(value_error(
            field,
            format!("{} has the wrong value shape", field.display_label()),
            "type_mismatch",
        )),
        (kind, FieldValue::Text(text)) => check_text(field, kind, text.trim()),
    }
}

// Select and dropdown inputs submit their placeholder when nothing is chosen.
fn is_select_sentinel(field: &Field, value: &FieldValue) -> bool {
    matches!(field.kind, FieldType::Select | FieldType::Dropdown)
        && value.as_text().map(str::trim) == Some(SELECT_PLACEHOLDER)
}

fn check_text(field: &Field, kind: FieldType, text: &str) -> Option<ValidationError> {
    match kind {
        FieldType::Email if !EMAIL.is_match(text) => Some(value_error(
            field,
            format!("{} must be a valid email address", field.display_label()),
            "invalid_email",
        )),
        FieldType::Url if url::Url::parse(text).is_err() => Some(value_error(
            field,
            format!("{} must be a valid URL", field.display_label()),
            "invalid_url",
        )),
        FieldType::Number if !text.parse::<f64>().is_ok_and(f64::is_finite) => {
            Some(value_error(
                field,
                format!("{} must be a number", field.display_label()),
                "invalid_number",
            ))
        }
        FieldType::Select | FieldType::Dropdown | FieldType::Radio
            if !field.options.is_empty() && !field.options.iter().any(|option| option == text) =>
        {
            Some(invalid_option(field, text))
        }
        _ => None,
    }
}

fn invalid_option(field: &Field, value: &str) -> ValidationError {
    value_error(
        field,
        format!("'{}' is not an option of {}", value, field.display_label()),
        "invalid_option",
    )
}

fn value_error(field: &Field, message: String, code: &str) -> ValidationError {
    ValidationError::new(
        Some(field.name.as_str()),
        format!("/{}", field.name),
        message,
        code,
    )
}
