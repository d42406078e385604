use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Supported input types for a form field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Number,
    Url,
    Address,
    TextArea,
    Select,
    Dropdown,
    Checkbox,
    Radio,
    File,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Email,
        FieldType::Number,
        FieldType::Url,
        FieldType::Address,
        FieldType::TextArea,
        FieldType::Select,
        FieldType::Dropdown,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::File,
    ];

    /// Choice-style types are the only ones that carry options.
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Dropdown | FieldType::Checkbox | FieldType::Radio
        )
    }

    pub fn uses_placeholder(self) -> bool {
        !matches!(self, FieldType::Checkbox | FieldType::Radio)
    }

    /// Checkbox fields collect a list of selected options.
    pub fn is_multi_choice(self) -> bool {
        matches!(self, FieldType::Checkbox)
    }

    /// HTML input type of the single-line types; `None` for every other affordance.
    pub fn html_input_type(self) -> Option<&'static str> {
        match self {
            FieldType::Text | FieldType::Address => Some("text"),
            FieldType::Email => Some("email"),
            FieldType::Number => Some("number"),
            FieldType::Url => Some("url"),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Url => "url",
            FieldType::Address => "address",
            FieldType::TextArea => "textArea",
            FieldType::Select => "select",
            FieldType::Dropdown => "dropdown",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::File => "file",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by positional edits on steps and fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("option index {index} out of range ({len} options)")]
    OptionIndex { index: usize, len: usize },
    #[error("field index {index} out of range ({len} fields)")]
    FieldIndex { index: usize, len: usize },
}

/// Definition of a single input inside a step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default, deserialize_with = "deserialize_options")]
    #[schemars(with = "Vec<String>")]
    pub options: Vec<String>,
}

impl Field {
    /// Blank text field, as appended by the builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the input type, dropping options the new type cannot use.
    pub fn set_type(&mut self, kind: FieldType) {
        self.kind = kind;
        if !kind.is_choice() {
            self.options.clear();
        }
    }

    pub fn add_option(&mut self) {
        self.options.push(String::new());
    }

    pub fn update_option(
        &mut self,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), SchemaError> {
        let len = self.options.len();
        let slot = self
            .options
            .get_mut(index)
            .ok_or(SchemaError::OptionIndex { index, len })?;
        *slot = value.into();
        Ok(())
    }

    pub fn remove_option(&mut self, index: usize) -> Result<String, SchemaError> {
        if index >= self.options.len() {
            return Err(SchemaError::OptionIndex {
                index,
                len: self.options.len(),
            });
        }
        Ok(self.options.remove(index))
    }

    /// Placeholder to show, if the input type renders one.
    pub fn placeholder_text(&self) -> Option<&str> {
        if self.kind.uses_placeholder() && !self.placeholder.is_empty() {
            Some(&self.placeholder)
        } else {
            None
        }
    }

    /// Label used in messages; falls back to the value key.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

// Stored forms carry options either as plain strings or as `{ "value": .. }` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Text(String),
    Object { value: String },
}

impl RawOption {
    fn into_value(self) -> String {
        match self {
            RawOption::Text(value) | RawOption::Object { value } => value,
        }
    }
}

fn deserialize_options<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawOption>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(RawOption::into_value)
        .collect())
}
