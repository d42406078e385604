use serde_json::{Map, Value};

use crate::spec::{Field, FieldType, Step};
use crate::values::{FieldValue, FormValues};

/// Empty first entry shown by select and dropdown inputs.
pub const SELECT_PLACEHOLDER: &str = "Select...";

/// Input affordance a field renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind<'a> {
    /// Single-line input; `input_type` is the HTML input type.
    SingleLine {
        input_type: &'static str,
        placeholder: Option<&'a str>,
    },
    MultiLine {
        placeholder: Option<&'a str>,
    },
    /// One choice among `options`, optionally preceded by an empty sentinel entry.
    Exclusive {
        options: &'a [String],
        sentinel: Option<&'static str>,
    },
    Multiple {
        options: &'a [String],
    },
    File,
}

impl<'a> InputKind<'a> {
    pub fn for_field(field: &'a Field) -> Self {
        let placeholder = field.placeholder_text();
        match field.kind {
            FieldType::TextArea => InputKind::MultiLine { placeholder },
            FieldType::Radio => InputKind::Exclusive {
                options: &field.options,
                sentinel: None,
            },
            FieldType::Select | FieldType::Dropdown => InputKind::Exclusive {
                options: &field.options,
                sentinel: Some(SELECT_PLACEHOLDER),
            },
            FieldType::Checkbox => InputKind::Multiple {
                options: &field.options,
            },
            FieldType::File => InputKind::File,
            kind => InputKind::SingleLine {
                input_type: kind.html_input_type().unwrap_or("text"),
                placeholder,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputKind::SingleLine { .. } => "single_line",
            InputKind::MultiLine { .. } => "multi_line",
            InputKind::Exclusive { .. } => "exclusive",
            InputKind::Multiple { .. } => "multiple",
            InputKind::File => "file",
        }
    }
}

/// Describes one step and its current values as a JSON document for UI hosts.
pub fn render_step_json(step: &Step, values: &FormValues) -> Value {
    let fields = step
        .fields
        .iter()
        .map(|field| {
            let input = InputKind::for_field(field);
            let mut map = Map::new();
            map.insert("name".into(), Value::String(field.name.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.as_str().into()));
            map.insert("input".into(), Value::String(input.label().into()));
            map.insert("required".into(), Value::Bool(field.required));
            match input {
                InputKind::SingleLine {
                    input_type,
                    placeholder,
                } => {
                    map.insert("input_type".into(), Value::String(input_type.into()));
                    if let Some(placeholder) = placeholder {
                        map.insert("placeholder".into(), Value::String(placeholder.into()));
                    }
                }
                InputKind::MultiLine {
                    placeholder: Some(placeholder),
                } => {
                    map.insert("placeholder".into(), Value::String(placeholder.into()));
                }
                InputKind::Exclusive { options, sentinel } => {
                    map.insert("options".into(), string_array(options));
                    if let Some(sentinel) = sentinel {
                        map.insert("sentinel".into(), Value::String(sentinel.into()));
                    }
                }
                InputKind::Multiple { options } => {
                    map.insert("options".into(), string_array(options));
                }
                InputKind::MultiLine { placeholder: None } | InputKind::File => {}
            }
            if let Some(value) = values.get(&field.name) {
                map.insert(
                    "current_value".into(),
                    serde_json::to_value(value).unwrap_or(Value::Null),
                );
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let mut map = Map::new();
    map.insert("title".into(), Value::String(step.title.clone()));
    if let Some(description) = &step.description {
        map.insert("description".into(), Value::String(description.clone()));
    }
    map.insert("order".into(), Value::from(step.order));
    map.insert("fields".into(), Value::Array(fields));
    Value::Object(map)
}

/// Plain-text rendering of one step for terminal prompts.
pub fn render_text(step: &Step, values: &FormValues) -> String {
    let mut lines = vec![format!("== {} ==", step.title)];
    if let Some(description) = step.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    for field in &step.fields {
        let marker = if field.required { " *" } else { "" };
        let mut line = format!("- {}{} [{}]", field.display_label(), marker, field.kind);
        match InputKind::for_field(field) {
            InputKind::Exclusive { options, .. } | InputKind::Multiple { options } => {
                line.push_str(&format!(" ({})", options.join(" | ")));
            }
            _ => {}
        }
        if let Some(value) = values.get(&field.name) {
            line.push_str(&format!(" = {}", display_value(value)));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Many(items) => items.join(", "),
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
