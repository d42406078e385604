use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::field::{Field, FieldType, SchemaError};

/// Opaque identifier assigned by the persistence gateway.
pub type StepId = String;

/// One page of a multi-step form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Step {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StepId>,
    #[serde(rename = "stepTitle", default)]
    pub title: String,
    #[serde(
        rename = "stepDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(rename = "stepOrder", default)]
    pub order: u32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Step {
    /// Fresh draft holding one blank field.
    pub fn draft(order: u32) -> Self {
        Self {
            order,
            fields: vec![Field::new()],
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, index: usize) -> Result<&mut Field, SchemaError> {
        let len = self.fields.len();
        self.fields
            .get_mut(index)
            .ok_or(SchemaError::FieldIndex { index, len })
    }

    pub fn add_field(&mut self) {
        self.fields.push(Field::new());
    }

    pub fn remove_field(&mut self, index: usize) -> Result<Field, SchemaError> {
        if index >= self.fields.len() {
            return Err(SchemaError::FieldIndex {
                index,
                len: self.fields.len(),
            });
        }
        Ok(self.fields.remove(index))
    }

    /// Flips the required flag and returns the new value.
    pub fn toggle_required(&mut self, index: usize) -> Result<bool, SchemaError> {
        let field = self.field_mut(index)?;
        field.required = !field.required;
        Ok(field.required)
    }

    pub fn set_field_type(&mut self, index: usize, kind: FieldType) -> Result<(), SchemaError> {
        self.field_mut(index)?.set_type(kind);
        Ok(())
    }
}

/// Stable sort by `order`; steps sharing an order keep their fetched sequence.
pub fn sort_by_order(steps: &mut [Step]) {
    steps.sort_by_key(|step| step.order);
}

/// Order assigned to a newly added step.
///
/// Normally `count + 1`. When earlier deletions left a gap that would make
/// `count + 1` collide with a listed step, the next order after the highest
/// one is used instead.
pub fn next_step_order(steps: &[Step]) -> u32 {
    let count = u32::try_from(steps.len()).unwrap_or(u32::MAX);
    let candidate = count.saturating_add(1);
    if steps.iter().any(|step| step.order == candidate) {
        steps
            .iter()
            .map(|step| step.order)
            .max()
            .unwrap_or(count)
            .saturating_add(1)
    } else {
        candidate
    }
}
