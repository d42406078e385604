#![allow(missing_docs)]

pub mod render;
pub mod runtime;
pub mod spec;
pub mod validate;
pub mod values;

pub use render::{InputKind, SELECT_PLACEHOLDER, render_step_json, render_text};
pub use runtime::{FormRenderer, RenderError, RenderOptions, RequiredCheck};
pub use spec::{
    Field, FieldType, Form, FormPatch, SchemaError, Step, StepId, next_step_order, slugify,
    sort_by_order,
};
pub use validate::{
    ValidationError, ValidationReport, validate_step, validate_step_against, validate_step_values,
    validate_values,
};
pub use values::{FieldValue, FormValues};
