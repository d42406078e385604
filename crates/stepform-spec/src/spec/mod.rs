pub mod field;
pub mod form;
pub mod step;

pub use field::{Field, FieldType, SchemaError};
pub use form::{Form, FormPatch, slugify};
pub use step::{Step, StepId, next_step_order, sort_by_order};
