#![allow(missing_docs)]

pub mod builder;
pub mod catalog;
pub mod error;
pub mod state;

pub use builder::StepBuilder;
pub use catalog::FormCatalog;
pub use error::BuilderError;
pub use state::{BuilderState, EditTarget};
