use anyhow::Result;
use clap::{Args, ValueEnum};
use schemars::schema_for;
use stepform_spec::{Form, FormValues, Step};

use super::print_json;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Document to describe
    #[arg(long, value_enum, default_value = "step")]
    pub kind: SchemaKind,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Step,
    Form,
    Values,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let schema = match args.kind {
        SchemaKind::Step => schema_for!(Step),
        SchemaKind::Form => schema_for!(Form),
        SchemaKind::Values => schema_for!(FormValues),
    };
    print_json(&schema)
}
