use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde::Deserialize;
use stepform_spec::{Step, ValidationReport, validate_step_against};

use super::{Globals, print_json, read_json};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// A step document, or an array of the steps of one form
    #[arg(value_name = "step.json")]
    pub file: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepDocument {
    Many(Vec<Step>),
    One(Box<Step>),
}

impl StepDocument {
    fn into_steps(self) -> Vec<Step> {
        match self {
            StepDocument::Many(steps) => steps,
            StepDocument::One(step) => vec![*step],
        }
    }
}

pub fn run(args: CheckArgs, globals: &Globals) -> Result<()> {
    let steps = read_json::<StepDocument>(&args.file)?.into_steps();
    let reports = check_steps(&steps);
    let failures: usize = reports.iter().map(|report| report.errors.len()).sum();

    if globals.json {
        let body: Vec<_> = steps
            .iter()
            .zip(&reports)
            .map(|(step, report)| {
                serde_json::json!({
                    "stepTitle": step.title,
                    "valid": report.is_valid(),
                    "errors": report.errors,
                })
            })
            .collect();
        print_json(&body)?;
    } else {
        for (step, report) in steps.iter().zip(&reports) {
            let title = if step.title.trim().is_empty() {
                "(untitled)"
            } else {
                step.title.as_str()
            };
            if report.is_valid() {
                println!("ok: {title}");
            }
            for error in &report.errors {
                println!("error: {title}: {error}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} validation error(s) in {}", args.file.display());
    }
    Ok(())
}

/// Validates each step, treating the others in the document as its siblings.
pub fn check_steps(steps: &[Step]) -> Vec<ValidationReport> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let siblings: Vec<Step> = steps
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(_, sibling)| sibling.clone())
                .collect();
            validate_step_against(step, &siblings)
        })
        .collect()
}
