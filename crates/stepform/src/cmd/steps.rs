use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use stepform_builder::StepBuilder;
use stepform_gateway::FormGateway;
use stepform_spec::Step;

use super::{Globals, print_json, read_json};

#[derive(Subcommand, Debug)]
pub enum StepsCommand {
    /// List the steps of a form, in order
    List(ListArgs),
    /// Add a step from a JSON document
    Add(AddArgs),
    /// Replace a step with a JSON document
    Edit(EditArgs),
    /// Delete a step
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Form id (`_id`)
    pub form: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub form: String,
    /// Step document; a missing or zero `stepOrder` takes the next free order
    #[arg(long, value_name = "step.json")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub form: String,
    pub step: String,
    #[arg(long, value_name = "step.json")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub form: String,
    pub step: String,
}

pub async fn run(command: StepsCommand, globals: &Globals) -> Result<()> {
    let builder = StepBuilder::new(globals.gateway()?);
    match command {
        StepsCommand::List(args) => {
            let steps = builder
                .select_form(&args.form)
                .await
                .with_context(|| format!("failed to load steps of form {}", args.form))?;
            if globals.json {
                return print_json(&steps);
            }
            if steps.is_empty() {
                println!("no steps");
            }
            for step in &steps {
                println!("{}", step_line(step));
            }
            Ok(())
        }
        StepsCommand::Add(args) => {
            let document: Step = read_json(&args.file)?;
            let saved = add_step(&builder, &args.form, document).await?;
            emit(&saved, "added", globals)
        }
        StepsCommand::Edit(args) => {
            let document: Step = read_json(&args.file)?;
            let saved = edit_step(&builder, &args.form, &args.step, document).await?;
            emit(&saved, "updated", globals)
        }
        StepsCommand::Delete(args) => {
            builder
                .select_form(&args.form)
                .await
                .with_context(|| format!("failed to load steps of form {}", args.form))?;
            builder
                .delete_step(&args.step)
                .await
                .with_context(|| format!("failed to delete step {}", args.step))?;
            if globals.json {
                return print_json(&serde_json::json!({ "deleted": args.step }));
            }
            println!("deleted step {}", args.step);
            Ok(())
        }
    }
}

/// Drafts a new step from `document` and saves it.
pub async fn add_step<G: FormGateway>(
    builder: &StepBuilder<G>,
    form_id: &str,
    document: Step,
) -> Result<Step> {
    builder
        .select_form(form_id)
        .await
        .with_context(|| format!("failed to load steps of form {form_id}"))?;
    builder.add_step()?;
    builder.edit_draft(|draft| {
        let order = if document.order == 0 {
            draft.order
        } else {
            document.order
        };
        *draft = Step {
            id: None,
            order,
            ..document
        };
        Ok(())
    })?;
    builder.save().await.context("failed to save step")
}

/// Replaces a listed step with `document`, keeping its id.
pub async fn edit_step<G: FormGateway>(
    builder: &StepBuilder<G>,
    form_id: &str,
    step_id: &str,
    document: Step,
) -> Result<Step> {
    builder
        .select_form(form_id)
        .await
        .with_context(|| format!("failed to load steps of form {form_id}"))?;
    builder.edit_step(step_id)?;
    builder.edit_draft(|draft| {
        let id = draft.id.take();
        *draft = Step { id, ..document };
        Ok(())
    })?;
    builder.save().await.context("failed to save step")
}

fn emit(step: &Step, verb: &str, globals: &Globals) -> Result<()> {
    if globals.json {
        return print_json(step);
    }
    println!("{verb} {}", step_line(step));
    Ok(())
}

fn step_line(step: &Step) -> String {
    let count = step.fields.len();
    format!(
        "{}\t{}\t{}\t{count} field{}",
        step.order,
        step.id.as_deref().unwrap_or("-"),
        step.title,
        if count == 1 { "" } else { "s" }
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stepform_builder::BuilderError;
    use stepform_gateway::MemoryGateway;
    use stepform_spec::{Field, Form};

    use super::*;

    fn document(title: &str) -> Step {
        Step {
            title: title.into(),
            fields: vec![Field {
                label: "Name".into(),
                name: "name".into(),
                ..Field::default()
            }],
            ..Step::default()
        }
    }

    #[tokio::test]
    async fn add_takes_next_order_and_edit_keeps_id() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway
            .create_form(&Form::new("Quote", "", 0.0))
            .await
            .expect("form");
        let builder = StepBuilder::new(Arc::clone(&gateway));

        let first = add_step(&builder, "f1", document("One")).await.expect("add");
        let second = add_step(&builder, "f1", document("Two")).await.expect("add");
        assert_eq!((first.order, second.order), (1, 2));

        let mut changed = document("Two, revised");
        changed.order = 3;
        let edited = edit_step(&builder, "f1", "s2", changed).await.expect("edit");
        assert_eq!(edited.id.as_deref(), Some("s2"));
        assert_eq!(edited.order, 3);
        assert_eq!(step_line(&edited), "3\ts2\tTwo, revised\t1 field");
    }

    #[tokio::test]
    async fn invalid_document_reports_validation() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway
            .create_form(&Form::new("Quote", "", 0.0))
            .await
            .expect("form");
        let builder = StepBuilder::new(Arc::clone(&gateway));

        let err = add_step(&builder, "f1", document(""))
            .await
            .expect_err("blank title");
        let builder_err = err.downcast_ref::<BuilderError>().expect("builder error");
        assert!(
            builder_err
                .validation()
                .expect("report")
                .has_code("step_title_required")
        );
        assert_eq!(gateway.write_calls(), 1);
    }
}
