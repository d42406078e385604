use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use stepform_builder::FormCatalog;
use stepform_spec::{Form, FormPatch};

use super::{Globals, print_json};

#[derive(Subcommand, Debug)]
pub enum FormsCommand {
    /// List forms
    List,
    /// Create a form; its slug is derived from the title
    Create(CreateArgs),
    /// Change title, description or price of a form
    Update(UpdateArgs),
    /// Delete a form
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value_t = 0.0)]
    pub price: f64,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Form id (`_id`)
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Form id (`_id`)
    pub id: String,
}

pub async fn run(command: FormsCommand, globals: &Globals) -> Result<()> {
    let catalog = FormCatalog::new(globals.gateway()?);
    match command {
        FormsCommand::List => {
            let forms = catalog.list().await.context("failed to list forms")?;
            if globals.json {
                return print_json(&forms);
            }
            if forms.is_empty() {
                println!("no forms");
            }
            for form in &forms {
                println!("{}", form_line(form));
            }
            Ok(())
        }
        FormsCommand::Create(args) => {
            let form = catalog
                .create(&args.title, &args.description, args.price)
                .await
                .context("failed to create form")?;
            emit(&form, "created", globals)
        }
        FormsCommand::Update(args) => {
            let patch = FormPatch {
                title: args.title,
                description: args.description,
                price: args.price,
            };
            let form = catalog
                .update(&args.id, &patch)
                .await
                .with_context(|| format!("failed to update form {}", args.id))?;
            emit(&form, "updated", globals)
        }
        FormsCommand::Delete(args) => {
            catalog
                .delete(&args.id)
                .await
                .with_context(|| format!("failed to delete form {}", args.id))?;
            if globals.json {
                return print_json(&serde_json::json!({ "deleted": args.id }));
            }
            println!("deleted form {}", args.id);
            Ok(())
        }
    }
}

fn emit(form: &Form, verb: &str, globals: &Globals) -> Result<()> {
    if globals.json {
        return print_json(form);
    }
    println!("{verb} {}", form_line(form));
    Ok(())
}

pub(crate) fn form_line(form: &Form) -> String {
    format!(
        "{}\t{}\t{}\t{:.2}",
        form.id.as_deref().unwrap_or("-"),
        form.slug,
        form.title,
        form.price
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_line_is_tab_separated() {
        let mut form = Form::new("Sell Request", "", 5.0);
        assert_eq!(form_line(&form), "-\tsell-request\tSell Request\t5.00");
        form.id = Some("f1".into());
        assert!(form_line(&form).starts_with("f1\t"));
    }
}
