use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use stepform_gateway::FormGateway;
use stepform_spec::{
    Field, FieldValue, Form, FormRenderer, FormValues, InputKind, RenderError, RenderOptions,
    RequiredCheck, render_text,
};

use super::{Globals, print_json, read_json};

#[derive(Args, Debug)]
pub struct FillArgs {
    /// Form id (`_id`) or slug (`formId`)
    pub form: String,
    /// JSON object of field name to value; skips prompting
    #[arg(long, value_name = "values.json")]
    pub values: Option<PathBuf>,
    /// Do not block on missing required fields
    #[arg(long = "native-required")]
    pub native_required: bool,
}

pub async fn run(args: FillArgs, globals: &Globals) -> Result<()> {
    let gateway = globals.gateway()?;
    let form = find_form(&gateway, &args.form).await?;
    let form_id = form
        .id
        .clone()
        .ok_or_else(|| anyhow!("form '{}' has no id", args.form))?;
    let steps = gateway
        .list_steps(&form_id)
        .await
        .with_context(|| format!("failed to load steps of form {form_id}"))?;
    let options = RenderOptions {
        required: if args.native_required {
            RequiredCheck::Native
        } else {
            RequiredCheck::Enforce
        },
    };
    let mut renderer = FormRenderer::new(form, steps, options);

    let values = match &args.values {
        Some(path) => {
            let entries: BTreeMap<String, FieldValue> = read_json(path)?;
            apply_values(&mut renderer, entries)?
        }
        None => {
            let stdin = io::stdin();
            let stderr = io::stderr();
            prompt_form(&mut renderer, &mut stdin.lock(), &mut stderr.lock())?
        }
    };
    print_json(&values)
}

async fn find_form<G: FormGateway>(gateway: &G, key: &str) -> Result<Form> {
    let forms = gateway.list_forms().await.context("failed to list forms")?;
    forms
        .into_iter()
        .find(|form| form.id.as_deref() == Some(key) || form.slug == key)
        .ok_or_else(|| anyhow!("no form with id or slug '{key}'"))
}

/// Applies a values document and submits.
pub fn apply_values(
    renderer: &mut FormRenderer,
    entries: BTreeMap<String, FieldValue>,
) -> Result<FormValues> {
    for (name, value) in entries {
        renderer.on_change(&name, value)?;
    }
    Ok(renderer.submit(|values| values)?)
}

/// Walks the steps on a line-oriented terminal and submits.
///
/// An empty answer leaves a field unchanged. Steps that fail validation are
/// asked again.
pub fn prompt_form<R: BufRead, W: Write>(
    renderer: &mut FormRenderer,
    input: &mut R,
    output: &mut W,
) -> Result<FormValues> {
    if renderer.steps().is_empty() {
        bail!("form '{}' has no steps", renderer.form().title);
    }
    loop {
        let Some(step) = renderer.current_step().cloned() else {
            bail!("no current step");
        };
        writeln!(output, "{}", render_text(&step, renderer.values()))?;
        for field in &step.fields {
            prompt_field(renderer, field, input, output)?;
        }

        let advanced = if renderer.is_last_step() {
            match renderer.submit(|values| values) {
                Ok(values) => return Ok(values),
                Err(err) => Err(err),
            }
        } else {
            renderer.next_step().map(|_| ())
        };
        match advanced {
            Ok(()) => {}
            Err(RenderError::Invalid(report)) => {
                for error in &report.errors {
                    writeln!(output, "! {error}")?;
                }
                rewind_to_first_failure(renderer, &report)?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

// A submit failure can point at an earlier step; go back to the first one
// that holds a failing field.
fn rewind_to_first_failure(
    renderer: &mut FormRenderer,
    report: &stepform_spec::ValidationReport,
) -> Result<()> {
    let failing = report.errors.iter().filter_map(|error| error.field.as_deref());
    let target = failing
        .filter_map(|name| {
            renderer
                .steps()
                .iter()
                .position(|step| step.field(name).is_some())
        })
        .min();
    if let Some(target) = target {
        while renderer.current_index() > target {
            renderer.previous_step()?;
        }
    }
    Ok(())
}

fn prompt_field<R: BufRead, W: Write>(
    renderer: &mut FormRenderer,
    field: &Field,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let marker = if field.required { " *" } else { "" };
    match InputKind::for_field(field) {
        InputKind::SingleLine { placeholder, .. } | InputKind::MultiLine { placeholder } => {
            let hint = placeholder.map(|text| format!(" ({text})")).unwrap_or_default();
            let answer = ask(
                input,
                output,
                &format!("{}{marker}{hint}: ", field.display_label()),
            )?;
            if !answer.is_empty() {
                renderer.on_change(&field.name, answer)?;
            }
        }
        InputKind::File => {
            let answer = ask(
                input,
                output,
                &format!("{}{marker} (file path): ", field.display_label()),
            )?;
            if !answer.is_empty() {
                renderer.on_change(&field.name, answer)?;
            }
        }
        InputKind::Exclusive { options, sentinel } => {
            list_options(output, options)?;
            let hint = sentinel.unwrap_or("number");
            loop {
                let answer = ask(
                    input,
                    output,
                    &format!("{}{marker} [{hint}]: ", field.display_label()),
                )?;
                if answer.is_empty() {
                    break;
                }
                match pick(options, &answer) {
                    Some(choice) => {
                        renderer.on_change(&field.name, choice)?;
                        break;
                    }
                    None => writeln!(output, "! choose one of the listed options")?,
                }
            }
        }
        InputKind::Multiple { options } => {
            list_options(output, options)?;
            loop {
                let answer = ask(
                    input,
                    output,
                    &format!(
                        "{}{marker} [comma-separated, * for all, - for none]: ",
                        field.display_label()
                    ),
                )?;
                match answer.as_str() {
                    "" => break,
                    "*" => {
                        renderer.select_all(&field.name)?;
                        break;
                    }
                    "-" => {
                        renderer.clear_all(&field.name)?;
                        break;
                    }
                    _ => {
                        let picked: Option<Vec<String>> = answer
                            .split(',')
                            .map(|part| pick(options, part.trim()))
                            .collect();
                        match picked {
                            Some(choices) => {
                                renderer.on_change(&field.name, choices)?;
                                break;
                            }
                            None => writeln!(output, "! choose from the listed options")?,
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn list_options<W: Write>(output: &mut W, options: &[String]) -> Result<()> {
    for (index, option) in options.iter().enumerate() {
        writeln!(output, "  {}) {option}", index + 1)?;
    }
    Ok(())
}

/// Accepts a 1-based option number or the option text itself.
fn pick(options: &[String], answer: &str) -> Option<String> {
    if let Ok(number) = answer.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| options.get(index))
            .cloned();
    }
    options.iter().find(|option| option.as_str() == answer).cloned()
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("stdin closed");
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use stepform_spec::{FieldType, Step};

    use super::*;

    fn renderer() -> FormRenderer {
        let contact = Step {
            id: Some("s1".into()),
            title: "Contact Info".into(),
            order: 1,
            fields: vec![Field {
                label: "Name".into(),
                name: "name".into(),
                required: true,
                ..Field::default()
            }],
            ..Step::default()
        };
        let budget = Step {
            id: Some("s2".into()),
            title: "Budget".into(),
            order: 2,
            fields: vec![
                Field {
                    label: "Range".into(),
                    name: "range".into(),
                    kind: FieldType::Select,
                    options: vec!["low".into(), "high".into()],
                    ..Field::default()
                },
                Field {
                    label: "Channels".into(),
                    name: "channels".into(),
                    kind: FieldType::Checkbox,
                    options: vec!["email".into(), "phone".into()],
                    ..Field::default()
                },
            ],
            ..Step::default()
        };
        FormRenderer::new(
            Form::new("Sell Request", "", 0.0),
            vec![budget, contact],
            RenderOptions::default(),
        )
    }

    #[test]
    fn prompts_through_every_step() {
        let mut renderer = renderer();
        let mut input = Cursor::new("Jane\n2\n*\n");
        let mut output = Vec::new();
        let values = prompt_form(&mut renderer, &mut input, &mut output).expect("filled");
        assert_eq!(
            values.to_json(),
            serde_json::json!({
                "name": "Jane",
                "range": "high",
                "channels": ["email", "phone"],
            })
        );
        let transcript = String::from_utf8(output).expect("utf8");
        assert!(transcript.contains("== Contact Info =="));
        assert!(transcript.contains("Range [Select...]: "));
    }

    #[test]
    fn missing_required_answer_is_asked_again() {
        let mut renderer = renderer();
        let mut input = Cursor::new("\nJane\nlow\n-\n");
        let mut output = Vec::new();
        let values = prompt_form(&mut renderer, &mut input, &mut output).expect("filled");
        assert_eq!(values.get("name"), Some(&FieldValue::from("Jane")));
        assert_eq!(values.get("channels"), Some(&FieldValue::Many(Vec::new())));
        let transcript = String::from_utf8(output).expect("utf8");
        assert!(transcript.contains("! Name is required"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut renderer = renderer();
        let err = prompt_form(&mut renderer, &mut Cursor::new(""), &mut Vec::new())
            .expect_err("eof");
        assert_eq!(err.to_string(), "stdin closed");
    }

    #[test]
    fn values_document_rejects_unknown_fields() {
        let mut renderer = renderer();
        let entries = BTreeMap::from([("age".to_string(), FieldValue::from("3"))]);
        let err = apply_values(&mut renderer, entries).expect_err("unknown field");
        assert_eq!(
            err.downcast_ref::<RenderError>(),
            Some(&RenderError::UnknownField("age".into()))
        );
    }

    #[test]
    fn pick_accepts_numbers_and_text() {
        let options = vec!["low".to_string(), "high".to_string()];
        assert_eq!(pick(&options, "1").as_deref(), Some("low"));
        assert_eq!(pick(&options, "high").as_deref(), Some("high"));
        assert_eq!(pick(&options, "0"), None);
        assert_eq!(pick(&options, "3"), None);
    }
}
