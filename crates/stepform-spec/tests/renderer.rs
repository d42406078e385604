use serde_json::json;

use stepform_spec::{
    Field, FieldType, FieldValue, Form, FormRenderer, RenderError, RenderOptions, RequiredCheck,
    SELECT_PLACEHOLDER, Step,
};

fn text_field(label: &str, name: &str, required: bool) -> Field {
    Field {
        label: label.into(),
        name: name.into(),
        kind: FieldType::Text,
        required,
        ..Field::default()
    }
}

fn choice_field(name: &str, kind: FieldType, options: &[&str]) -> Field {
    Field {
        label: name.into(),
        name: name.into(),
        kind,
        options: options.iter().map(|option| option.to_string()).collect(),
        ..Field::default()
    }
}

fn step(order: u32, title: &str, fields: Vec<Field>) -> Step {
    Step {
        id: Some(format!("s{order}")),
        title: title.into(),
        description: None,
        order,
        fields,
    }
}

fn wish_form(required: RequiredCheck) -> FormRenderer {
    FormRenderer::new(
        Form::new("Buy Request", "", 0.0),
        vec![
            step(
                2,
                "Preferences",
                vec![choice_field(
                    "wishes",
                    FieldType::Checkbox,
                    &["garden", "garage", "pool"],
                )],
            ),
            step(1, "Contact", vec![text_field("Name", "name", true)]),
        ],
        RenderOptions { required },
    )
}

#[test]
fn steps_render_in_step_order() {
    let renderer = FormRenderer::new(
        Form::new("Ordered", "", 0.0),
        vec![
            step(3, "Third", vec![]),
            step(1, "First", vec![]),
            step(2, "Second", vec![]),
        ],
        RenderOptions::default(),
    );
    let orders: Vec<u32> = renderer.steps().iter().map(|step| step.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(
        renderer.current_step().map(|step| step.title.as_str()),
        Some("First")
    );
}

#[test]
fn entering_a_name_fills_the_value_bag() {
    let mut renderer = FormRenderer::new(
        Form::new("Sell Request", "", 0.0),
        vec![step(1, "Contact Info", vec![text_field("Name", "name", true)])],
        RenderOptions::default(),
    );
    renderer.on_change("name", "Jane").expect("change");
    assert_eq!(renderer.values().to_json(), json!({ "name": "Jane" }));

    let submitted = renderer
        .submit(|values| values.to_json())
        .expect("submit");
    assert_eq!(submitted, json!({ "name": "Jane" }));
    assert!(renderer.is_finished());
}

#[test]
fn unknown_field_names_are_rejected() {
    let mut renderer = wish_form(RequiredCheck::Enforce);
    let err = renderer.on_change("nickname", "JJ").expect_err("unknown");
    assert_eq!(err, RenderError::UnknownField("nickname".into()));
    assert!(renderer.values().is_empty());
}

#[test]
fn select_all_then_clear_all() {
    let mut renderer = wish_form(RequiredCheck::Enforce);
    renderer.select_all("wishes").expect("select all");
    assert_eq!(
        renderer.values().get("wishes"),
        Some(&FieldValue::Many(vec![
            "garden".into(),
            "garage".into(),
            "pool".into()
        ]))
    );
    renderer.clear_all("wishes").expect("clear all");
    assert_eq!(
        renderer.values().get("wishes"),
        Some(&FieldValue::Many(vec![]))
    );
}

#[test]
fn select_all_requires_checkbox_field() {
    let mut renderer = wish_form(RequiredCheck::Enforce);
    assert_eq!(
        renderer.select_all("name"),
        Err(RenderError::NotMultiChoice("name".into()))
    );
}

#[test]
fn enforced_required_blocks_next_step_and_submit() {
    let mut renderer = wish_form(RequiredCheck::Enforce);
    match renderer.next_step() {
        Err(RenderError::Invalid(report)) => {
            assert_eq!(report.messages(), vec!["Name is required"]);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(matches!(
        renderer.submit(|values| values),
        Err(RenderError::Invalid(_))
    ));
    assert!(!renderer.is_finished());

    renderer.on_change("name", "Jane").expect("name");
    assert_eq!(renderer.next_step(), Ok(1));
    assert!(renderer.is_last_step());
    assert_eq!(renderer.next_step(), Err(RenderError::LastStep));
    assert_eq!(renderer.previous_step(), Ok(0));
}

#[test]
fn native_required_never_blocks() {
    let mut renderer = wish_form(RequiredCheck::Native);
    assert_eq!(renderer.next_step(), Ok(1));
    let values = renderer.submit(|values| values).expect("submit");
    assert!(values.is_empty());
}

#[test]
fn select_sentinel_does_not_satisfy_required() {
    let mut field = choice_field("county", FieldType::Select, &["Kent", "Essex"]);
    field.required = true;
    let mut renderer = FormRenderer::new(
        Form::new("Places", "", 0.0),
        vec![step(1, "Where", vec![field])],
        RenderOptions::default(),
    );
    renderer.on_change("county", "").expect("blank");
    assert!(renderer.validate().has_code("required"));

    renderer
        .on_change("county", SELECT_PLACEHOLDER)
        .expect("sentinel");
    let report = renderer.validate();
    assert!(report.has_code("required"));
    assert!(!report.has_code("invalid_option"));

    renderer.on_change("county", "Kent").expect("choice");
    assert!(renderer.validate().is_valid());
}

#[test]
fn session_is_closed_after_submit() {
    let mut renderer = wish_form(RequiredCheck::Native);
    renderer.submit(|_| ()).expect("submit");
    assert_eq!(
        renderer.on_change("name", "late"),
        Err(RenderError::Finished)
    );
    assert_eq!(renderer.submit(|_| ()), Err(RenderError::Finished));
}
