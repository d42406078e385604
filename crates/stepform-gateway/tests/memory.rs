use stepform_gateway::{FormGateway, GatewayCall, GatewayError, MemoryGateway};
use stepform_spec::{Field, FieldType, Form, FormPatch, Step};

fn contact_step() -> Step {
    Step {
        id: None,
        title: "Contact Info".into(),
        description: Some("How do we reach you?".into()),
        order: 1,
        fields: vec![Field {
            label: "Name".into(),
            name: "name".into(),
            kind: FieldType::Text,
            required: true,
            ..Field::default()
        }],
    }
}

#[tokio::test]
async fn created_step_round_trips_through_listing() {
    let gateway = MemoryGateway::new();
    let form = gateway
        .create_form(&Form::new("Sell Request", "", 0.0))
        .await
        .expect("create form");
    let form_id = form.id.clone().expect("form id");
    assert_eq!(form_id, "f1");
    assert_eq!(form.slug, "sell-request");

    let created = gateway
        .create_step(&form_id, &contact_step())
        .await
        .expect("create step");
    assert_eq!(created.id.as_deref(), Some("s1"));

    let mut expected = contact_step();
    expected.id = Some("s1".into());
    assert_eq!(created, expected);

    let listed = gateway.list_steps(&form_id).await.expect("list steps");
    assert!(listed.contains(&created));
}

#[tokio::test]
async fn new_form_has_no_steps() {
    let gateway = MemoryGateway::new();
    let form = gateway
        .create_form(&Form::new("Empty", "", 0.0))
        .await
        .expect("create form");
    let steps = gateway
        .list_steps(form.id.as_deref().expect("id"))
        .await
        .expect("list");
    assert!(steps.is_empty());
}

#[tokio::test]
async fn update_and_delete_steps() {
    let gateway = MemoryGateway::new();
    let form = gateway
        .create_form(&Form::new("Edit", "", 0.0))
        .await
        .expect("create form");
    let form_id = form.id.expect("id");
    let created = gateway
        .create_step(&form_id, &contact_step())
        .await
        .expect("create");
    let step_id = created.id.clone().expect("step id");

    let mut changed = created.clone();
    changed.title = "Contact".into();
    changed.id = None;
    let updated = gateway
        .update_step(&form_id, &step_id, &changed)
        .await
        .expect("update");
    assert_eq!(updated.id.as_deref(), Some(step_id.as_str()));
    assert_eq!(updated.title, "Contact");

    gateway
        .delete_step(&form_id, &step_id)
        .await
        .expect("delete");
    assert!(gateway.list_steps(&form_id).await.expect("list").is_empty());

    let err = gateway
        .delete_step(&form_id, &step_id)
        .await
        .expect_err("already gone");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn form_metadata_patch_and_delete() {
    let gateway = MemoryGateway::new();
    let form = gateway
        .create_form(&Form::new("Sell Request", "", 0.0))
        .await
        .expect("create");
    let id = form.id.expect("id");

    let patched = gateway
        .update_form(
            &id,
            &FormPatch {
                price: Some(49.5),
                ..FormPatch::default()
            },
        )
        .await
        .expect("patch");
    assert_eq!(patched.price, 49.5);
    assert_eq!(patched.slug, "sell-request");

    gateway.delete_form(&id).await.expect("delete");
    assert!(gateway.list_forms().await.expect("list").is_empty());
    assert!(gateway.list_steps(&id).await.expect_err("gone").is_not_found());
}

#[tokio::test]
async fn injected_failure_applies_to_next_call_only() {
    let gateway = MemoryGateway::new();
    gateway.fail_next(GatewayError::Timeout);
    assert_eq!(
        gateway.list_forms().await.expect_err("injected"),
        GatewayError::Timeout
    );
    assert!(gateway.list_forms().await.expect("recovered").is_empty());
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::ListForms, GatewayCall::ListForms]
    );
    assert_eq!(gateway.write_calls(), 0);
}
