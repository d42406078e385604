#![cfg(feature = "http")]

use serde_json::json;
use stepform_gateway::{FormGateway, GatewayConfig, GatewayError, HttpGateway};
use stepform_spec::{Field, Form, FormPatch, Step};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer, token: Option<&str>) -> HttpGateway {
    let mut config = GatewayConfig::new(&format!("{}/api", server.uri())).expect("config");
    config.token = token.map(str::to_string);
    HttpGateway::new(&config).expect("gateway")
}

#[tokio::test]
async fn list_forms_accepts_wrapped_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/forms"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "_id": "f1", "formId": "sell-request", "formTitle": "Sell Request",
                  "formDescription": "", "price": 0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let forms = gateway_for(&server, Some("t0ken"))
        .list_forms()
        .await
        .expect("list forms");
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].id.as_deref(), Some("f1"));
    assert_eq!(forms[0].slug, "sell-request");
}

#[tokio::test]
async fn create_form_posts_wire_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/forms"))
        .and(body_json(json!({
            "formId": "sell-request",
            "formTitle": "Sell Request",
            "formDescription": "",
            "price": 0.0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "f1", "formId": "sell-request", "formTitle": "Sell Request",
            "formDescription": "", "price": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = gateway_for(&server, None)
        .create_form(&Form::new("Sell Request", "", 0.0))
        .await
        .expect("create form");
    assert_eq!(created.id.as_deref(), Some("f1"));
}

#[tokio::test]
async fn missing_steps_resource_is_an_empty_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/forms/f1/steps"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let steps = gateway_for(&server, None)
        .list_steps("f1")
        .await
        .expect("empty listing");
    assert!(steps.is_empty());
}

#[tokio::test]
async fn step_options_are_canonicalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/forms/f1/steps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "_id": "s1",
                "stepTitle": "Budget",
                "stepOrder": 1,
                "fields": [
                    { "label": "Range", "name": "range", "type": "radio", "required": true,
                      "options": [{ "value": "low" }, "high"] }
                ]
            }
        ])))
        .mount(&server)
        .await;

    let steps = gateway_for(&server, None)
        .list_steps("f1")
        .await
        .expect("list steps");
    assert_eq!(steps[0].fields[0].options, vec!["low", "high"]);
}

#[tokio::test]
async fn acknowledgement_without_record_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/forms/f1/steps"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "success": true, "message": "Step created" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/forms/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "form": { "_id": "f1" } })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, None);
    let step = Step {
        title: "Contact Info".into(),
        order: 1,
        fields: vec![Field::new()],
        ..Step::default()
    };
    assert_eq!(
        gateway.create_step("f1", &step).await,
        Err(GatewayError::Decode("response has no _id".into()))
    );
    let patch = FormPatch {
        price: Some(5.0),
        ..FormPatch::default()
    };
    assert!(matches!(
        gateway.update_form("f1", &patch).await,
        Err(GatewayError::Decode(_))
    ));
}

#[tokio::test]
async fn rejected_update_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/forms/f1/steps/s1"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "stepTitle too long" })),
        )
        .mount(&server)
        .await;

    let step = Step {
        title: "x".repeat(500),
        order: 1,
        fields: vec![Field::new()],
        ..Step::default()
    };
    let err = gateway_for(&server, None)
        .update_step("f1", "s1", &step)
        .await
        .expect_err("rejected");
    assert_eq!(
        err,
        GatewayError::Rejected {
            status: 422,
            message: "stepTitle too long".into()
        }
    );
}

#[tokio::test]
async fn delete_of_unknown_form_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/forms/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = gateway_for(&server, None)
        .delete_form("nope")
        .await
        .expect_err("not found");
    assert_eq!(
        err,
        GatewayError::NotFound {
            resource: "form",
            id: "nope".into()
        }
    );
}

#[tokio::test]
async fn patch_only_sends_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/forms/f1"))
        .and(body_json(json!({ "price": 10.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "f1", "formId": "sell-request", "formTitle": "Sell Request",
                      "formDescription": "", "price": 10 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let form = gateway_for(&server, None)
        .update_form(
            "f1",
            &FormPatch {
                price: Some(10.0),
                ..FormPatch::default()
            },
        )
        .await
        .expect("patch");
    assert_eq!(form.price, 10.0);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let config = GatewayConfig::new("http://127.0.0.1:9/api").expect("config");
    let err = HttpGateway::new(&config)
        .expect("gateway")
        .list_forms()
        .await
        .expect_err("unreachable");
    assert!(matches!(
        err,
        GatewayError::Transport(_) | GatewayError::Timeout
    ));
}
