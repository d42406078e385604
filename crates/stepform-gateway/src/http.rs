use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use stepform_spec::{Form, FormPatch, Step};
use tracing::{debug, warn};
use url::Url;

use crate::{FormGateway, GatewayConfig, GatewayError};

const MAX_ERROR_BODY: usize = 200;

/// JSON-over-HTTP client for the remote form API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

// Responses arrive either bare or wrapped as `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } | Envelope::Bare(data) => data,
        }
    }
}

// Records written through the API come back carrying their stored id.
trait Stored {
    fn stored_id(&self) -> Option<&str>;
}

impl Stored for Form {
    fn stored_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Stored for Step {
    fn stored_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        if config.base_url.cannot_be_a_base() {
            return Err(GatewayError::Config(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }
        if config.timeout_secs == 0 {
            return Err(GatewayError::Config("timeout must be at least 1 second".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GatewayError::Config(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(%method, %url, "gateway request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                resource: "resource",
                id: response.url().path().to_string(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body);
        warn!(status = status.as_u16(), %message, "gateway rejected request");
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice::<Envelope<T>>(&bytes)
            .map(Envelope::into_inner)
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }

    // Every key of a record defaults, so any JSON object decodes; the id is what
    // tells a stored record apart from an acknowledgement body.
    async fn send_record<T: DeserializeOwned + Stored>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let record: T = self.send_json(builder).await?;
        if record.stored_id().is_none_or(str::is_empty) {
            warn!("write response carried no record id");
            return Err(GatewayError::Decode("response has no _id".to_string()));
        }
        Ok(record)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), GatewayError> {
        self.send(builder).await.map(|_| ())
    }
}

#[async_trait]
impl FormGateway for HttpGateway {
    async fn list_forms(&self) -> Result<Vec<Form>, GatewayError> {
        self.send_json(self.request(Method::GET, &["forms"])).await
    }

    async fn create_form(&self, form: &Form) -> Result<Form, GatewayError> {
        self.send_record(self.request(Method::POST, &["forms"]).json(form))
            .await
    }

    async fn update_form(&self, id: &str, patch: &FormPatch) -> Result<Form, GatewayError> {
        self.send_record(self.request(Method::PUT, &["forms", id]).json(patch))
            .await
            .map_err(|err| not_found_as(err, "form", id))
    }

    async fn delete_form(&self, id: &str) -> Result<(), GatewayError> {
        self.send_empty(self.request(Method::DELETE, &["forms", id]))
            .await
            .map_err(|err| not_found_as(err, "form", id))
    }

    async fn list_steps(&self, form_id: &str) -> Result<Vec<Step>, GatewayError> {
        match self
            .send_json(self.request(Method::GET, &["forms", form_id, "steps"]))
            .await
        {
            Err(err) if err.is_not_found() => {
                debug!(form_id, "no steps stored for form");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn create_step(&self, form_id: &str, step: &Step) -> Result<Step, GatewayError> {
        self.send_record(
            self.request(Method::POST, &["forms", form_id, "steps"])
                .json(step),
        )
        .await
        .map_err(|err| not_found_as(err, "form", form_id))
    }

    async fn update_step(
        &self,
        form_id: &str,
        step_id: &str,
        step: &Step,
    ) -> Result<Step, GatewayError> {
        self.send_record(
            self.request(Method::PUT, &["forms", form_id, "steps", step_id])
                .json(step),
        )
        .await
        .map_err(|err| not_found_as(err, "step", step_id))
    }

    async fn delete_step(&self, form_id: &str, step_id: &str) -> Result<(), GatewayError> {
        self.send_empty(self.request(Method::DELETE, &["forms", form_id, "steps", step_id]))
            .await
            .map_err(|err| not_found_as(err, "step", step_id))
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn not_found_as(err: GatewayError, resource: &'static str, id: &str) -> GatewayError {
    match err {
        GatewayError::NotFound { .. } => GatewayError::NotFound {
            resource,
            id: id.to_string(),
        },
        other => other,
    }
}

fn rejection_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });
    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            trimmed.chars().take(MAX_ERROR_BODY).collect()
        }
    })
}
