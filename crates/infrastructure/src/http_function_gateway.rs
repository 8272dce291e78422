use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use url::Url;

use pondok_application::FunctionGateway;
use pondok_core::{AppError, AppResult};

use crate::http_auth_provider::normalized_base_url;

/// Invokes hosted server functions with the service role key.
#[derive(Clone)]
pub struct HttpFunctionGateway {
    http_client: reqwest::Client,
    base_url: Url,
    service_key: String,
}

impl HttpFunctionGateway {
    /// Creates a gateway for the backend at `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        service_key: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client,
            base_url: normalized_base_url(base_url)?,
            service_key: service_key.into(),
        })
    }

    fn function_url(&self, function_name: &str) -> AppResult<Url> {
        if function_name.is_empty()
            || !function_name
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '-')
        {
            return Err(AppError::Validation(format!(
                "invalid function name '{function_name}'"
            )));
        }

        self.base_url
            .join(format!("functions/v1/{function_name}").as_str())
            .map_err(|error| AppError::Internal(format!("invalid function endpoint: {error}")))
    }
}

/// Unwraps the `{ data, error }` envelope functions reply with.
fn unwrap_function_response(function_name: &str, body: Value) -> AppResult<Value> {
    let Value::Object(mut envelope) = body else {
        return Ok(body);
    };

    match envelope.remove("error") {
        None | Some(Value::Null) => {}
        Some(error) => {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .or(error.as_str())
                .unwrap_or("function reported an error")
                .to_owned();
            return Err(AppError::Internal(format!(
                "function '{function_name}' failed: {message}"
            )));
        }
    }

    Ok(envelope
        .remove("data")
        .unwrap_or(Value::Object(envelope)))
}

#[async_trait]
impl FunctionGateway for HttpFunctionGateway {
    async fn invoke(&self, function_name: &str, body: Value) -> AppResult<Value> {
        let response = self
            .http_client
            .post(self.function_url(function_name)?)
            .header("apikey", self.service_key.as_str())
            .bearer_auth(self.service_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("function '{function_name}' unreachable: {error}"))
            })?;

        let status = response.status();
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);

        if !status.is_success() {
            warn!(function = function_name, status = %status, "server function failed");
            return match unwrap_function_response(function_name, payload) {
                Err(error) => Err(error),
                Ok(_) => Err(AppError::Internal(format!(
                    "function '{function_name}' failed with status {status}"
                ))),
            };
        }

        unwrap_function_response(function_name, payload)
    }
}
