use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::protocol::Prediction;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

mod advisories;
mod parse;

pub use advisories::static_advisories;
pub use parse::parse_prediction;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_PROMPT_CHARS: usize = 2_000;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt exceeds {MAX_PROMPT_CHARS} characters")]
    PromptTooLong,
    #[error("invalid inference endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("inference endpoint must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference endpoint returned an empty result")]
    EmptyResult,
}

/// Source of model-backed outbreak predictions shown on the alerts panel.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, prompt: &str) -> Result<Prediction, InferenceError>;
}

#[derive(Debug, Serialize)]
struct PredictPayload<'a> {
    data: [&'a str; 1],
}

/// Calls a hosted model endpoint that speaks the Gradio `{"data": [...]}`
/// convention and parses its free-text answer.
#[derive(Clone)]
pub struct HttpPredictionClient {
    http: Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(endpoint: &str) -> Result<Self, InferenceError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, InferenceError> {
        let endpoint = Url::parse(endpoint).map_err(|source| InferenceError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(InferenceError::UnsupportedScheme(endpoint.scheme().to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, prompt: &str) -> Result<Prediction, InferenceError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(InferenceError::EmptyPrompt);
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(InferenceError::PromptTooLong);
        }

        debug!(endpoint = %self.endpoint, "requesting prediction");
        let body = self
            .http
            .post(self.endpoint.clone())
            .json(&PredictPayload { data: [prompt] })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = extract_output_text(&body);
        if text.trim().is_empty() {
            warn!(endpoint = %self.endpoint, "inference endpoint returned no text");
            return Err(InferenceError::EmptyResult);
        }
        Ok(parse_prediction(&text))
    }
}

/// Pulls the model's text out of a response body. Gradio wraps outputs as
/// `{"data": ["..."]}`; other hosts answer with `{"output": "..."}`,
/// `{"text": "..."}` or a bare string.
fn extract_output_text(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    let candidate = value
        .get("data")
        .and_then(|data| data.as_array())
        .and_then(|items| items.iter().find_map(|item| item.as_str()))
        .or_else(|| value.get("output").and_then(|v| v.as_str()))
        .or_else(|| value.get("text").and_then(|v| v.as_str()))
        .or_else(|| value.as_str());

    match candidate {
        Some(text) => text.to_string(),
        None => body.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
