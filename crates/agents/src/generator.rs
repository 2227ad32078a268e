use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use wayfinder_core::{build_itinerary_prompt, ItineraryText, PlannerError, TripRequest};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

const SERVICE: &str = "gemini";
const MAX_ERROR_BODY_CHARS: usize = 500;

#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    /// One outbound call, no retry.
    async fn generate(&self, request: &TripRequest) -> Result<ItineraryText, PlannerError>;
}

pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(
        client: Client,
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ItineraryGenerator for GeminiGenerator {
    async fn generate(&self, request: &TripRequest) -> Result<ItineraryText, PlannerError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PlannerError::service(SERVICE, "WAYFINDER_GEMINI_API_KEY is not configured")
        })?;

        let prompt = build_itinerary_prompt(request);
        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting itinerary");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body(&prompt))
            .send()
            .await
            .map_err(|error| PlannerError::service(SERVICE, error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlannerError::service(
                SERVICE,
                format!(
                    "non-success status {}: {}",
                    status.as_u16(),
                    body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>()
                ),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| PlannerError::service(SERVICE, format!("parse failed: {error}")))?;

        extract_candidate_text(&payload)
            .filter(|text| !text.trim().is_empty())
            .map(ItineraryText::new)
            .ok_or_else(|| {
                let reason = block_reason(&payload)
                    .map(|reason| format!("prompt blocked ({reason})"))
                    .unwrap_or_else(|| "response contained no text".to_string());
                PlannerError::service(SERVICE, reason)
            })
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ]
    })
}

fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<String>();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn block_reason(payload: &Value) -> Option<String> {
    payload
        .get("promptFeedback")?
        .get("blockReason")?
        .as_str()
        .map(str::to_string)
}
