//src/gemini.rs
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::coach::{
    self, AiError, AlternativeGenerator, PlanStructurer, PlanWriter, SessionGenerator,
    StructuredPlan,
};
use crate::model::{ExerciseTarget, WorkoutSession};
use crate::prompts::{self, DietProfile, WorkoutProfile};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const MIN_KEY_LEN: usize = 5;

#[derive(Serialize, Debug)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

/// Blocking client for the Gemini `generateContent` endpoint. Implements every coach trait.
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// # Errors
    /// `AuthFailure` when the key is missing or obviously too short,
    /// `Network` if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str) -> Result<Self, AiError> {
        let api_key = api_key.trim();
        if api_key.len() < MIN_KEY_LEN {
            return Err(AiError::AuthFailure(
                "API key is missing. Set `api_key` in the config file or the GEMINI_API_KEY environment variable.".to_string(),
            ));
        }
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another host (proxies, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sends one prompt and returns the reply text. `json_reply` asks the model
    /// for `application/json` output.
    ///
    /// # Errors
    /// Returns a categorized `AiError`; an empty reply is `MalformedResponse`.
    pub fn generate(&self, prompt: &str, json_reply: bool) -> Result<String, AiError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: json_reply.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };
        info!(model = %self.model, json_reply, prompt_len = prompt.len(), "sending generateContent request");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                error!("generateContent request failed: {e}");
                AiError::categorize(None, &e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Could not read error body".to_string());
            error!(
                "generateContent failed with status: {}. Body: {}",
                status, body
            );
            return Err(AiError::categorize(Some(status.as_u16()), &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;
        let text = parsed.text();
        debug!(reply_len = text.len(), "received generateContent reply");
        if text.trim().is_empty() {
            return Err(AiError::MalformedResponse(
                "received empty response".to_string(),
            ));
        }
        Ok(text)
    }
}

impl SessionGenerator for GeminiClient {
    fn generate_session(
        &self,
        focus: &str,
        exercise_count: u32,
    ) -> Result<WorkoutSession, AiError> {
        let reply = self.generate(&prompts::session_prompt(focus, exercise_count), true)?;
        coach::parse_generated_session(&reply, focus, exercise_count)
    }
}

impl AlternativeGenerator for GeminiClient {
    fn generate_alternative(
        &self,
        current_name: &str,
        focus: &str,
    ) -> Result<ExerciseTarget, AiError> {
        let reply = self.generate(&prompts::alternative_prompt(current_name, focus), true)?;
        coach::parse_alternative(&reply)
    }
}

impl PlanStructurer for GeminiClient {
    fn parse_plan_to_days(&self, plan_text: &str) -> Result<StructuredPlan, AiError> {
        let reply = self.generate(&prompts::plan_structure_prompt(plan_text), true)?;
        coach::parse_structured_plan(&reply)
    }
}

impl PlanWriter for GeminiClient {
    fn write_diet_plan(
        &self,
        profile: &DietProfile,
        skipped_meals: &[String],
    ) -> Result<String, AiError> {
        self.generate(&prompts::diet_plan_prompt(profile, skipped_meals), false)
    }

    fn write_workout_plan(&self, profile: &WorkoutProfile) -> Result<String, AiError> {
        self.generate(&prompts::workout_plan_prompt(profile), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_key_is_auth_failure() {
        let err = GeminiClient::new("abc", DEFAULT_MODEL).err().unwrap();
        assert_eq!(err.category(), "auth");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "{\"a\":1}");
    }

    #[test]
    fn test_request_omits_config_for_plain_text() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }
}
