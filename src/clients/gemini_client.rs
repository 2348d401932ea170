use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, error, info, instrument};

use crate::config::settings::GeminiConfig;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response could not be decoded: {0}")]
    Decode(String),
    #[error("response had no text content (finish_reason: {0})")]
    EmptyResponse(String),
}

impl From<GeminiError> for AppError {
    fn from(error: GeminiError) -> Self {
        AppError::External(format!("Generative language API {}", error))
    }
}

// generateContent request
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Option<Content>,
    pub generation_config: Option<GenerationConfig>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<i32>,
    pub response_mime_type: Option<String>,
}

// generateContent response
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<ResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let parts = &candidate.content.as_ref()?.parts;
        if parts.is_empty() {
            return None;
        }
        Some(parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(""))
    }

    fn finish_reason(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Client for the Google Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, AppError> {
        if config.api_key.is_empty() {
            return Err(AppError::Configuration("GEMINI_API_KEY cannot be empty".to_string()));
        }

        Ok(Self {
            client: crate::clients::http_client::new_api_client()?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a single-turn prompt and returns the reply text.
    #[instrument(skip(self, system_prompt, user_prompt), fields(model = %self.model))]
    pub async fn generate_text(&self, system_prompt: &str, user_prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: user_prompt.to_string() }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part { text: system_prompt.to_string() }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(256),
                response_mime_type: Some("application/json".to_string()),
            }),
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Sending generateContent request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response".to_string());
            error!("generateContent failed with status {}: {}", status, body);
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!("generateContent deserialization failed: {} | Response: {}", e, response_text);
            GeminiError::Decode(e.to_string())
        })?;

        let text = parsed
            .first_text()
            .ok_or_else(|| GeminiError::EmptyResponse(parsed.finish_reason()))?;

        info!("generateContent request successful for model {}", self.model);
        Ok(text)
    }
}
