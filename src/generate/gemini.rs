use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{build_explain_message, build_user_message, CodeGenerator, GenerateError, SYSTEM_PROMPT};
use crate::config::GenerationConfig;

const FALLBACK_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Blocking client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    key_env: String,
    context_chars: usize,
}

impl GeminiClient {
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerateError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = std::env::var(&config.api_key_env)
            .or_else(|_| std::env::var(FALLBACK_KEY_ENV))
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::warn!(
                "No API key in ${} or ${FALLBACK_KEY_ENV}; AI generation is disabled",
                config.api_key_env
            );
        }

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            key_env: config.api_key_env.clone(),
            context_chars: config.context_chars,
        })
    }

    fn generate_content(&self, system: Option<&str>, user: &str) -> Result<String, GenerateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerateError::MissingApiKey(self.key_env.clone()))?;

        let request = GenerateContentRequest {
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: user }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        log::info!("Sending request to {} ({} chars)", self.model, user.len());

        let response: GenerateContentResponse = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        response.text().ok_or(GenerateError::EmptyResponse)
    }
}

impl CodeGenerator for GeminiClient {
    fn generate(&self, prompt: &str, current_code: &str) -> Result<String, GenerateError> {
        let message = build_user_message(prompt, current_code, self.context_chars);
        self.generate_content(Some(SYSTEM_PROMPT), &message)
    }

    fn explain(&self, code: &str, error: &str) -> Result<String, GenerateError> {
        self.generate_content(None, &build_explain_message(code, error))
    }
}
