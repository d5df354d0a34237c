pub mod gemini;

use std::sync::LazyLock;
use std::thread;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured (set {0})")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned no text")]
    EmptyResponse,
}

/// Text-to-code collaborator. Implementations may block.
pub trait CodeGenerator {
    /// Replacement document for `prompt`, given the current document
    fn generate(&self, prompt: &str, current_code: &str) -> Result<String, GenerateError>;

    /// Short explanation of why `code` failed with `error`
    fn explain(&self, code: &str, error: &str) -> Result<String, GenerateError>;
}

pub const SYSTEM_PROMPT: &str = include_str!("system_prompt.txt");

/// Shown when an explanation cannot be produced
pub const EXPLAIN_FALLBACK: &str = "Could not reach the AI service to explain this error.";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:glsl|hlsl|c)?").unwrap());

/// Remove markdown fences anywhere in the response and trim it
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Request body for a generation: the document is cut to `context_chars` characters
pub fn build_user_message(prompt: &str, current_code: &str, context_chars: usize) -> String {
    let mut context: String = current_code.chars().take(context_chars).collect();
    if current_code.chars().nth(context_chars).is_some() {
        context.push_str("...");
    }
    format!("Current Code:\n{context}\n\nRequest: {prompt}")
}

pub fn build_explain_message(code: &str, error: &str) -> String {
    format!(
        "The following shader code failed to compile. Explain the error and suggest a fix briefly.\n\n\
         Error: {error}\n\nCode:\n{code}"
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiRequest {
    Generate { prompt: String, current_code: String },
    Explain { code: String, error: String },
}

#[derive(Debug)]
pub enum AiResponse {
    Generated(Result<String, GenerateError>),
    /// Always displayable; failures are already replaced by a fixed message
    Explained(String),
}

pub fn run_request(generator: &dyn CodeGenerator, request: AiRequest) -> AiResponse {
    match request {
        AiRequest::Generate {
            prompt,
            current_code,
        } => {
            let result = generator
                .generate(&prompt, &current_code)
                .map(|text| strip_code_fences(&text))
                .and_then(|code| {
                    if code.is_empty() {
                        Err(GenerateError::EmptyResponse)
                    } else {
                        Ok(code)
                    }
                });
            if let Err(e) = &result {
                log::warn!("Generation failed: {e}");
            }
            AiResponse::Generated(result)
        }
        AiRequest::Explain { code, error } => {
            let text = match generator.explain(&code, &error) {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                Ok(_) => EXPLAIN_FALLBACK.to_string(),
                Err(e) => {
                    log::warn!("Explanation failed: {e}");
                    EXPLAIN_FALLBACK.to_string()
                }
            };
            AiResponse::Explained(text)
        }
    }
}

// AIDEV-NOTE: Requests run on a dedicated thread so a slow service never stalls rendering
// or input. The thread exits once the worker handle is dropped.
pub struct AiWorker {
    requests: flume::Sender<AiRequest>,
    responses: flume::Receiver<AiResponse>,
}

impl AiWorker {
    pub fn spawn(generator: Box<dyn CodeGenerator + Send>) -> Result<Self> {
        let (request_tx, request_rx) = flume::unbounded::<AiRequest>();
        let (response_tx, response_rx) = flume::unbounded();

        thread::Builder::new()
            .name("ai-worker".to_string())
            .spawn(move || {
                for request in request_rx.iter() {
                    let response = run_request(generator.as_ref(), request);
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                log::debug!("AI worker stopped");
            })
            .context("Failed to spawn AI worker thread")?;

        Ok(Self {
            requests: request_tx,
            responses: response_rx,
        })
    }

    /// Returns false if the worker thread is gone
    pub fn submit(&self, request: AiRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    pub fn try_recv(&self) -> Option<AiResponse> {
        self.responses.try_recv().ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    /// Generator returning canned text
    pub struct CannedGenerator {
        pub code: Option<String>,
        pub explanation: Option<String>,
    }

    impl CodeGenerator for CannedGenerator {
        fn generate(&self, _prompt: &str, _current_code: &str) -> Result<String, GenerateError> {
            self.code.clone().ok_or(GenerateError::EmptyResponse)
        }

        fn explain(&self, _code: &str, _error: &str) -> Result<String, GenerateError> {
            self.explanation
                .clone()
                .ok_or_else(|| GenerateError::MissingApiKey("TEST_KEY".to_string()))
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```glsl\nfloat x;\n```\n"), "float x;");
        assert_eq!(strip_code_fences("```hlsl\na\n```"), "a");
        assert_eq!(strip_code_fences("```c\na```"), "a");
        assert_eq!(strip_code_fences("  plain  "), "plain");
        assert_eq!(strip_code_fences("a ``` b"), "a  b");
    }

    #[test]
    fn test_user_message_truncation() {
        let message = build_user_message("make it red", "abcdef", 3);
        assert_eq!(message, "Current Code:\nabc...\n\nRequest: make it red");

        let message = build_user_message("x", "abc", 3);
        assert!(message.contains("Current Code:\nabc\n"));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let message = build_user_message("x", "ééé", 2);
        assert!(message.contains("éé..."));
    }

    #[test]
    fn test_generate_strips_and_rejects_empty() {
        let generator = CannedGenerator {
            code: Some("```hlsl\nfloat4 mainImage(float2 uv) { return float4(1.0); }\n```".into()),
            explanation: None,
        };
        let request = AiRequest::Generate {
            prompt: "white".into(),
            current_code: String::new(),
        };
        match run_request(&generator, request.clone()) {
            AiResponse::Generated(Ok(code)) => assert!(code.starts_with("float4 mainImage")),
            other => panic!("unexpected response: {other:?}"),
        }

        let fences_only = CannedGenerator {
            code: Some("```\n```".into()),
            explanation: None,
        };
        assert!(matches!(
            run_request(&fences_only, request),
            AiResponse::Generated(Err(GenerateError::EmptyResponse))
        ));
    }

    #[test]
    fn test_explain_failure_degrades() {
        let generator = CannedGenerator {
            code: None,
            explanation: None,
        };
        let request = AiRequest::Explain {
            code: "x".into(),
            error: "y".into(),
        };
        match run_request(&generator, request) {
            AiResponse::Explained(text) => assert_eq!(text, EXPLAIN_FALLBACK),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_worker_round_trip() {
        let worker = AiWorker::spawn(Box::new(CannedGenerator {
            code: Some("float4 mainImage(float2 uv) { return float4(0.0); }".into()),
            explanation: Some("Missing semicolon.".into()),
        }))
        .unwrap();

        assert!(worker.submit(AiRequest::Explain {
            code: "x".into(),
            error: "y".into(),
        }));

        let response = worker
            .responses
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert!(matches!(response, AiResponse::Explained(ref t) if t == "Missing semicolon."));
    }
}
