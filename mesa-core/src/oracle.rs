//! Triage oracle — the hosted LLM behind classification and reply drafting.
//!
//! Provides an [`OracleBackend`] trait with a Gemini implementation. The
//! oracle is opaque and unreliable by contract: it may fail for quota,
//! timeout, or malformed output, and callers must always be able to proceed
//! with [`TicketAnalysis::fallback`] and [`crate::prompt::default_reply`].
//! Nothing in ticket availability may depend on an oracle success.

use crate::models::classification::TicketAnalysis;
use crate::prompt::{build_classification_prompt, build_reply_prompt, ReplyContext};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

// ============================================================================
// OracleBackend trait
// ============================================================================

/// Abstraction over the classification/generation service.
#[async_trait]
pub trait OracleBackend: Send + Sync {
    /// Classify a raw inbound message into a structured analysis.
    async fn classify(&self, message: &str) -> Result<TicketAnalysis, OracleError>;

    /// Draft the customer-facing reply for the given context.
    async fn draft_reply(&self, ctx: &ReplyContext) -> Result<String, OracleError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Model returned no usable text")]
    EmptyResponse,

    #[error("Model output did not match the analysis schema: {0}")]
    MalformedOutput(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone)]
pub struct OracleClientConfig {
    pub api_key: String,
    pub model: String,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl OracleClientConfig {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

// ============================================================================
// GeminiOracleClient
// ============================================================================

/// Gemini-backed oracle — calls the `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiOracleClient {
    client: Client,
    config: OracleClientConfig,
    base_url: String,
}

impl GeminiOracleClient {
    pub fn new(config: OracleClientConfig) -> Result<Self, OracleError> {
        Self::with_base_url(
            config,
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
        )
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: OracleClientConfig,
        base_url: String,
    ) -> Result<Self, OracleError> {
        if config.api_key.is_empty() {
            return Err(OracleError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Run one prompt through the model with retry, returning the raw text.
    async fn generate(&self, prompt: &str, json_output: bool) -> Result<String, OracleError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result = Retry::spawn(retry_strategy, || self.generate_once(prompt, json_output)).await;

        match result {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(
                    attempts = self.config.max_retries,
                    error = %e,
                    "All oracle retry attempts failed"
                );
                Err(OracleError::RetryExhausted {
                    attempts: self.config.max_retries,
                })
            }
        }
    }

    async fn generate_once(&self, prompt: &str, json_output: bool) -> Result<String, OracleError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.config.model, self.config.api_key
        );

        let request = GenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: json_output.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");

            return Err(OracleError::Api { code, message });
        }

        let body: GenerateResponse = response.json().await?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl OracleBackend for GeminiOracleClient {
    async fn classify(&self, message: &str) -> Result<TicketAnalysis, OracleError> {
        let prompt = build_classification_prompt(message);
        let raw = self.generate(&prompt, true).await?;

        // Strict schema validation — no regex salvage of partial JSON. Output
        // that does not parse is treated like any other oracle failure.
        serde_json::from_str::<TicketAnalysis>(raw.trim())
            .map_err(|e| OracleError::MalformedOutput(e.to_string()))
    }

    async fn draft_reply(&self, ctx: &ReplyContext) -> Result<String, OracleError> {
        let prompt = build_reply_prompt(ctx);
        let text = self.generate(&prompt, false).await?;
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// TESTS
// ============================================================================
