//! Gemini on Vertex AI, called through the `generateContent` REST endpoint.
//!
//! The request mirrors what the Vertex SDK sends for a multimodal prompt:
//! one user turn with the instruction text, the PDF as `inlineData`, and a
//! closing instruction. `responseMimeType: application/json` asks the model
//! to emit bare JSON, which the manifest pipeline parses without repair.

use super::{VisionExtractor, VisionResponse};
use crate::config::{ManifestConfig, ENV_ACCESS_TOKEN, ENV_PROJECT};
use crate::error::SpatialError;
use crate::pipeline::encode::encode_document;
use crate::prompts::EXTRACT_INSTRUCTION;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Vertex AI Gemini backend.
pub struct VertexGeminiExtractor {
    client: Client,
    project_id: String,
    location: String,
    model: String,
    access_token: String,
    label: String,
    timeout_secs: Option<u64>,
}

impl VertexGeminiExtractor {
    /// Build from resolved configuration.
    ///
    /// The access token comes from `config.access_token`, or failing that
    /// from `gcloud auth print-access-token`.
    pub fn from_config(config: &ManifestConfig) -> Result<Self, SpatialError> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| SpatialError::ConfigurationMissing {
                name: ENV_PROJECT.to_string(),
                hint: "Set it to the Google Cloud project that has Vertex AI enabled, \
                       or pass --provider to use another backend."
                    .to_string(),
            })?;

        let access_token = match config.access_token.clone() {
            Some(token) => token,
            None => gcloud_access_token().ok_or_else(|| SpatialError::ConfigurationMissing {
                name: ENV_ACCESS_TOKEN.to_string(),
                hint: "Export a token (gcloud auth print-access-token) or log in with \
                       `gcloud auth login` so it can be fetched automatically."
                    .to_string(),
            })?,
        };

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SpatialError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            project_id,
            location: config.location.clone(),
            model: config.model.clone(),
            access_token,
            label: format!("Vertex AI ({})", config.model),
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// `generateContent` URL for the configured project, region and model.
    pub fn endpoint(&self) -> String {
        let host = if self.location == "global" {
            "aiplatform.googleapis.com".to_string()
        } else {
            format!("{}-aiplatform.googleapis.com", self.location)
        };
        format!(
            "https://{host}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.project_id, self.location, self.model
        )
    }

    fn request_body(document: &[u8], prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": prompt },
                    { "inlineData": { "mimeType": "application/pdf", "data": encode_document(document) } },
                    { "text": EXTRACT_INSTRUCTION }
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        })
    }
}

#[async_trait]
impl VisionExtractor for VertexGeminiExtractor {
    fn name(&self) -> &str {
        &self.label
    }

    async fn submit(&self, document: &[u8], prompt: &str) -> Result<VisionResponse, SpatialError> {
        let url = self.endpoint();
        let body = Self::request_body(document, prompt);
        info!("Requesting multimodal analysis from {}", self.model);
        debug!("POST {} ({} byte document)", url, document.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpatialError::external(
                        &self.label,
                        format!("request timed out after {}s", self.timeout_secs.unwrap_or(0)),
                    )
                } else {
                    SpatialError::external(&self.label, format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SpatialError::external(
                &self.label,
                format!("HTTP {status}: {detail}"),
            ));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SpatialError::external(&self.label, format!("unreadable response: {e}")))?;

        payload.into_vision_response(&self.label)
    }
}

/// Ask the local gcloud CLI for a token. `None` if gcloud is absent or fails.
fn gcloud_access_token() -> Option<String> {
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .ok()?;
    if !output.status.success() {
        warn!("gcloud auth print-access-token exited with {}", output.status);
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

// ── Response shape ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_vision_response(self, service: &str) -> Result<VisionResponse, SpatialError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(SpatialError::external(service, format!("empty response: {reason}")));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".into());
            return Err(SpatialError::external(
                service,
                format!("response has no text (finish reason: {reason})"),
            ));
        }

        let (input_tokens, output_tokens) = self
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((None, None));

        Ok(VisionResponse {
            text,
            input_tokens,
            output_tokens,
        })
    }
}
