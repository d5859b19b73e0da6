//! edgequake-llm backend: any provider the factory knows, selected by name.
//!
//! The PDF travels as a base64 attachment with MIME type `application/pdf`.
//! Whether the provider forwards that attachment to a model that can read
//! PDFs is the provider's business; Gemini-family models do.

use super::{VisionExtractor, VisionResponse};
use crate::error::SpatialError;
use crate::pipeline::encode::encode_document;
use crate::prompts::EXTRACT_INSTRUCTION;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{debug, info};

/// Manifest extraction through an edgequake-llm provider.
pub struct LlmProviderExtractor {
    provider: Arc<dyn LLMProvider>,
    label: String,
    max_tokens: usize,
}

impl LlmProviderExtractor {
    /// Wrap an existing provider.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, max_tokens: usize) -> Self {
        Self {
            provider,
            label: label.into(),
            max_tokens,
        }
    }

    /// Create the named provider via [`ProviderFactory::create_llm_provider`].
    ///
    /// Its API key is read from the provider's usual environment variable;
    /// a missing key surfaces here as [`SpatialError::ConfigurationMissing`].
    pub fn from_name(provider_name: &str, model: &str, max_tokens: usize) -> Result<Self, SpatialError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            SpatialError::ConfigurationMissing {
                name: format!("provider '{provider_name}'"),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(
            provider,
            format!("{provider_name} ({model})"),
            max_tokens,
        ))
    }

    fn pdf_attachment(document: &[u8]) -> ImageData {
        ImageData::new(encode_document(document), "application/pdf")
    }

    fn build_messages(document: &[u8], prompt: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(prompt),
            ChatMessage::user_with_images(EXTRACT_INSTRUCTION, vec![Self::pdf_attachment(document)]),
        ]
    }
}

#[async_trait]
impl VisionExtractor for LlmProviderExtractor {
    fn name(&self) -> &str {
        &self.label
    }

    async fn submit(&self, document: &[u8], prompt: &str) -> Result<VisionResponse, SpatialError> {
        let messages = Self::build_messages(document, prompt);
        let options = CompletionOptions {
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        info!("Requesting multimodal analysis from {}", self.label);
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| SpatialError::external(&self.label, format!("{e}")))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        Ok(VisionResponse {
            text: response.content,
            input_tokens: Some(response.prompt_tokens as u64),
            output_tokens: Some(response.completion_tokens as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_travels_as_base64_attachment() {
        let attachment = LlmProviderExtractor::pdf_attachment(b"%PDF-1.7");
        assert_eq!(attachment.mime_type, "application/pdf");
        assert_eq!(attachment.data, "JVBERi0xLjc=");
    }

    #[test]
    fn system_prompt_then_user_turn() {
        let messages = LlmProviderExtractor::build_messages(b"%PDF-1.7", "PROMPT");
        assert_eq!(messages.len(), 2);
    }
}
