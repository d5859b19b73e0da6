//! Vision model backends for manifest generation.
//!
//! The manifest pipeline only needs one capability from a model: take a PDF
//! and a prompt, return text that should be JSON. [`VisionExtractor`] is that
//! seam. Two backends ship with the crate:
//!
//! * [`VertexGeminiExtractor`]: Gemini on Vertex AI via its REST API. This is
//!   the default and is configured from `GOOGLE_CLOUD_*` variables.
//! * [`LlmProviderExtractor`]: any edgequake-llm provider, selected by name.
//!
//! Neither backend retries: one request per invocation.

pub mod provider;
pub mod vertex;

pub use provider::LlmProviderExtractor;
pub use vertex::VertexGeminiExtractor;

use crate::config::ManifestConfig;
use crate::error::SpatialError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Raw result of one model call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionResponse {
    /// Response body, expected to be a JSON document.
    pub text: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// A multimodal model that reads a PDF and answers a prompt.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    /// Human-readable backend name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Send `document` (raw PDF bytes) with `prompt` in a single request.
    async fn submit(&self, document: &[u8], prompt: &str) -> Result<VisionResponse, SpatialError>;
}

/// Pick the extractor for this process, from most-specific to least-specific:
///
/// 1. **Pre-built** (`config.extractor`): used as-is.
/// 2. **Named provider** (`config.provider_name`): an edgequake-llm provider
///    created with `config.model`; its API key comes from that provider's
///    usual environment variable.
/// 3. **Vertex AI**: requires `project_id` and an access token; either one
///    missing is a [`SpatialError::ConfigurationMissing`].
///
/// Called before any request is sent, so configuration problems surface
/// without touching the network.
pub fn resolve_extractor(config: &ManifestConfig) -> Result<Arc<dyn VisionExtractor>, SpatialError> {
    if let Some(ref extractor) = config.extractor {
        debug!("Using pre-built extractor '{}'", extractor.name());
        return Ok(Arc::clone(extractor));
    }

    if let Some(ref name) = config.provider_name {
        let extractor = LlmProviderExtractor::from_name(name, &config.model, config.max_tokens)?;
        return Ok(Arc::new(extractor));
    }

    Ok(Arc::new(VertexGeminiExtractor::from_config(config)?))
}
