//! Configuration for the two pipelines.
//!
//! Environment variables are read exactly once, when a binary calls
//! [`ExtractionConfig::from_env`] or [`ManifestConfig::from_env`]; the
//! pipelines themselves only ever see the resolved structs. Library callers
//! can skip the environment entirely and use the builders.

use crate::error::SpatialError;
use crate::pipeline::render::PageRenderer;
use crate::vision::VisionExtractor;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable overriding the extraction output directory.
pub const ENV_OUTPUT_DIR: &str = "SPATIAL_OUTPUT_DIR";
/// Output directory for cropped PNGs when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_assets";
/// Rendering DPI when nothing else is configured.
pub const DEFAULT_DPI: u32 = 200;

pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const ENV_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
pub const ENV_MODEL: &str = "GEMINI_MODEL_NAME";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_CLOUD_ACCESS_TOKEN";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
/// Directory manifests are written to when nothing else is configured.
pub const DEFAULT_MANIFEST_DIR: &str = "output_manifests";

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for [`crate::extract_asset`].
///
/// # Example
/// ```rust
/// use spatial_assets::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .output_dir("assets")
///     .dpi(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Directory PNGs are written to. Created on demand. Default: `extracted_assets`.
    pub output_dir: PathBuf,

    /// Rendering DPI. Range: 72–600. Default: 200.
    ///
    /// Crops inherit this resolution, so a small wiring diagram at 200 DPI
    /// stays legible when embedded in documentation.
    pub dpi: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Reject inverted or off-canvas boxes before rendering. Default: false.
    ///
    /// Off, such boxes pass through the geometry unchanged and usually end
    /// in [`SpatialError::EmptyCropRegion`] after rendering.
    pub strict_bbox: bool,

    /// Pre-constructed renderer. When `None`, pdfium renders at `dpi`.
    pub renderer: Option<Arc<dyn PageRenderer>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dpi: DEFAULT_DPI,
            password: None,
            strict_bbox: false,
            renderer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("output_dir", &self.output_dir)
            .field("dpi", &self.dpi)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("strict_bbox", &self.strict_bbox)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn PageRenderer>"))
            .finish()
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults, with `output_dir` taken from `SPATIAL_OUTPUT_DIR` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|d| !d.is_empty()) {
            config.output_dir = PathBuf::from(dir);
        }
        config
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn strict_bbox(mut self, v: bool) -> Self {
        self.config.strict_bbox = v;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, SpatialError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(SpatialError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(SpatialError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Manifest ─────────────────────────────────────────────────────────────

/// Configuration for [`crate::generate_manifest`].
#[derive(Clone)]
pub struct ManifestConfig {
    /// Google Cloud project hosting Vertex AI. Required by the Vertex backend.
    pub project_id: Option<String>,

    /// Vertex AI region. Default: `us-central1`.
    pub location: String,

    /// Model identifier. Default: `gemini-3-pro-preview`.
    pub model: String,

    /// OAuth access token for Vertex AI. When `None`, `gcloud auth
    /// print-access-token` is consulted at resolve time.
    pub access_token: Option<String>,

    /// edgequake-llm provider name (e.g. "gemini", "openai"). When set, the
    /// request goes through that provider instead of Vertex AI.
    pub provider_name: Option<String>,

    /// Pre-constructed extractor. Takes precedence over everything else.
    pub extractor: Option<Arc<dyn VisionExtractor>>,

    /// Directory manifests are written to. Default: `output_manifests`.
    pub output_dir: PathBuf,

    /// Timeout for the single model request. Default: none.
    pub request_timeout_secs: Option<u64>,

    /// Output token cap passed to edgequake-llm providers. Default: 8192.
    pub max_tokens: usize,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: DEFAULT_LOCATION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            access_token: None,
            provider_name: None,
            extractor: None,
            output_dir: PathBuf::from(DEFAULT_MANIFEST_DIR),
            request_timeout_secs: None,
            max_tokens: 8192,
        }
    }
}

impl fmt::Debug for ManifestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("provider_name", &self.provider_name)
            .field("extractor", &self.extractor.as_ref().map(|e| e.name().to_string()))
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ManifestConfig {
    pub fn builder() -> ManifestConfigBuilder {
        ManifestConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve `GOOGLE_CLOUD_PROJECT`, `GOOGLE_CLOUD_LOCATION`,
    /// `GEMINI_MODEL_NAME` and `GOOGLE_CLOUD_ACCESS_TOKEN`.
    ///
    /// A missing project is not an error here; [`crate::resolve_extractor`]
    /// reports it only if the Vertex backend is actually selected.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        config.project_id = get(ENV_PROJECT);
        if let Some(location) = get(ENV_LOCATION) {
            config.location = location;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        config.access_token = get(ENV_ACCESS_TOKEN);
        config
    }
}

/// Builder for [`ManifestConfig`].
pub struct ManifestConfigBuilder {
    config: ManifestConfig,
}

impl fmt::Debug for ManifestConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ManifestConfigBuilder {
    pub fn project_id(mut self, project: impl Into<String>) -> Self {
        self.config.project_id = Some(project.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.config.location = location.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn VisionExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ManifestConfig, SpatialError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(SpatialError::InvalidConfig("model must not be empty".into()));
        }
        if c.location.trim().is_empty() {
            return Err(SpatialError::InvalidConfig(
                "location must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
