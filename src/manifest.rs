//! The asset manifest: what the vision model found in a PDF, and where.
//!
//! A manifest is parsed from the model's JSON, stamped once with
//! [`AssetManifest::stamp`] (which overrides whatever `created_at` and
//! `source_pdf` the model wrote), and then only ever serialized.

use crate::error::SpatialError;
use crate::geometry::NormalizedBoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Timestamp layout written to `created_at`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Structured index of the visual assets in one PDF.
///
/// Keys the model adds beyond the known fields are kept in `extra` and
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_pdf: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub product_description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One visual asset located on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// 1-based page number.
    pub page_number: u32,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub product_code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub bounding_box: NormalizedBoundingBox,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Models write `null` for text they could not find, e.g. a missing SKU.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Classification of a visual asset.
///
/// Unknown labels from the model are kept verbatim in [`AssetType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    StatsGraph,
    WiringDiagram,
    TechnicalDrawing,
    ProductPhoto,
    Other(String),
}

impl AssetType {
    /// The labels the extraction prompt asks the model to use.
    pub const KNOWN: [AssetType; 4] = [
        AssetType::StatsGraph,
        AssetType::WiringDiagram,
        AssetType::TechnicalDrawing,
        AssetType::ProductPhoto,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            AssetType::StatsGraph => "stats_graph",
            AssetType::WiringDiagram => "wiring_diagram",
            AssetType::TechnicalDrawing => "technical_drawing",
            AssetType::ProductPhoto => "product_photo",
            AssetType::Other(s) => s,
        }
    }
}

impl From<String> for AssetType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "stats_graph" => AssetType::StatsGraph,
            "wiring_diagram" => AssetType::WiringDiagram,
            "technical_drawing" => AssetType::TechnicalDrawing,
            "product_photo" => AssetType::ProductPhoto,
            _ => AssetType::Other(s),
        }
    }
}

impl From<AssetType> for String {
    fn from(t: AssetType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AssetManifest {
    /// Parse the model's raw response text.
    ///
    /// Anything that is not a JSON object with well-formed asset entries
    /// (four-number `bounding_box`, `page_number` ≥ 1) is rejected. There is
    /// no attempt to repair the text.
    pub fn from_model_response(service: &str, text: &str) -> Result<Self, SpatialError> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            SpatialError::external(service, format!("response is not valid JSON: {e}"))
        })?;

        if !value.is_object() {
            return Err(SpatialError::external(
                service,
                "response JSON is not an object",
            ));
        }

        let manifest: AssetManifest = serde_json::from_value(value).map_err(|e| {
            SpatialError::external(service, format!("response is not a valid manifest: {e}"))
        })?;

        if let Some(asset) = manifest.assets.iter().find(|a| a.page_number == 0) {
            return Err(SpatialError::external(
                service,
                format!(
                    "asset '{}' has page_number 0; pages are 1-based",
                    asset.description
                ),
            ));
        }

        Ok(manifest)
    }

    /// Overwrite `created_at` and `source_pdf`, ignoring the model's values.
    pub fn stamp(&mut self, source_pdf: &Path, now: DateTime<Utc>) {
        self.created_at = now.format(CREATED_AT_FORMAT).to_string();
        self.source_pdf = source_basename(source_pdf);
    }

    /// 2-space indented JSON, as persisted on disk.
    pub fn to_pretty_json(&self) -> Result<String, SpatialError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SpatialError::Internal(format!("manifest serialisation: {e}")))
    }

    /// Assets located on the given 1-based page.
    pub fn assets_on_page(&self, page_number: u32) -> impl Iterator<Item = &AssetEntry> {
        self.assets
            .iter()
            .filter(move |a| a.page_number == page_number)
    }
}

/// The file name component of `path`, lossily converted to UTF-8.
pub fn source_basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Where the manifest for `pdf_path` lives: `{output_dir}/{stem}.json`.
pub fn manifest_path(output_dir: &Path, pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "manifest".to_string());
    output_dir.join(format!("{stem}.json"))
}
