//! Prompts for the manifest-generation model call.
//!
//! Kept in one place so tests can inspect exactly what the model is told.

use crate::manifest::AssetType;

/// Closing user instruction sent after the PDF attachment.
pub const EXTRACT_INSTRUCTION: &str = "Extract the visual asset manifest as JSON.";

const PROMPT_TEMPLATE: &str = r#"You are a Computer Vision Metadata Engine for Technical Documentation.
Your goal is to analyze the provided PDF and generate a structured "Image Manifest" of all significant visual assets.

OUTPUT FORMAT (JSON Object):
{
    "source_pdf": "{source_pdf}",
    "product_name": "<string: Primary product name>",
    "product_description": "<string: 1-2 sentence technical summary>",
    "created_at": "ISO-8601-Timestamp",
    "assets": [
        {
            "page_number": <int, 1-based>,
            "type": "<{asset_types}>",
            "model_name": "<string: Specific product variant name>",
            "product_code": "<string: 12NC or SKU if available>",
            "description": "<detailed description of the asset content>",
            "bounding_box": [ymin, xmin, ymax, xmax]
        }
    ]
}

Bounding box coordinates are normalized to a 0-1000 canvas for both axes, regardless of the page size.

TARGET ASSET CLASSIFICATIONS:
- Wiring Diagrams: Schematics showing electrical connections and terminals.
- Dimensional Drawings: Technical sketches providing physical measurements.
- Performance Graphs: Charts showing efficiency, operating windows, or spectral response.
- Product Photos: High-quality isolated images of the actual hardware.

EXTRACTION RULES:
1. PRODUCT ASSOCIATION: Link every asset to a specific model name and code found in headers or order data tables.
2. BOUNDING BOXES: Provide inclusive coordinates. For full-page-width diagrams, use xmin: 50, xmax: 950.
3. INCLUSIVITY: Bounding boxes must include all axes, legends, labels, and captions.
4. STRICT GROUNDING: Only index assets clearly visible in the document. Exclude decorative elements, logos, or icons.
5. NO HALLUCINATION: Do not assume diagrams exist if they are not explicitly shown."#;

/// Build the extraction prompt for a PDF named `source_pdf`.
pub fn manifest_prompt(source_pdf: &str) -> String {
    let asset_types = AssetType::KNOWN
        .iter()
        .map(AssetType::as_str)
        .collect::<Vec<_>>()
        .join("|");

    PROMPT_TEMPLATE
        .replace("{source_pdf}", source_pdf)
        .replace("{asset_types}", &asset_types)
}
