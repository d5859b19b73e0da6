//! Snap a floating-point [`PixelBox`] to whole pixels and cut it out.
//!
//! Edges are rounded half-to-even, the same rule the original cropping
//! library applied, then clamped to the image. A region with no area is an
//! error: there is nothing meaningful to write as a PNG.

use crate::error::SpatialError;
use crate::geometry::PixelBox;
use image::DynamicImage;
use tracing::debug;

/// Integer crop rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn snap(v: f64, max: u32) -> u32 {
    if v.is_nan() {
        return 0;
    }
    v.round_ties_even().clamp(0.0, f64::from(max)) as u32
}

/// Convert `px` into a region of a `width × height` image.
pub fn pixel_region(px: &PixelBox, width: u32, height: u32) -> Result<PixelRegion, SpatialError> {
    let left = snap(px.left, width);
    let top = snap(px.top, height);
    let right = snap(px.right, width);
    let bottom = snap(px.bottom, height);

    if right <= left || bottom <= top {
        return Err(SpatialError::EmptyCropRegion {
            width,
            height,
            left,
            top,
            right,
            bottom,
        });
    }

    Ok(PixelRegion {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

/// Crop `image` to `px`. The source image is left untouched.
pub fn crop_page(image: &DynamicImage, px: &PixelBox) -> Result<DynamicImage, SpatialError> {
    let region = pixel_region(px, image.width(), image.height())?;
    debug!(
        "Cropping {}x{}+{}+{} from {}x{} page",
        region.width,
        region.height,
        region.x,
        region.y,
        image.width(),
        image.height()
    );
    Ok(image.crop_imm(region.x, region.y, region.width, region.height))
}
