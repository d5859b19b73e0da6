//! Crop geometry: normalized 0–1000 bounding boxes → pixel boxes.
//!
//! The vision model reports boxes on a fixed virtual canvas of 1000 × 1000
//! units, independent of the page's real size or aspect ratio. To crop a
//! rendered page we pad the box by 5 % of its own extent on each axis (so
//! axis labels and legends that hug a diagram survive), clamp to the canvas,
//! then stretch the canvas anisotropically onto the image's pixel grid.
//!
//! ```text
//!   [ymin, xmin, ymax, xmax]  ──pad 5%──▶  clamp [0,1000]  ──× w/1000, h/1000──▶  (left, top, right, bottom)
//! ```
//!
//! Everything here is pure `f64` arithmetic. Ordering (`ymin ≤ ymax`) and
//! range are *not* checked by [`crop_geometry`]; an inverted box passes
//! through padded and clamped. [`NormalizedBoundingBox::validate_strict`]
//! exists for callers that want to reject such boxes up front.

use crate::error::SpatialError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of the virtual canvas the model reports coordinates on.
pub const CANVAS_SIZE: f64 = 1000.0;

/// Fraction of each axis' extent added on both sides before cropping.
pub const PADDING_RATIO: f64 = 0.05;

/// A box on the 0–1000 canvas, serialized as `[ymin, xmin, ymax, xmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 4]")]
pub struct NormalizedBoundingBox {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,
}

/// Pixel boundaries on one specific rendered page image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl NormalizedBoundingBox {
    pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    /// Build a box from a slice, requiring exactly four values.
    pub fn from_slice(values: &[f64]) -> Result<Self, SpatialError> {
        match values {
            [ymin, xmin, ymax, xmax] => Ok(Self::new(*ymin, *xmin, *ymax, *xmax)),
            _ => Err(SpatialError::invalid_bbox(format!(
                "must contain exactly 4 coordinates, got {}: {:?}",
                values.len(),
                values
            ))),
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.ymin, self.xmin, self.ymax, self.xmax]
    }

    /// Reject inverted boxes and coordinates off the canvas.
    pub fn validate_strict(&self) -> Result<(), SpatialError> {
        for (name, v) in [
            ("ymin", self.ymin),
            ("xmin", self.xmin),
            ("ymax", self.ymax),
            ("xmax", self.xmax),
        ] {
            if !v.is_finite() || !(0.0..=CANVAS_SIZE).contains(&v) {
                return Err(SpatialError::invalid_bbox(format!(
                    "{name}={v} is outside [0, {CANVAS_SIZE}]"
                )));
            }
        }
        if self.ymin > self.ymax {
            return Err(SpatialError::invalid_bbox(format!(
                "ymin={} is greater than ymax={}",
                self.ymin, self.ymax
            )));
        }
        if self.xmin > self.xmax {
            return Err(SpatialError::invalid_bbox(format!(
                "xmin={} is greater than xmax={}",
                self.xmin, self.xmax
            )));
        }
        Ok(())
    }

    /// Apply the safety margin and clamp every edge to the canvas.
    ///
    /// The margin is computed from the raw extent, so an inverted box gets a
    /// negative margin and is widened further rather than corrected.
    pub fn padded(&self) -> Self {
        let h_pad = (self.ymax - self.ymin) * PADDING_RATIO;
        let w_pad = (self.xmax - self.xmin) * PADDING_RATIO;

        Self {
            ymin: clamp_canvas(self.ymin - h_pad),
            xmin: clamp_canvas(self.xmin - w_pad),
            ymax: clamp_canvas(self.ymax + h_pad),
            xmax: clamp_canvas(self.xmax + w_pad),
        }
    }

    /// Scale onto a `width × height` pixel grid without padding.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelBox {
        let (w, h) = (f64::from(width), f64::from(height));
        PixelBox {
            left: (self.xmin / CANVAS_SIZE) * w,
            top: (self.ymin / CANVAS_SIZE) * h,
            right: (self.xmax / CANVAS_SIZE) * w,
            bottom: (self.ymax / CANVAS_SIZE) * h,
        }
    }
}

impl TryFrom<Vec<f64>> for NormalizedBoundingBox {
    type Error = SpatialError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<NormalizedBoundingBox> for [f64; 4] {
    fn from(b: NormalizedBoundingBox) -> Self {
        b.to_array()
    }
}

impl fmt::Display for NormalizedBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.ymin, self.xmin, self.ymax, self.xmax
        )
    }
}

impl PixelBox {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

fn clamp_canvas(v: f64) -> f64 {
    // max/min rather than f64::clamp: NaN must not panic here.
    v.max(0.0).min(CANVAS_SIZE)
}

/// Convert a raw `[ymin, xmin, ymax, xmax]` box into pixel boundaries on a
/// `width × height` image, padded by [`PADDING_RATIO`] and clamped to the page.
///
/// Fails only when `bbox` does not hold exactly four numbers.
pub fn crop_geometry(bbox: &[f64], width: u32, height: u32) -> Result<PixelBox, SpatialError> {
    let bbox = NormalizedBoundingBox::from_slice(bbox)?;
    Ok(bbox.padded().to_pixels(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_box(b: PixelBox, left: f64, top: f64, right: f64, bottom: f64) {
        assert_close(b.left, left);
        assert_close(b.top, top);
        assert_close(b.right, right);
        assert_close(b.bottom, bottom);
    }

    #[test]
    fn full_width_diagram_on_square_page() {
        // h_pad = 15, w_pad = 45, no clamping needed.
        let b = crop_geometry(&[100.0, 50.0, 400.0, 950.0], 1000, 1000).unwrap();
        assert_box(b, 5.0, 85.0, 995.0, 415.0);
    }

    #[test]
    fn corner_box_clamps_and_scales_anisotropically() {
        // Padded to [-5, -5, 105, 105], clamped to [0, 0, 105, 105].
        let b = crop_geometry(&[0.0, 0.0, 100.0, 100.0], 2000, 1000).unwrap();
        assert_box(b, 0.0, 0.0, 210.0, 105.0);
    }

    #[test]
    fn far_corner_clamps_to_page_edge() {
        let b = crop_geometry(&[900.0, 900.0, 1000.0, 1000.0], 1700, 2200).unwrap();
        assert_close(b.right, 1700.0);
        assert_close(b.bottom, 2200.0);
        // 900 - 5 = 895
        assert_close(b.left, 895.0 / 1000.0 * 1700.0);
        assert_close(b.top, 895.0 / 1000.0 * 2200.0);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        for bad in [
            &[][..],
            &[1.0, 2.0, 3.0][..],
            &[1.0, 2.0, 3.0, 4.0, 5.0][..],
        ] {
            let err = crop_geometry(bad, 1000, 1000).unwrap_err();
            assert!(
                matches!(err, SpatialError::InvalidBoundingBox { .. }),
                "len {} → {err:?}",
                bad.len()
            );
        }
    }

    #[test]
    fn same_input_same_output() {
        let bbox = [123.4, 56.7, 789.0, 912.3];
        let first = crop_geometry(&bbox, 1654, 2339).unwrap();
        for _ in 0..10 {
            assert_eq!(crop_geometry(&bbox, 1654, 2339).unwrap(), first);
        }
    }

    #[test]
    fn well_formed_boxes_stay_inside_the_page() {
        let dims = [(1, 1), (1000, 1000), (2000, 1000), (850, 1100), (4961, 7016)];
        let coords = [0.0, 1.0, 33.3, 250.0, 499.5, 500.0, 975.0, 999.0, 1000.0];
        for &(w, h) in &dims {
            for &a in &coords {
                for &b in &coords {
                    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                    let px = crop_geometry(&[lo, lo, hi, hi], w, h).unwrap();
                    assert!(0.0 <= px.left && px.left <= px.right, "{px:?}");
                    assert!(px.right <= f64::from(w), "{px:?} on {w}x{h}");
                    assert!(0.0 <= px.top && px.top <= px.bottom, "{px:?}");
                    assert!(px.bottom <= f64::from(h), "{px:?} on {w}x{h}");
                }
            }
        }
    }

    #[test]
    fn padding_never_shrinks_the_box() {
        let boxes = [
            [100.0, 50.0, 400.0, 950.0],
            [0.0, 0.0, 1000.0, 1000.0],
            [10.0, 990.0, 20.0, 1000.0],
            [500.0, 500.0, 500.0, 500.0],
            [2.0, 3.0, 997.0, 998.0],
        ];
        for raw in boxes {
            let tight = NormalizedBoundingBox::from_slice(&raw)
                .unwrap()
                .to_pixels(1240, 1754);
            let padded = crop_geometry(&raw, 1240, 1754).unwrap();
            assert!(padded.left <= tight.left, "{raw:?}");
            assert!(padded.top <= tight.top, "{raw:?}");
            assert!(padded.right >= tight.right, "{raw:?}");
            assert!(padded.bottom >= tight.bottom, "{raw:?}");
        }
    }

    #[test]
    fn zero_extent_box_gets_no_padding() {
        let b = crop_geometry(&[500.0, 250.0, 500.0, 250.0], 1000, 1000).unwrap();
        assert_box(b, 250.0, 500.0, 250.0, 500.0);
        assert_close(b.width(), 0.0);
        assert_close(b.height(), 0.0);
    }

    #[test]
    fn inverted_box_passes_through_widened() {
        // ymax < ymin: h_pad = -15, so ymin' = 415, ymax' = 85. Not corrected.
        let b = crop_geometry(&[400.0, 50.0, 100.0, 950.0], 1000, 1000).unwrap();
        assert_close(b.top, 415.0);
        assert_close(b.bottom, 85.0);
        assert!(b.height() < 0.0);
    }

    #[test]
    fn out_of_range_coordinates_are_clamped() {
        let b = crop_geometry(&[-200.0, -10.0, 1500.0, 1200.0], 800, 600).unwrap();
        assert_box(b, 0.0, 0.0, 800.0, 600.0);
    }

    #[test]
    fn strict_validation() {
        assert!(NormalizedBoundingBox::new(100.0, 50.0, 400.0, 950.0)
            .validate_strict()
            .is_ok());
        assert!(NormalizedBoundingBox::new(400.0, 50.0, 100.0, 950.0)
            .validate_strict()
            .is_err());
        assert!(NormalizedBoundingBox::new(100.0, 950.0, 400.0, 50.0)
            .validate_strict()
            .is_err());
        assert!(NormalizedBoundingBox::new(100.0, 50.0, 1000.5, 950.0)
            .validate_strict()
            .is_err());
        assert!(NormalizedBoundingBox::new(f64::NAN, 50.0, 400.0, 950.0)
            .validate_strict()
            .is_err());
    }

    #[test]
    fn serde_uses_plain_array() {
        let b: NormalizedBoundingBox = serde_json::from_str("[100, 50, 400, 950]").unwrap();
        assert_eq!(b, NormalizedBoundingBox::new(100.0, 50.0, 400.0, 950.0));
        assert_eq!(
            serde_json::to_string(&b).unwrap(),
            "[100.0,50.0,400.0,950.0]"
        );
        assert!(serde_json::from_str::<NormalizedBoundingBox>("[1, 2, 3]").is_err());
    }
}
