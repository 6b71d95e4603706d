//! Fit-inside geometry: uniform scale plus centring offsets.
//!
//! Two flavours exist because the two output paths live in different
//! coordinate spaces. Raster output is placed on a 1200 × 1200 pixel grid,
//! so sizes and offsets are whole pixels. Vector output is placed on a
//! 288 × 288 point page (4 in at 72 pt/in) where fractional offsets are
//! exact and no rounding is needed.
//!
//! ## Rounding policy (raster)
//!
//! * The longer source axis always maps to exactly [`TARGET_PX`].
//! * The shorter axis is `1200 × short / long`, rounded half-up, and never
//!   less than one pixel.
//! * Offsets are `(1200 − size) / 2` with floor division, so for an odd
//!   remainder the extra pixel of padding lands on the right / bottom.
//!
//! Content is never cropped; this is a letterbox / pillarbox fit.

use crate::error::ResizeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Edge length of the output canvas in pixels.
pub const TARGET_PX: u32 = 1200;

/// Resolution tagged on every raster output.
pub const TARGET_DPI: u32 = 300;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Edge length of the output PDF page in points: 1200 / 300 × 72 = 288.
pub const TARGET_PT: f32 = TARGET_PX as f32 / TARGET_DPI as f32 * POINTS_PER_INCH;

/// Where scaled raster content sits on the 1200 × 1200 canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// `min(1200 / width, 1200 / height)`.
    pub scale: f64,
    /// Scaled content width in pixels.
    pub width: u32,
    /// Scaled content height in pixels.
    pub height: u32,
    /// Left padding in pixels.
    pub x: u32,
    /// Top padding in pixels.
    pub y: u32,
}

impl Placement {
    /// Right padding in pixels.
    pub fn right(&self) -> u32 {
        TARGET_PX - self.x - self.width
    }

    /// Bottom padding in pixels.
    pub fn bottom(&self) -> u32 {
        TARGET_PX - self.y - self.height
    }

    /// True when the source already has the target size and needs no resampling.
    pub fn is_identity(&self, source_width: u32, source_height: u32) -> bool {
        self.width == source_width && self.height == source_height
    }
}

/// Where a scaled PDF page sits on the 288 × 288 pt output page.
///
/// Offsets are measured from the bottom-left corner, as in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorPlacement {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
}

/// Compute the raster placement for a `width × height` source.
///
/// `path` is only used to name the file in the error for a zero-sized source.
pub fn fit_raster(width: u32, height: u32, path: &Path) -> Result<Placement, ResizeError> {
    if width == 0 || height == 0 {
        return Err(ResizeError::decode(
            path,
            format!("image has no pixels ({width}x{height})"),
        ));
    }

    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    let scaled_short = scale_half_up(short, long).clamp(1, TARGET_PX);

    let (scaled_w, scaled_h) = if width >= height {
        (TARGET_PX, scaled_short)
    } else {
        (scaled_short, TARGET_PX)
    };

    Ok(Placement {
        scale: TARGET_PX as f64 / long as f64,
        width: scaled_w,
        height: scaled_h,
        x: (TARGET_PX - scaled_w) / 2,
        y: (TARGET_PX - scaled_h) / 2,
    })
}

/// Compute the vector placement for a page of `width_pt × height_pt` points.
pub fn fit_vector(width_pt: f32, height_pt: f32, path: &Path) -> Result<VectorPlacement, ResizeError> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(width_pt) || !valid(height_pt) {
        return Err(ResizeError::decode(
            path,
            format!("page has an unusable MediaBox ({width_pt} x {height_pt} pt)"),
        ));
    }

    let scale = TARGET_PT / width_pt.max(height_pt);
    Ok(VectorPlacement {
        scale,
        x: (TARGET_PT - width_pt * scale) / 2.0,
        y: (TARGET_PT - height_pt * scale) / 2.0,
    })
}

/// `round_half_up(TARGET_PX × short / long)` in integer arithmetic.
fn scale_half_up(short: u32, long: u32) -> u32 {
    let num = 2 * TARGET_PX as u64 * short as u64 + long as u64;
    (num / (2 * long as u64)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(w: u32, h: u32) -> Placement {
        fit_raster(w, h, Path::new("test.png")).expect("valid size")
    }

    #[test]
    fn target_page_is_four_inches() {
        assert_eq!(TARGET_PT, 288.0);
    }

    #[test]
    fn landscape_2000x1000() {
        let p = fit(2000, 1000);
        assert_eq!(p.scale, 0.6);
        assert_eq!((p.width, p.height), (1200, 600));
        assert_eq!((p.x, p.y), (0, 300));
        assert_eq!(p.bottom(), 300);
    }

    #[test]
    fn small_square_upscales() {
        let p = fit(300, 300);
        assert_eq!(p.scale, 4.0);
        assert_eq!((p.width, p.height), (1200, 1200));
        assert_eq!((p.x, p.y), (0, 0));
    }

    #[test]
    fn portrait_is_pillarboxed() {
        let p = fit(500, 1000);
        assert_eq!((p.width, p.height), (600, 1200));
        assert_eq!((p.x, p.y), (300, 0));
        assert_eq!(p.right(), 300);
    }

    #[test]
    fn odd_remainder_puts_extra_pixel_bottom() {
        let p = fit(1200, 601);
        assert_eq!(p.height, 601);
        assert_eq!(p.y, 299);
        assert_eq!(p.bottom(), 300);
    }

    #[test]
    fn short_axis_rounds_half_up() {
        // 1200 * 1 / 16 = 75.0 exactly; 1200 * 3 / 1600 = 2.25 -> 2; 1200 * 5 / 1600 = 3.75 -> 4
        assert_eq!(fit(16, 1).height, 75);
        assert_eq!(fit(1600, 3).height, 2);
        assert_eq!(fit(1600, 5).height, 4);
        // 1200 * 1 / 800 = 1.5 -> 2
        assert_eq!(fit(800, 1).height, 2);
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        let p = fit(100_000, 1);
        assert_eq!((p.width, p.height), (1200, 1));
        assert_eq!(p.y, 599);
    }

    #[test]
    fn longer_axis_always_maps_to_target() {
        for (w, h) in [(1, 1), (7, 3), (3, 7), (1199, 1201), (4000, 3000), (999, 1000)] {
            let p = fit(w, h);
            assert_eq!(p.width.max(p.height), TARGET_PX, "{w}x{h}");
            assert!(p.x + p.width <= TARGET_PX && p.y + p.height <= TARGET_PX);
            assert!(p.right().abs_diff(p.x) <= 1, "{w}x{h}");
            assert!(p.bottom().abs_diff(p.y) <= 1, "{w}x{h}");
        }
    }

    #[test]
    fn zero_sized_source_is_rejected() {
        let err = fit_raster(0, 10, Path::new("blank.png")).unwrap_err();
        assert!(matches!(err, ResizeError::DecodeError { .. }));
    }

    #[test]
    fn vector_landscape_page() {
        let v = fit_vector(200.0, 100.0, Path::new("p.pdf")).unwrap();
        assert!((v.scale - 1.44).abs() < 1e-6);
        assert!(v.x.abs() < 1e-4);
        assert!((v.y - 72.0).abs() < 1e-4);
    }

    #[test]
    fn vector_a4_portrait() {
        let v = fit_vector(595.0, 842.0, Path::new("a4.pdf")).unwrap();
        assert!((842.0 * v.scale - TARGET_PT).abs() < 1e-3);
        assert!(v.y.abs() < 1e-3);
        assert!((v.x * 2.0 + 595.0 * v.scale - TARGET_PT).abs() < 1e-3);
    }

    #[test]
    fn vector_rejects_degenerate_mediabox() {
        assert!(fit_vector(0.0, 100.0, Path::new("p.pdf")).is_err());
        assert!(fit_vector(f32::NAN, 100.0, Path::new("p.pdf")).is_err());
    }
}
