//! PDF rasterisation: render the first page to a `DynamicImage` via pdfium.
//!
//! The page is rendered at 300 DPI (scale 300 / 72 from PDF points), the
//! same density as the final output, so the compositor only ever shrinks or
//! mildly enlarges it. Very large pages (posters) are capped at
//! [`MAX_RENDER_PX`] on either edge: anything beyond four times the output
//! size is resampled away anyway and would only cost memory.

use crate::error::ResizeError;
use crate::geometry::{POINTS_PER_INCH, TARGET_DPI, TARGET_PX};
use crate::pipeline::pdfium;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Longest rendered edge in pixels.
pub const MAX_RENDER_PX: u32 = TARGET_PX * 4;

/// Rasterise page 1 of `pdf_path` at 300 DPI.
pub fn render_first_page(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DynamicImage, ResizeError> {
    let pdfium = pdfium::bind()?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ResizeError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ResizeError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ResizeError::decode(pdf_path, err_str)
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages == 0 {
        return Err(ResizeError::decode(pdf_path, "PDF has no pages"));
    }
    info!("PDF loaded: {} pages, rasterising page 1", total_pages);
    if total_pages > 1 {
        debug!("Ignoring pages 2..={}", total_pages);
    }

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(TARGET_DPI as f32 / POINTS_PER_INCH)
        .set_maximum_width(MAX_RENDER_PX as i32)
        .set_maximum_height(MAX_RENDER_PX as i32)
        .render_form_data(true);

    let page = pages
        .get(0)
        .map_err(|e| ResizeError::RasterisationFailed {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| ResizeError::RasterisationFailed {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page 1 → {}x{} px",
        image.width(),
        image.height()
    );

    Ok(image)
}
