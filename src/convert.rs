//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline for one input and writes up to three
//! sibling files; [`inspect`] reports what a run would do without decoding
//! pixels or writing anything.

use crate::config::ConversionConfig;
use crate::error::ResizeError;
use crate::geometry::{fit_raster, fit_vector, POINTS_PER_INCH, TARGET_DPI};
use crate::output::{
    output_path, ConversionReport, OutputFormat, PlacementSummary, SourceInfo, StagedOutputs,
};
use crate::pipeline::input::{self, InputKind, Source};
use crate::pipeline::vector::{self, PageGeometry};
use crate::pipeline::{compose, encode, render};
use crate::progress::Stage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Normalise `input` and write its outputs next to it.
///
/// # Errors
/// Every error is terminal and leaves no output files behind:
/// - `FileNotFound` / `PermissionDenied` for unusable paths
/// - `UnsupportedFormat` for extensions other than tiff, jpg, png, pdf
/// - `InvalidOptionCombination` for `preserve_vector` misuse
/// - `DecodeError` for corrupt or empty content
pub fn convert(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, ResizeError> {
    let input_path = input_path.as_ref();
    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_conversion_start(input_path);
    }

    let result = run(input_path, config);

    if let Some(cb) = progress {
        match &result {
            Ok(report) => cb.on_conversion_complete(report.outputs.len()),
            Err(e) => cb.on_conversion_error(&e.to_string()),
        }
    }
    result
}

fn run(input_path: &Path, config: &ConversionConfig) -> Result<ConversionReport, ResizeError> {
    let start = Instant::now();
    info!("Starting conversion: {}", input_path.display());

    // ── Step 1: Validate input and options ───────────────────────────────
    let path = input::resolve_local(input_path)?;
    let kind = InputKind::from_path(&path)?;
    input::validate_options(kind, config)?;
    let stage = |s: Stage| {
        if let Some(cb) = &config.progress_callback {
            cb.on_stage(s);
        }
    };

    // ── Step 2: Load ─────────────────────────────────────────────────────
    stage(Stage::Load);
    let source = input::load(&path, kind, config)?;

    // ── Step 3: Place, compose and encode ────────────────────────────────
    let mut staged = StagedOutputs::new();
    let (placement, vector_preserved) = match source {
        Source::Raster(image) => {
            let (w, h) = (image.width(), image.height());
            let placement = fit_raster(w, h, &path)?;
            debug!("Raster placement for {}x{}: {:?}", w, h, placement);

            stage(Stage::Compose);
            let canvas = compose::compose(&image, &placement);
            drop(image);

            for format in config.output_formats() {
                stage(Stage::Encode(format));
                let bytes = encode::encode(&canvas, format)?;
                staged.stage(format, output_path(&path, format), &bytes)?;
            }
            (PlacementSummary::raster(w, h, &placement), false)
        }
        Source::Vector(page) => {
            let (w, h) = (page.width(), page.height());
            let placement = fit_vector(w, h, &path)?;
            debug!("Vector placement for {}x{} pt: {:?}", w, h, placement);

            let format = OutputFormat::Pdf;
            stage(Stage::Encode(format));
            let bytes = page.into_pdf(&placement)?;
            staged.stage(format, output_path(&path, format), &bytes)?;
            (PlacementSummary::vector(w, h, &placement), true)
        }
    };

    // ── Step 4: Move outputs into place ──────────────────────────────────
    stage(Stage::Commit);
    let outputs = staged.commit(config.progress_callback.as_ref())?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} outputs in {}ms",
        outputs.len(),
        duration_ms
    );

    Ok(ConversionReport {
        input: path,
        kind,
        vector_preserved,
        placement,
        outputs,
        duration_ms,
    })
}

/// Report source size, placement and planned outputs without converting.
///
/// Reads only headers: image dimensions from the file header, PDF page
/// geometry from the page tree via lopdf. Does not need pdfium. The page
/// tree is readable without decrypting, so `password` is not checked here;
/// a wrong password only surfaces from [`convert`].
pub fn inspect(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<SourceInfo, ResizeError> {
    let path = input::resolve_local(input_path.as_ref())?;
    let kind = InputKind::from_path(&path)?;
    input::validate_options(kind, config)?;

    let (placement, page_count, encrypted) = if kind.is_pdf() {
        input::check_pdf_magic(&path)?;
        let page = PageGeometry::read(&path)?;
        debug!("Page 1 geometry: {:?}", page);
        let summary = if config.preserve_vector {
            if page.encrypted {
                return Err(vector::encrypted_error(&path));
            }
            let (w_pt, h_pt) = page.media_size();
            PlacementSummary::vector(w_pt, h_pt, &fit_vector(w_pt, h_pt, &path)?)
        } else {
            let (w_pt, h_pt) = page.display_size();
            let (w, h) = predicted_render_size(w_pt, h_pt);
            PlacementSummary::raster(w, h, &fit_raster(w, h, &path)?)
        };
        (summary, Some(page.page_count), page.encrypted)
    } else {
        let (w, h) = input::image_dimensions(&path)?;
        (
            PlacementSummary::raster(w, h, &fit_raster(w, h, &path)?),
            None,
            false,
        )
    };

    let planned_outputs = config
        .output_formats()
        .into_iter()
        .map(|f| output_path(&path, f))
        .collect();

    Ok(SourceInfo {
        input: path,
        kind,
        page_count,
        encrypted,
        vector_preserved: config.preserve_vector,
        placement,
        planned_outputs,
    })
}

/// Pixel size pdfium will produce for a page displayed at `w_pt × h_pt`
/// (crop box, already turned for `/Rotate`) at 300 DPI, including the
/// [`render::MAX_RENDER_PX`] cap.
fn predicted_render_size(w_pt: f32, h_pt: f32) -> (u32, u32) {
    let dpi_scale = TARGET_DPI as f32 / POINTS_PER_INCH;
    let longest = w_pt.max(h_pt) * dpi_scale;
    let cap = (render::MAX_RENDER_PX as f32 / longest).min(1.0);
    let to_px = |pt: f32| ((pt * dpi_scale * cap).round() as u32).max(1);
    (to_px(w_pt), to_px(h_pt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::vector::fixtures::page_pdf;
    use crate::output::Unit;
    use lopdf::dictionary;

    #[test]
    fn render_size_is_300_dpi() {
        // US Letter: 8.5 x 11 in
        assert_eq!(predicted_render_size(612.0, 792.0), (2550, 3300));
    }

    #[test]
    fn render_size_is_capped_for_posters() {
        // A0 portrait
        let (w, h) = predicted_render_size(2384.0, 3370.0);
        assert_eq!(h, render::MAX_RENDER_PX);
        assert!(w < h);
    }

    #[test]
    fn inspect_predicts_render_of_rotated_cropped_page() {
        let dir = tempfile::tempdir().unwrap();
        // Letter page, cropped by half an inch all round, turned a quarter.
        let path = page_pdf(
            dir.path(),
            "turned.pdf",
            [0, 0, 612, 792],
            dictionary! {
                "CropBox" => vec![36.into(), 36.into(), 576.into(), 756.into()],
                "Rotate" => 270,
            },
            false,
        );

        let info = inspect(&path, &ConversionConfig::default()).unwrap();
        assert_eq!(info.placement.unit, Unit::Pixels);
        assert_eq!(
            (info.placement.source_width, info.placement.source_height),
            (3000.0, 2250.0)
        );
        assert_eq!(info.placement.offset_y, 150.0);
    }

    #[test]
    fn inspect_raster_mode_reads_encrypted_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = page_pdf(dir.path(), "locked.pdf", [0, 0, 612, 792], dictionary! {}, true);

        let info = inspect(&path, &ConversionConfig::default()).unwrap();
        assert!(info.encrypted);
        assert!(!info.vector_preserved);
        assert_eq!(info.page_count, Some(1));
        assert_eq!(info.planned_outputs.len(), 3);
    }

    #[test]
    fn inspect_vector_mode_rejects_encrypted_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = page_pdf(dir.path(), "locked.pdf", [0, 0, 612, 792], dictionary! {}, true);
        let config = ConversionConfig::builder()
            .preserve_vector(true)
            .pdf_only(true)
            .build()
            .unwrap();

        match inspect(&path, &config).unwrap_err() {
            ResizeError::DecodeError { detail, .. } => assert!(detail.contains("encrypted")),
            other => panic!("expected DecodeError, got {other:?}"),
        }
    }
}
