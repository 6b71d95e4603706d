//! Input resolution and loading.
//!
//! The loader decides which path a run takes. Raster files are decoded
//! straight to a [`DynamicImage`]; PDFs are either rasterised (first page,
//! 300 DPI) or, in vector-preserve mode, parsed into a [`VectorPage`] whose
//! content stream is later rescaled without ever becoming pixels.
//!
//! We validate the PDF magic bytes (`%PDF`) before handing the file to pdfium
//! or lopdf so an empty or mislabelled file gets a decode error naming the
//! file, and so no pdfium library is needed to reject it.

use crate::config::ConversionConfig;
use crate::error::ResizeError;
use crate::pipeline::render;
use crate::pipeline::vector::VectorPage;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input type, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Tiff,
    Jpeg,
    Png,
    Pdf,
}

impl InputKind {
    /// Classify `path` by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, ResizeError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "tif" | "tiff" => Ok(InputKind::Tiff),
            "jpg" | "jpeg" => Ok(InputKind::Jpeg),
            "png" => Ok(InputKind::Png),
            "pdf" => Ok(InputKind::Pdf),
            _ => Err(ResizeError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext,
            }),
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, InputKind::Pdf)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Tiff => f.write_str("TIFF"),
            InputKind::Jpeg => f.write_str("JPEG"),
            InputKind::Png => f.write_str("PNG"),
            InputKind::Pdf => f.write_str("PDF"),
        }
    }
}

/// Loaded content: exactly one of the two representations per run.
pub enum Source {
    /// Pixels plus colour mode, from an image file or a rasterised PDF page.
    Raster(DynamicImage),
    /// The first page of a PDF, untouched.
    Vector(VectorPage),
}

/// Validate that `path` names a readable regular file.
pub fn resolve_local(path: &Path) -> Result<PathBuf, ResizeError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(ResizeError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ResizeError::PermissionDenied { path });
        }
        Err(_) => return Err(ResizeError::FileNotFound { path }),
    }

    debug!("Resolved local input: {}", path.display());
    Ok(path)
}

/// Reject files that do not start with `%PDF`, including empty ones.
pub fn check_pdf_magic(path: &Path) -> Result<(), ResizeError> {
    let mut f = std::fs::File::open(path).map_err(|e| ResizeError::decode(path, e))?;
    let mut magic = [0u8; 4];
    if f.read_exact(&mut magic).is_err() {
        return Err(ResizeError::decode(path, "file is too short to be a PDF"));
    }
    if &magic != b"%PDF" {
        return Err(ResizeError::decode(
            path,
            format!("not a PDF (first bytes: {magic:?})"),
        ));
    }
    Ok(())
}

/// Check the flags that depend on the input kind.
pub fn validate_options(kind: InputKind, config: &ConversionConfig) -> Result<(), ResizeError> {
    config.validate()?;
    if config.preserve_vector && !kind.is_pdf() {
        return Err(ResizeError::InvalidOptionCombination(format!(
            "--preserve-vector only applies to PDF input, got {kind}"
        )));
    }
    Ok(())
}

/// Load `path` as the representation the run needs.
pub fn load(path: &Path, kind: InputKind, config: &ConversionConfig) -> Result<Source, ResizeError> {
    match kind {
        InputKind::Pdf if config.preserve_vector => {
            check_pdf_magic(path)?;
            VectorPage::load(path).map(Source::Vector)
        }
        InputKind::Pdf => {
            check_pdf_magic(path)?;
            render::render_first_page(path, config.password.as_deref()).map(Source::Raster)
        }
        InputKind::Tiff | InputKind::Jpeg | InputKind::Png => decode_image(path).map(Source::Raster),
    }
}

/// Decode an image file, sniffing the real format from its content.
pub fn decode_image(path: &Path) -> Result<DynamicImage, ResizeError> {
    let image = ImageReader::open(path)
        .map_err(|e| ResizeError::decode(path, e))?
        .with_guessed_format()
        .map_err(|e| ResizeError::decode(path, e))?
        .decode()
        .map_err(|e| ResizeError::decode(path, e))?;

    debug!(
        "Decoded {} → {}x{} {:?}",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Read the pixel size from the image header without decoding pixels.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), ResizeError> {
    ImageReader::open(path)
        .map_err(|e| ResizeError::decode(path, e))?
        .with_guessed_format()
        .map_err(|e| ResizeError::decode(path, e))?
        .into_dimensions()
        .map_err(|e| ResizeError::decode(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(InputKind::from_path(Path::new("a.TIF")).unwrap(), InputKind::Tiff);
        assert_eq!(InputKind::from_path(Path::new("a.tiff")).unwrap(), InputKind::Tiff);
        assert_eq!(InputKind::from_path(Path::new("a.JPG")).unwrap(), InputKind::Jpeg);
        assert_eq!(InputKind::from_path(Path::new("a.jpeg")).unwrap(), InputKind::Jpeg);
        assert_eq!(InputKind::from_path(Path::new("a.png")).unwrap(), InputKind::Png);
        assert_eq!(InputKind::from_path(Path::new("dir/a.Pdf")).unwrap(), InputKind::Pdf);
    }

    #[test]
    fn rejects_unknown_extensions() {
        for name in ["a.gif", "a.bmp", "noext", "a.pdf.bak"] {
            let err = InputKind::from_path(Path::new(name)).unwrap_err();
            assert!(
                matches!(err, ResizeError::UnsupportedFormat { .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_local(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ResizeError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path()).unwrap_err();
        assert!(matches!(err, ResizeError::FileNotFound { .. }));
    }

    #[test]
    fn empty_pdf_fails_magic_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            check_pdf_magic(&path).unwrap_err(),
            ResizeError::DecodeError { .. }
        ));
    }

    #[test]
    fn non_pdf_content_fails_magic_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        assert!(check_pdf_magic(&path).is_err());

        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert!(check_pdf_magic(&path).is_ok());
    }

    #[test]
    fn preserve_vector_needs_pdf_input() {
        let config = ConversionConfig::builder()
            .preserve_vector(true)
            .pdf_only(true)
            .build()
            .unwrap();
        assert!(validate_options(InputKind::Pdf, &config).is_ok());
        assert!(matches!(
            validate_options(InputKind::Png, &config).unwrap_err(),
            ResizeError::InvalidOptionCombination(_)
        ));
    }

    #[test]
    fn corrupt_png_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\ngarbage").unwrap();
        assert!(matches!(
            decode_image(&path).unwrap_err(),
            ResizeError::DecodeError { .. }
        ));
    }
}
