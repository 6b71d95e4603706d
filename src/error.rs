//! Error types for the abstract-resize library.
//!
//! Every error is terminal for the run: there are no retries and no partial
//! results. The variants carry the offending path so the CLI can print one
//! message that names both the file and the condition.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the abstract-resize library.
#[derive(Debug, Error)]
pub enum ResizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is a regular file.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of tiff, pdf, jpg or png.
    #[error(
        "Unsupported input format '{extension}' for '{path}'\n\
Supported: .tif/.tiff, .jpg/.jpeg, .png, .pdf"
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file exists but its content is corrupt, empty or unreadable.
    #[error("Could not decode '{path}': {detail}")]
    DecodeError { path: PathBuf, detail: String },

    // ── Option errors ─────────────────────────────────────────────────────
    /// Flags that cannot be honoured together (or not for this input).
    #[error("Invalid option combination: {0}")]
    InvalidOptionCombination(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error while rasterising the first page.
    #[error("Rasterisation failed for '{path}': {detail}")]
    RasterisationFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Rasterising PDF input needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n\
Image inputs and --preserve-vector do not need pdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// An encoder failed to serialise the composited result.
    #[error("Failed to encode {format} output: {detail}")]
    EncodeFailed { format: String, detail: String },

    /// Could not create, write or move an output file into place.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResizeError {
    pub(crate) fn decode(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        ResizeError::DecodeError {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encode(format: impl ToString, detail: impl ToString) -> Self {
        ResizeError::EncodeFailed {
            format: format.to_string(),
            detail: detail.to_string(),
        }
    }
}
