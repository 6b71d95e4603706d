//! # abstract-resize
//!
//! Normalise an image or PDF to a 1200 × 1200 pixel square at 300 DPI, the
//! fixed geometry many journals require for graphical abstracts.
//!
//! ## Why this crate?
//!
//! Submission portals reject figures that are the wrong pixel size or carry
//! the wrong resolution tag, and resizing by hand tends to crop, stretch or
//! lose the DPI metadata. This crate fits the content inside the square
//! without cropping, pads the rest with white, and writes TIFF, PNG and PDF
//! variants that all agree on 300 DPI. For PDF input the page can instead be
//! rescaled as vector content so text and line art stay sharp.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input (tiff / jpg / png / pdf)
//!  │
//!  ├─ 1. Input    validate path + extension, decode or rasterise page 1
//!  ├─ 2. Geometry scale = min(1200/w, 1200/h), centre offsets
//!  ├─ 3. Compose  Lanczos3 resize onto a white 1200×1200 canvas
//!  ├─ 4. Encode   TIFF (LZW, 300 dpi) · PNG (pHYs) · PDF (4×4 in page)
//!  └─ 5. Commit   atomic rename of every output, or none at all
//! ```
//!
//! With `preserve_vector`, steps 3–4 are replaced by a rewrite of the PDF's
//! first page (see [`pipeline::vector`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use abstract_resize::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let report = convert("figure.png", &config)?;
//!     for out in &report.outputs {
//!         println!("{}: {}", out.format, out.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `abstract-resize` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Rasterising PDF input needs the pdfium shared library at runtime; image
//! inputs and the vector path do not. See [`pipeline::pdfium`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, inspect};
pub use error::ResizeError;
pub use geometry::{Placement, VectorPlacement, TARGET_DPI, TARGET_PT, TARGET_PX};
pub use output::{
    output_path, ConversionReport, OutputFormat, PlacementSummary, SourceInfo, Unit,
    WrittenOutput,
};
pub use pipeline::input::InputKind;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
