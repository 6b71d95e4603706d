//! Pipeline stages for normalising one input to 1200 × 1200 px at 300 DPI.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and a codec can be swapped without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─ raster ─▶ compose ─▶ encode (TIFF, PNG, PDF)
//! input ─────┤
//!            └─ vector ─▶ vector::into_pdf (PDF only)
//! ```
//!
//! 1. [`input`]  : validate the path, classify by extension, load a `Source`
//! 2. [`render`] : rasterise the first PDF page at 300 DPI via [`pdfium`]
//! 3. [`compose`]: Lanczos3 resize and paste onto the white canvas
//! 4. [`encode`] : TIFF / PNG / PDF bytes with 300 DPI metadata
//! 5. [`vector`] : rescale the first page's content stream, no rasterisation

pub mod compose;
pub mod encode;
pub mod input;
pub mod pdfium;
pub mod render;
pub mod vector;
