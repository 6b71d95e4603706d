//! Binding to the pdfium shared library.
//!
//! Only the raster PDF path needs pdfium, so binding happens lazily inside
//! [`crate::pipeline::render`] rather than at start-up. Lookup order:
//!
//! 1. `PDFIUM_LIB_PATH`: explicit path to `libpdfium.{so,dylib}` / `pdfium.dll`.
//! 2. The platform library name in the current directory.
//! 3. The system library search path.

use crate::error::ResizeError;
use pdfium_render::prelude::*;
use tracing::debug;

/// Environment variable naming an explicit pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium using the lookup order above.
pub fn bind() -> Result<Pdfium, ResizeError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) => {
            debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, path);
            Pdfium::bind_to_library(path)
        }
        Err(_) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ResizeError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
