//! Configuration for a single conversion run.
//!
//! The output geometry (1200 × 1200 px at 300 DPI) is fixed and lives in
//! [`crate::geometry`]; what a caller can choose is which encoders run and how
//! PDF input is read. Everything goes through [`ConversionConfig`], built via
//! [`ConversionConfigBuilder`] so invalid flag combinations are rejected before
//! any file is touched.

use crate::error::ResizeError;
use crate::output::OutputFormat;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for one conversion.
///
/// # Example
/// ```rust
/// use abstract_resize::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .pdf_only(true)
///     .preserve_vector(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_formats().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ConversionConfig {
    /// Rewrite the first PDF page's content stream instead of rasterising it.
    ///
    /// Only valid with a PDF input and together with [`Self::pdf_only`]: the
    /// vector path never produces a raster, so TIFF and PNG cannot be written.
    pub preserve_vector: bool,

    /// Write only the PDF output, skipping TIFF and PNG.
    pub pdf_only: bool,

    /// PDF user password for encrypted documents (raster path only).
    pub password: Option<String>,

    /// Optional per-stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("preserve_vector", &self.preserve_vector)
            .field("pdf_only", &self.pdf_only)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output formats in the order they are written.
    pub fn output_formats(&self) -> Vec<OutputFormat> {
        if self.pdf_only {
            vec![OutputFormat::Pdf]
        } else {
            vec![OutputFormat::Tiff, OutputFormat::Png, OutputFormat::Pdf]
        }
    }

    /// Check the flags that do not depend on the input.
    pub fn validate(&self) -> Result<(), ResizeError> {
        if self.preserve_vector && !self.pdf_only {
            return Err(ResizeError::InvalidOptionCombination(
                "--preserve-vector requires --pdf-only to avoid rasterisation".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn preserve_vector(mut self, v: bool) -> Self {
        self.config.preserve_vector = v;
        self
    }

    pub fn pdf_only(mut self, v: bool) -> Self {
        self.config.pdf_only = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating flag combinations.
    pub fn build(self) -> Result<ConversionConfig, ResizeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
