//! Progress-callback trait for per-stage conversion events.
//!
//! A run is short but not instant: rasterising a PDF page at 300 DPI and
//! LZW-compressing a TIFF both take noticeable time. Inject an
//! [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to follow the
//! pipeline as it moves through its stages.
//!
//! # Example
//!
//! ```rust
//! use abstract_resize::{ConversionConfig, ConversionProgressCallback, OutputFormat};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_output_written(&self, format: OutputFormat, path: &Path) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{format}: {}", path.display());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::OutputFormat;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A pipeline stage, reported in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the image, rasterising the PDF page or parsing the PDF.
    Load,
    /// Resizing and pasting onto the white canvas.
    Compose,
    /// Serialising one output format.
    Encode(OutputFormat),
    /// Moving staged files to their final names.
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Load => f.write_str("Loading input"),
            Stage::Compose => f.write_str("Composing 1200×1200 canvas"),
            Stage::Encode(format) => write!(f, "Encoding {format}"),
            Stage::Commit => f.write_str("Writing outputs"),
        }
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is single-threaded; `Send + Sync` is
/// required so configs can be shared freely.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the input is opened.
    fn on_conversion_start(&self, input: &Path) {
        let _ = input;
    }

    /// Called when a stage begins.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after an output file has been moved to its final name.
    fn on_output_written(&self, format: OutputFormat, path: &Path) {
        let _ = (format, path);
    }

    /// Called when the run fails; no output files remain.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }

    /// Called once after every output has been written.
    fn on_conversion_complete(&self, outputs_written: usize) {
        let _ = outputs_written;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        written: AtomicUsize,
        completed: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_output_written(&self, _format: OutputFormat, _path: &Path) {
            self.written.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, outputs_written: usize) {
            self.completed.store(outputs_written, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(Path::new("in.png"));
        cb.on_stage(Stage::Load);
        cb.on_output_written(OutputFormat::Png, Path::new("out.png"));
        cb.on_conversion_error("boom");
        cb.on_conversion_complete(3);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_stage(Stage::Load);
        tracker.on_stage(Stage::Compose);
        tracker.on_stage(Stage::Encode(OutputFormat::Pdf));
        tracker.on_output_written(OutputFormat::Pdf, Path::new("a_1200px_300dpi.pdf"));
        tracker.on_conversion_complete(1);

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![Stage::Load, Stage::Compose, Stage::Encode(OutputFormat::Pdf)]
        );
        assert_eq!(tracker.written.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Encode(OutputFormat::Tiff).to_string(), "Encoding TIFF");
        assert_eq!(Stage::Load.to_string(), "Loading input");
    }
}
