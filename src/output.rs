//! Output naming, atomic staging and the serialisable run report.
//!
//! A failed run must never leave a half-written file that looks valid. Each
//! encoder's bytes are written to a hidden temp file in the destination
//! directory; only when every encoder has succeeded are the temp files
//! renamed to their final names. A rename failure part-way through removes
//! the outputs already moved into place by this run.

use crate::error::ResizeError;
use crate::geometry::{Placement, VectorPlacement, TARGET_DPI, TARGET_PX};
use crate::pipeline::input::InputKind;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

/// One of the three container formats the converter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Tiff,
    Png,
    Pdf,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tiff => "tiff",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Tiff => f.write_str("TIFF"),
            OutputFormat::Png => f.write_str("PNG"),
            OutputFormat::Pdf => f.write_str("PDF"),
        }
    }
}

/// `<dir>/<stem>_1200px_300dpi.<ext>`, next to the input.
pub fn output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = format!(
        "{stem}_{TARGET_PX}px_{TARGET_DPI}dpi.{}",
        format.extension()
    );
    output_dir(input).join(name)
}

fn output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// A file the run moved into place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrittenOutput {
    pub format: OutputFormat,
    pub path: PathBuf,
    pub bytes: u64,
}

struct StagedFile {
    format: OutputFormat,
    target: PathBuf,
    temp: NamedTempFile,
    bytes: u64,
}

/// Encoded outputs waiting to be renamed into place.
///
/// Dropping an uncommitted `StagedOutputs` deletes its temp files.
#[derive(Default)]
pub struct StagedOutputs {
    files: Vec<StagedFile>,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write `data` to a temp file in `target`'s directory.
    pub fn stage(
        &mut self,
        format: OutputFormat,
        target: PathBuf,
        data: &[u8],
    ) -> Result<(), ResizeError> {
        let dir = output_dir(&target);
        let write_err = |source| ResizeError::OutputWriteFailed {
            path: target.clone(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".abstract-resize-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(write_err)?;
        temp.write_all(data).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;

        debug!(
            "Staged {} ({} bytes) for {}",
            format,
            data.len(),
            target.display()
        );
        self.files.push(StagedFile {
            format,
            target,
            temp,
            bytes: data.len() as u64,
        });
        Ok(())
    }

    /// Rename every staged file to its final name, in staging order.
    ///
    /// An existing file at a target name (typically from an earlier run) is
    /// moved aside first and only deleted once every output is in place. On
    /// failure, outputs already renamed by this call are removed, the files
    /// they replaced are put back, and the remaining temp files are dropped.
    pub fn commit(
        self,
        progress: Option<&ProgressCallback>,
    ) -> Result<Vec<WrittenOutput>, ResizeError> {
        let mut written: Vec<WrittenOutput> = Vec::with_capacity(self.files.len());
        let mut replaced: Vec<Option<TempPath>> = Vec::with_capacity(self.files.len());

        for file in self.files {
            let previous = match set_aside(&file.target) {
                Ok(previous) => previous,
                Err(source) => {
                    rollback(&written, replaced);
                    return Err(ResizeError::OutputWriteFailed {
                        path: file.target,
                        source,
                    });
                }
            };

            if let Err(e) = file.temp.persist(&file.target) {
                if let Some(prev) = previous {
                    put_back(prev, &file.target);
                }
                rollback(&written, replaced);
                return Err(ResizeError::OutputWriteFailed {
                    path: file.target,
                    source: e.error,
                });
            }

            if let Some(cb) = progress {
                cb.on_output_written(file.format, &file.target);
            }
            written.push(WrittenOutput {
                format: file.format,
                path: file.target,
                bytes: file.bytes,
            });
            replaced.push(previous);
        }

        // Dropping `replaced` deletes the superseded files.
        Ok(written)
    }
}

/// Move an existing regular file at `target` to a hidden temp name.
fn set_aside(target: &Path) -> std::io::Result<Option<TempPath>> {
    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_file() => {}
        _ => return Ok(None),
    }
    let backup = tempfile::Builder::new()
        .prefix(".abstract-resize-")
        .suffix(".prev")
        .tempfile_in(output_dir(target))?
        .into_temp_path();
    std::fs::rename(target, &backup)?;
    debug!("Moved existing {} aside", target.display());
    Ok(Some(backup))
}

fn put_back(prev: TempPath, target: &Path) {
    if let Err(e) = std::fs::rename(&prev, target) {
        match prev.keep() {
            Ok(kept) => warn!(
                "Could not restore {} ({}); previous version kept at {}",
                target.display(),
                e,
                kept.display()
            ),
            Err(keep) => warn!("Could not restore {}: {}", target.display(), keep),
        }
    }
}

fn rollback(written: &[WrittenOutput], replaced: Vec<Option<TempPath>>) {
    for (done, prev) in written.iter().zip(replaced).rev() {
        if let Err(rm) = std::fs::remove_file(&done.path) {
            warn!("Could not remove {}: {}", done.path.display(), rm);
        }
        if let Some(prev) = prev {
            put_back(prev, &done.path);
        }
    }
}

/// Coordinate space the placement numbers are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pixels,
    Points,
}

/// Source size and where it lands on the output canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub unit: Unit,
    pub source_width: f64,
    pub source_height: f64,
    pub scale: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl PlacementSummary {
    pub fn raster(source_width: u32, source_height: u32, p: &Placement) -> Self {
        Self {
            unit: Unit::Pixels,
            source_width: source_width as f64,
            source_height: source_height as f64,
            scale: p.scale,
            content_width: p.width as f64,
            content_height: p.height as f64,
            offset_x: p.x as f64,
            offset_y: p.y as f64,
        }
    }

    pub fn vector(width_pt: f32, height_pt: f32, p: &VectorPlacement) -> Self {
        Self {
            unit: Unit::Points,
            source_width: width_pt as f64,
            source_height: height_pt as f64,
            scale: p.scale as f64,
            content_width: (width_pt * p.scale) as f64,
            content_height: (height_pt * p.scale) as f64,
            offset_x: p.x as f64,
            offset_y: p.y as f64,
        }
    }
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub kind: InputKind,
    /// True when the PDF content stream was rescaled instead of rasterised.
    pub vector_preserved: bool,
    pub placement: PlacementSummary,
    pub outputs: Vec<WrittenOutput>,
    pub duration_ms: u64,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub input: PathBuf,
    pub kind: InputKind,
    /// Page count for PDF inputs.
    pub page_count: Option<usize>,
    /// Encrypted PDF; rasterising it may need `--password`.
    pub encrypted: bool,
    pub vector_preserved: bool,
    pub placement: PlacementSummary,
    pub planned_outputs: Vec<PathBuf>,
}
