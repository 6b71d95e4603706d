//! CLI binary for abstract-resize.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use abstract_resize::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, ConversionReport,
    OutputFormat, ProgressCallback, SourceInfo, Stage, Unit,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Summary line styling ─────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the current stage, plus one
/// line per output file as it is moved into place.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &Path) {
        self.bar.set_message(input.display().to_string());
    }

    fn on_stage(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_output_written(&self, format: OutputFormat, path: &Path) {
        self.bar.println(format!(
            "  {} {:<5} {}",
            green("✓"),
            format.to_string(),
            path.display()
        ));
    }

    fn on_conversion_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, _outputs_written: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic usage (creates TIFF, PNG and PDF, rasterised)
  abstract-resize your-image.tiff

  # Preserve vector elements in the PDF (vector PDF only)
  abstract-resize your-figure.pdf --preserve-vector --pdf-only

  # Only the PDF output, rasterised
  abstract-resize your-image.png --pdf-only

  # Show what would happen, write nothing
  abstract-resize --inspect-only --json poster.pdf

OUTPUTS:
  <stem>_1200px_300dpi.tiff   RGB, LZW, 300 dpi
  <stem>_1200px_300dpi.png    RGB, pHYs ≈ 300 dpi (informational)
  <stem>_1200px_300dpi.pdf    4 × 4 in page
  Written next to the input. A failed run leaves no output files.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium, needed to rasterise PDF input
  RUST_LOG          Override log filter (e.g. abstract_resize=debug)
"#;

/// Resize images and PDFs to 1200×1200 px at 300 DPI.
#[derive(Parser, Debug)]
#[command(
    name = "abstract-resize",
    version,
    about = "Resize images and PDFs to 1200×1200 px at 300 DPI",
    long_about = "Fit a TIFF, JPG, PNG or PDF inside a 1200×1200 pixel white square at 300 DPI \
without cropping, and write TIFF, PNG and PDF variants next to the input.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file: .tif/.tiff, .jpg/.jpeg, .png or .pdf.
    input: PathBuf,

    /// Rescale the PDF page as vector content (PDF input, requires --pdf-only).
    #[arg(long, env = "ABSTRACT_RESIZE_PRESERVE_VECTOR")]
    preserve_vector: bool,

    /// Only write the PDF output, skip TIFF and PNG.
    #[arg(long, env = "ABSTRACT_RESIZE_PDF_ONLY")]
    pdf_only: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "ABSTRACT_RESIZE_PASSWORD")]
    password: Option<String>,

    /// Print the report (or inspection) as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Print source size and placement only, write nothing.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ABSTRACT_RESIZE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = build_config(&cli)?;
    // Start the spinner only once the flags are known to be valid.
    if show_progress && !cli.verbose {
        config.progress_callback = Some(CliProgressCallback::new() as ProgressCallback);
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, &config)
            .with_context(|| format!("Failed to inspect {}", cli.input.display()))?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise inspection")?
            );
        } else {
            print_inspection(&info);
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let report = convert(&cli.input, &config)
        .with_context(|| format!("Conversion of {} failed", cli.input.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report, show_progress && !cli.verbose);
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .preserve_vector(cli.preserve_vector)
        .pdf_only(cli.pdf_only);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid options")
}

fn unit_suffix(unit: Unit) -> &'static str {
    match unit {
        Unit::Pixels => "px",
        Unit::Points => "pt",
    }
}

fn print_inspection(info: &SourceInfo) {
    let p = &info.placement;
    let u = unit_suffix(p.unit);
    println!("File:         {}", info.input.display());
    println!("Type:         {}", info.kind);
    if let Some(pages) = info.page_count {
        println!("Pages:        {} (only page 1 is used)", pages);
    }
    if info.encrypted {
        println!("Encrypted:    yes (rasterising needs --password unless it opens without one)");
    }
    println!("Source:       {} × {} {u}", p.source_width, p.source_height);
    println!("Scale:        {:.4}", p.scale);
    println!(
        "Content:      {:.2} × {:.2} {u} at ({:.2}, {:.2})",
        p.content_width, p.content_height, p.offset_x, p.offset_y
    );
    println!(
        "Mode:         {}",
        if info.vector_preserved { "vector" } else { "raster" }
    );
    for out in &info.planned_outputs {
        println!("Output:       {}", out.display());
    }
}

fn print_summary(report: &ConversionReport, callback_printed_outputs: bool) {
    if !callback_printed_outputs {
        for out in &report.outputs {
            eprintln!("{} saved: {}", out.format, out.path.display());
        }
    }
    let p = &report.placement;
    eprintln!(
        "{}  {} output(s)  {}ms  {}",
        green("✔"),
        bold(&report.outputs.len().to_string()),
        report.duration_ms,
        dim(&format!(
            "scale {:.4}, offset ({}, {}) {}",
            p.scale,
            p.offset_x,
            p.offset_y,
            unit_suffix(p.unit)
        )),
    );
}
