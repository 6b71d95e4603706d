//! Tests for the `abstract-resize` binary: exit status, error reporting and
//! `--json` output.
//!
//! Run with:
//!   cargo test --test cli

use std::path::Path;
use std::process::{Command, Output};

fn run(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_abstract-resize"))
        .args(args)
        .current_dir(cwd)
        .env_remove("ABSTRACT_RESIZE_PRESERVE_VECTOR")
        .env_remove("ABSTRACT_RESIZE_PDF_ONLY")
        .env_remove("ABSTRACT_RESIZE_PASSWORD")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn abstract-resize")
}

fn sibling_outputs(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains("_1200px_300dpi") || n.starts_with(".abstract-resize-"))
        .collect()
}

#[test]
fn test_empty_pdf_exits_non_zero_naming_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.pdf");
    std::fs::write(&input, b"").unwrap();

    let out = run(&[input.to_str().unwrap(), "--no-progress"], dir.path());
    assert!(!out.status.success());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("empty.pdf"), "stderr: {stderr}");
    assert!(stderr.to_lowercase().contains("decode"), "stderr: {stderr}");
    assert!(sibling_outputs(dir.path()).is_empty());
}

#[test]
fn test_preserve_vector_without_pdf_only_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("figure.pdf");
    std::fs::write(&input, b"%PDF-1.4\n").unwrap();

    let out = run(
        &[input.to_str().unwrap(), "--preserve-vector", "--no-progress"],
        dir.path(),
    );
    assert!(!out.status.success());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--pdf-only"), "stderr: {stderr}");
    assert!(sibling_outputs(dir.path()).is_empty());
}

#[test]
fn test_missing_input_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&["nowhere.png", "--no-progress"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("nowhere.png"));
}

#[test]
fn test_json_report_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    image::RgbImage::from_pixel(300, 150, image::Rgb([0, 128, 255]))
        .save(&input)
        .unwrap();

    let out = run(&[input.to_str().unwrap(), "--json"], dir.path());
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["kind"], "png");
    assert_eq!(report["outputs"].as_array().unwrap().len(), 3);
    assert_eq!(report["placement"]["offset_y"], 300.0);
    assert!(dir.path().join("photo_1200px_300dpi.tiff").exists());
}

#[test]
fn test_inspect_only_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("peek.jpg");
    image::RgbImage::from_pixel(64, 64, image::Rgb([10, 10, 10]))
        .save(&input)
        .unwrap();

    let out = run(&[input.to_str().unwrap(), "--inspect-only"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("peek_1200px_300dpi.png"), "stdout: {stdout}");
    assert!(sibling_outputs(dir.path()).is_empty());
}
