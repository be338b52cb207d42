//! Integration tests driving the `penciller` binary.

#![allow(clippy::unwrap_used)]

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

fn penciller(args: &[&OsStr]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_penciller"))
        .args(args)
        .output()
        .unwrap()
}

fn write_png(path: &Path, img: &image::RgbImage) {
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

fn flat_gray(w: u32, h: u32) -> image::RgbImage {
    image::RgbImage::from_pixel(w, h, image::Rgb([128, 128, 128]))
}

#[test]
fn flat_gray_input_produces_white_sketch() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gray.png");
    let output = dir.path().join("sketch.png");
    write_png(&input, &flat_gray(10, 10));

    let out = penciller(&[
        input.as_os_str(),
        OsStr::new("-o"),
        output.as_os_str(),
        OsStr::new("--line-thickness"),
        OsStr::new("5"),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let sketch = image::open(&output).unwrap().to_rgb8();
    assert_eq!(sketch.dimensions(), (10, 10));
    assert!(sketch.pixels().all(|p| p.0 == [255, 255, 255]));
}

#[test]
fn missing_input_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.png");
    let output = dir.path().join("out.png");

    let out = penciller(&[input.as_os_str(), OsStr::new("-o"), output.as_os_str()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("absent.png"), "stderr: {stderr}");
    assert!(!output.exists());
}

#[test]
fn unsupported_output_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gray.png");
    let output = dir.path().join("out.gif");
    write_png(&input, &flat_gray(4, 4));

    let out = penciller(&[input.as_os_str(), OsStr::new("-o"), output.as_os_str()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unsupported output format"));
}

#[test]
fn diagnostics_json_is_printed_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gray.png");
    let output = dir.path().join("out.jpg");
    write_png(&input, &flat_gray(12, 8));

    let out = penciller(&[
        input.as_os_str(),
        OsStr::new("-o"),
        output.as_os_str(),
        OsStr::new("--diagnostics"),
        OsStr::new("--json"),
        OsStr::new("--params-json"),
        OsStr::new(r#"{"line_thickness": 2.0}"#),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["summary"]["image_width"], 12);
    assert_eq!(json["summary"]["image_height"], 8);
    assert_eq!(json["blur"]["metrics"]["Blur"]["kernel_size"], 5);
    assert!(output.exists());
}

#[test]
fn preview_is_fitted_inside_box() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wide.png");
    let output = dir.path().join("out.bmp");
    let preview = dir.path().join("preview.png");
    write_png(&input, &flat_gray(600, 200));

    let out = penciller(&[
        input.as_os_str(),
        OsStr::new("-o"),
        output.as_os_str(),
        OsStr::new("--preview"),
        preview.as_os_str(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let full = image::open(&output).unwrap();
    assert_eq!((full.width(), full.height()), (600, 200));
    let thumb = image::open(&preview).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (300, 100));
}
