//! End-to-end tests through the filesystem.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use penciller_io::{
    DEFAULT_JPEG_QUALITY, DecodeError, EncodeError, IoError, OutputFormat, PreviewFilter, load,
    save, sketch_file, thumbnail,
};
use penciller_pipeline::{DynamicImage, RgbImage, SketchParameters, convert};

fn write_png(path: &Path, img: &RgbImage) {
    let bytes = penciller_io::encode(img, OutputFormat::Png, DEFAULT_JPEG_QUALITY).unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn stripes(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, _| {
        if (x / 8) % 2 == 0 {
            image::Rgb([220, 180, 140])
        } else {
            image::Rgb([40, 60, 90])
        }
    })
}

#[test]
fn png_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stripes.png");
    let img = stripes(32, 16);
    save(&path, &img, DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(load(&path).unwrap().to_rgb8(), img);
}

#[test]
fn sketch_survives_png_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sketch.png");
    let sketch = convert(
        &DynamicImage::ImageRgb8(stripes(40, 20)),
        &SketchParameters::new(2.0, 1.3, 0.9),
    )
    .unwrap();
    assert!(sketch.pixels().any(|p| p.0[0] < 255), "expected some graphite");

    save(&path, &sketch, DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(load(&path).unwrap().to_rgb8(), sketch);
}

#[test]
fn jpeg_output_decodes_with_same_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stripes.JPG");
    save(&path, &stripes(40, 24), 90).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!((loaded.width(), loaded.height()), (40, 24));
}

#[test]
fn sketch_file_writes_grayscale_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let output = dir.path().join("out.bmp");
    write_png(&input, &stripes(48, 32));

    let sketch = sketch_file(&input, &output, &SketchParameters::default(), DEFAULT_JPEG_QUALITY)
        .unwrap();

    let written = load(&output).unwrap().to_rgb8();
    assert_eq!(written, sketch);
    assert!(written.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
}

#[test]
fn sketch_file_rejects_unsupported_output_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let result = sketch_file(
        &dir.path().join("missing.png"),
        &dir.path().join("out.webp"),
        &SketchParameters::default(),
        DEFAULT_JPEG_QUALITY,
    );
    assert!(matches!(
        result,
        Err(IoError::Encode(EncodeError::UnsupportedFormat { .. }))
    ));
}

#[test]
fn sketch_file_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = sketch_file(
        &dir.path().join("missing.png"),
        &dir.path().join("out.png"),
        &SketchParameters::default(),
        DEFAULT_JPEG_QUALITY,
    );
    assert!(matches!(result, Err(IoError::Decode(DecodeError::Read { .. }))));
}

#[test]
fn preview_of_large_sketch_fits_box() {
    let thumb = thumbnail(&stripes(900, 450), 300, PreviewFilter::default());
    assert_eq!(thumb.dimensions(), (300, 150));
}
