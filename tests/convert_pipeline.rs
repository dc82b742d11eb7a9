//! End-to-end conversion: pick a file on disk, resolve its type, convert it
//! with the real backend, and save the result.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use image_compressor::convert::{ConversionRequest, ConversionResult, Converter};
use image_compressor::download::{DownloadTarget, download_filename};
use image_compressor::imaging::RustBackend;
use image_compressor::media_type::{FileDescriptor, OCTET_STREAM, resolve_type};
use image_compressor::progress::ProgressEvent;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 90, 255])
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &bytes).unwrap();
    bytes
}

#[test]
fn png_on_disk_becomes_saved_webp() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("Holiday.PNG");
    let bytes = write_png(&source, 150, 90);

    let file = FileDescriptor::from_path(&source);
    let input_type = resolve_type(&file).to_string();
    assert_eq!(input_type, "image/png");

    let request = ConversionRequest::builder(bytes, input_type)
        .build()
        .unwrap();
    let (tx, rx) = std::sync::mpsc::channel::<ProgressEvent>();
    let result = Converter::new(RustBackend::new()).convert(&request, Some(&tx));
    drop(tx);

    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert!(!events.is_empty());
    assert_eq!(events.last().map(|e| e.percent), Some(100.0));

    let output = result.output_bytes().expect("conversion should succeed");
    let filename = download_filename(&file.name, request.output_type());
    assert_eq!(filename, "Holiday.webp");

    let out_dir = tmp.path().join("out");
    let saved = DownloadTarget::new(&out_dir)
        .trigger_download(output, &filename)
        .unwrap();

    let on_disk = std::fs::read(&saved).unwrap();
    assert_eq!(on_disk, output);
    let decoded = image::load_from_memory_with_format(&on_disk, ImageFormat::WebP).unwrap();
    assert_eq!(decoded.dimensions(), (150, 90));
}

#[test]
fn unnamed_type_falls_back_to_content_sniffing() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("upload");
    let bytes = write_png(&source, 20, 20);

    let file = FileDescriptor::from_path(&source);
    assert_eq!(resolve_type(&file), OCTET_STREAM);

    let request = ConversionRequest::builder(bytes, OCTET_STREAM)
        .output_type("image/jpeg")
        .compression_level(0.7)
        .build()
        .unwrap();
    let result = Converter::new(RustBackend::new()).convert(&request, None);
    let output = result.output_bytes().unwrap();
    assert!(image::load_from_memory_with_format(output, ImageFormat::Jpeg).is_ok());
}

#[test]
fn corrupt_file_is_a_failure_value() {
    let request = ConversionRequest::builder(b"\x89PNG but not really".to_vec(), "image/png")
        .build()
        .unwrap();
    let result = Converter::new(RustBackend::new()).convert(&request, None);

    match result {
        ConversionResult::Failure { error_message } => {
            assert!(error_message.starts_with("Failed to load image"));
        }
        ConversionResult::Success { .. } => panic!("corrupt input must not convert"),
    }
}

#[test]
fn unsupported_target_is_a_failure_value() {
    let tmp = TempDir::new().unwrap();
    let bytes = write_png(&tmp.path().join("a.png"), 8, 8);
    let request = ConversionRequest::builder(bytes, "image/png")
        .output_type("image/tiff")
        .build()
        .unwrap();
    let result = Converter::new(RustBackend::new()).convert(&request, None);
    assert_eq!(
        result.error_message(),
        Some("Unsupported conversion target: image/tiff")
    );
}
