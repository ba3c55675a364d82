//! Integration tests for the pifs binary.

use std::path::Path;
use std::process::Command;

fn pifs_cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pifs"))
}

fn write_checkerboard(path: &Path, dimension: u32, cell: u32) {
    let img = image::GrayImage::from_fn(dimension, dimension, |x, y| {
        image::Luma([if (x / cell + y / cell) % 2 == 0 { 200 } else { 40 }])
    });
    img.save(path).unwrap();
}

#[test]
fn test_compress_then_decompress() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let records = dir.path().join("input.pifs.json");
    let output = dir.path().join("output.png");
    write_checkerboard(&input, 16, 8);

    let result = pifs_cli()
        .args(["compress", input.to_str().unwrap(), "-o", records.to_str().unwrap()])
        .output()
        .expect("Failed to run pifs");
    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(result.status.success(), "compress failed: {}", stderr);
    assert!(stdout.contains("Wrote 16 transform records"));

    let json = std::fs::read_to_string(&records).unwrap();
    let json: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(json["dimension"], 16);
    assert_eq!(json["records"].as_array().unwrap().len(), 16);

    let result = pifs_cli()
        .args([
            "decompress",
            records.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--iterations",
            "4",
        ])
        .output()
        .expect("Failed to run pifs");
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(result.status.success(), "decompress failed: {}", stderr);

    let restored = image::open(&output).unwrap().to_luma8();
    assert_eq!(restored.dimensions(), (16, 16));
    assert_eq!(restored.get_pixel(0, 0).0[0], 200);
    assert_eq!(restored.get_pixel(8, 0).0[0], 40);
}

#[test]
fn test_roundtrip_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let output = dir.path().join("output.png");
    write_checkerboard(&input, 32, 4);

    let result = pifs_cli()
        .args([
            "roundtrip",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--range",
            "8",
        ])
        .output()
        .expect("Failed to run pifs");
    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(result.status.success(), "roundtrip failed: {}", stderr);
    assert!(stdout.contains("MSE:"));
    assert!(output.exists());
}

#[test]
fn test_rejects_bad_block_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    write_checkerboard(&input, 16, 8);

    let result = pifs_cli()
        .args([
            "compress",
            input.to_str().unwrap(),
            "-o",
            dir.path().join("out.json").to_str().unwrap(),
            "--range",
            "4",
            "--domain",
            "16",
        ])
        .output()
        .expect("Failed to run pifs");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("domain block size"));
}

#[test]
fn test_rejects_non_square_image() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wide.png");
    image::GrayImage::new(16, 8).save(&input).unwrap();

    let result = pifs_cli()
        .args([
            "compress",
            input.to_str().unwrap(),
            "-o",
            dir.path().join("out.json").to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run pifs");
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("square"));
}
