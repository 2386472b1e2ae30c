//! End-to-end pipeline tests through the public API: decode, sample, reduce,
//! edit, and export.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use stitchuation::{
    build_print_payload, color_key, process_pattern_image, process_pattern_image_from_path,
    CompositeHints, DmcCatalog, HoopShape, HoopSpec, PatternRequest, PrintOptions,
};

fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode test image");
    bytes
}

fn striped_png(size: u32, colors: &[[u8; 4]]) -> Vec<u8> {
    let image = RgbaImage::from_fn(size, size, |x, _| {
        let c = colors[(x as usize * colors.len()) / size as usize];
        Rgba(c)
    });
    encode_png(&image)
}

fn small_request(budget: u32, include_background: bool) -> PatternRequest {
    PatternRequest {
        hoop: HoopSpec::new(HoopShape::Circle, 3.0, 3.0),
        color_budget: budget,
        include_background_stitches: include_background,
        hints: CompositeHints::default(),
    }
}

#[test]
fn pipeline_produces_a_consistent_grid_and_palette() {
    let bytes = striped_png(
        42,
        &[[0, 0, 0, 255], [206, 25, 56, 255], [255, 255, 255, 255]],
    );
    let model = process_pattern_image(&bytes, &small_request(12, false)).unwrap();

    assert_eq!(model.config.grid_size, 42);
    assert_eq!(model.cells.len(), 42 * 42);

    let sum: u32 = model.palette.iter().map(|entry| entry.count).sum();
    assert_eq!(sum, model.stitch_count());
    assert!(model.cells.iter().any(|cell| cell.key.is_none()));
}

#[test]
fn identical_inputs_yield_identical_patterns() {
    let bytes = striped_png(
        42,
        &[[0, 0, 0, 255], [206, 25, 56, 255], [19, 67, 141, 255]],
    );
    let first = process_pattern_image(&bytes, &small_request(2, false)).unwrap();
    let second = process_pattern_image(&bytes, &small_request(2, false)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_input_yields_an_empty_model() {
    let model = process_pattern_image(&[], &small_request(12, false)).unwrap();
    assert!(model.is_empty());
    assert!(model.palette.is_empty());
}

#[test]
fn undecodable_input_is_an_error() {
    let result = process_pattern_image(b"definitely not an image", &small_request(12, false));
    assert!(result.is_err());
}

#[test]
fn fully_transparent_composite_becomes_background() {
    let bytes = encode_png(&RgbaImage::from_pixel(42, 42, Rgba([90, 40, 10, 0])));
    let model = process_pattern_image(&bytes, &small_request(12, false)).unwrap();
    assert!(model.palette.is_empty());
    assert!(model.cells.iter().all(|cell| cell.key.is_none()));
}

#[test]
fn near_black_foreground_hint_forces_black_and_white() {
    let bytes = striped_png(42, &[[10, 10, 10, 255], [255, 255, 255, 255]]);
    let mut request = small_request(12, true);
    request.hints = CompositeHints::from_foreground_hex("#0a0a0a", true);

    let model = process_pattern_image(&bytes, &request).unwrap();
    let flosses: Vec<&str> = model
        .palette
        .iter()
        .map(|entry| entry.color.floss.as_str())
        .collect();
    assert_eq!(flosses, vec!["310", "B5200"]);
    assert_eq!(model.config.color_budget, 2);
}

#[test]
fn edits_reset_to_the_construction_snapshot() {
    let bytes = striped_png(42, &[[0, 0, 0, 255], [206, 25, 56, 255]]);
    let mut model = process_pattern_image(&bytes, &small_request(12, false)).unwrap();
    let pristine = model.clone();

    let green = DmcCatalog::global().find_by_floss("699").unwrap().clone();
    model.paint_cell(0, 0, &green);
    model.paint_cell(5, 5, &green);
    model.override_swatch(&color_key([0, 0, 0]), green);
    model.calibrate("666");
    assert_ne!(model, pristine);

    model.reset_edits();
    assert_eq!(model, pristine);
}

#[test]
fn print_payload_carries_legend_and_shopping_list() {
    let bytes = striped_png(42, &[[0, 0, 0, 255], [206, 25, 56, 255]]);
    let model = process_pattern_image(&bytes, &small_request(12, false)).unwrap();
    let payload = build_print_payload(&model, &PrintOptions::default());

    assert_eq!(payload.grid_size, 42);
    assert_eq!(payload.cells.len(), 42 * 42);
    assert_eq!(payload.legend.len(), 2);
    let shopping = payload.shopping_list.as_ref().unwrap();
    assert_eq!(shopping.len(), 2);
    assert!(shopping.iter().all(|row| !row.skeins_label.is_empty()));
}

#[test]
fn patterns_load_from_a_file_path() {
    let bytes = striped_png(42, &[[0, 0, 0, 255], [206, 25, 56, 255]]);
    let path = std::env::temp_dir().join("stitchuation-pipeline-test.png");
    std::fs::write(&path, &bytes).unwrap();

    let from_path =
        process_pattern_image_from_path(path.to_str().unwrap(), &small_request(12, false))
            .unwrap();
    let from_bytes = process_pattern_image(&bytes, &small_request(12, false)).unwrap();
    assert_eq!(from_path, from_bytes);

    std::fs::remove_file(&path).ok();
}
