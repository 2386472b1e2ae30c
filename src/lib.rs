//! Cross-stitch pattern quantization engine.
//!
//! Converts a rendered hoop composite (RGBA bitmap) into a stitch grid bound
//! to a reduced palette of DMC thread colors, with symbols, interactive
//! recoloring, and material estimates. Rendering the composite and all UI
//! concerns live outside this crate; it consumes a bitmap and produces a
//! pattern model.

mod dmc;
mod editor;
mod estimator;
mod export;
mod pattern;
mod sampler;
mod symbols;

pub use dmc::{
    color_key, is_near_black, is_near_white, parse_hex_color, DmcCatalog, DmcColor,
    NearestColorCache,
};
pub use editor::{CellSelection, EditSession, EditorMode};
pub use estimator::{
    estimate_skeins, estimate_skeins_value, round_up_to_unit, shopping_label,
    SKEIN_LENGTH_INCHES, STITCH_LENGTH_INCHES_AT_14,
};
pub use export::{
    build_print_payload, contrast_color, grid_lines, legend_rows, render_cells, shopping_rows,
    GridLine, LegendRow, PrintOptions, PrintPayload, RenderCell, ShoppingRow,
};
pub use pattern::{
    CompositeHints, GridCell, PatternConfig, PatternModel, PatternRequest, WorkingPaletteEntry,
    DEFAULT_COLOR_BUDGET, MIN_COLOR_BUDGET,
};
pub use sampler::{
    grid_size_for, sample_grid, HoopShape, HoopSpec, SampledCell, MIN_GRID_SIZE,
    STITCHES_PER_INCH,
};
pub use symbols::symbol_for_index;

/// Process a rendered hoop composite into a cross-stitch pattern.
///
/// This is the heavy entry point:
/// - Image decoding and grid sampling
/// - Nearest DMC reference matching (memoized, warmed in parallel)
/// - Palette reduction to the requested color budget with symbol assignment
///
/// # Arguments
/// * `image_bytes` - Raw image bytes (PNG, JPEG, etc.)
/// * `request` - Hoop descriptor, color budget, background-stitch toggle, and
///   composite hints
///
/// # Returns
/// A `PatternModel` ready for rendering, editing, and export. Empty input
/// bytes yield an empty model rather than an error, so callers can show a
/// "no pattern data" state.
pub fn process_pattern_image(
    image_bytes: &[u8],
    request: &PatternRequest,
) -> Result<PatternModel, String> {
    if image_bytes.is_empty() {
        log::warn!("No composite bitmap provided; producing an empty pattern");
        return Ok(PatternModel::empty());
    }

    log::info!(
        "Processing pattern: {} bytes, budget {}, background stitches {}",
        image_bytes.len(),
        request.color_budget,
        request.include_background_stitches
    );

    let image = image::load_from_memory(image_bytes)
        .map_err(|e| format!("Failed to decode image: {}", e))?;
    let model = PatternModel::generate(&image, request);

    log::info!(
        "Pattern generated: {}x{} grid, {} stitches, {} colors",
        model.config.grid_size,
        model.config.grid_size,
        model.stitch_count(),
        model.palette.len()
    );

    Ok(model)
}

/// Process a composite from a file path instead of bytes.
pub fn process_pattern_image_from_path(
    path: &str,
    request: &PatternRequest,
) -> Result<PatternModel, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Failed to read file: {}", e))?;
    process_pattern_image(&bytes, request)
}
