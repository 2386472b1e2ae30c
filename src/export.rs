//! Renderable and printable views of a pattern: the annotated grid, the
//! palette legend, and the floss shopping list.

use crate::dmc::is_near_white;
use crate::estimator::{
    estimate_skeins, estimate_skeins_value, round_up_to_unit, shopping_label,
};
use crate::pattern::PatternModel;
use serde::{Deserialize, Serialize};

/// Every 10th grid line is drawn heavier to help counting.
pub const MAJOR_GRIDLINE_INTERVAL: u32 = 10;

/// One drawable stitch: resolved fill color, symbol, and a contrasting glyph
/// color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCell {
    pub x: u32,
    pub y: u32,
    pub hex: String,
    pub symbol: String,
    pub symbol_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLine {
    pub index: u32,
    pub major: bool,
}

/// Legend row: symbol, floss id, name, displayed color, count, and skein
/// estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendRow {
    pub symbol: String,
    pub floss: String,
    pub name: String,
    pub hex: String,
    pub stitch_count: u32,
    pub skein_estimate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingRow {
    pub floss: String,
    pub name: String,
    pub hex: String,
    pub skeins_label: String,
}

/// Print/export options mirrored from the pattern settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    pub strands: u32,
    pub include_shopping_list: bool,
    pub shopping_round_to: f64,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            strands: 2,
            include_shopping_list: true,
            shopping_round_to: 1.0,
        }
    }
}

/// Everything a print template needs, pre-resolved and pre-rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintPayload {
    pub grid_size: u32,
    pub stitches_per_inch: u32,
    pub cells: Vec<RenderCell>,
    pub grid_lines: Vec<GridLine>,
    pub legend: Vec<LegendRow>,
    pub shopping_list: Option<Vec<ShoppingRow>>,
}

/// Glyph color with readable contrast against a stitch fill.
pub fn contrast_color(rgb: [u8; 3]) -> &'static str {
    let luminance =
        (0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32) / 255.0;
    if luminance > 0.6 {
        "#111111"
    } else {
        "#ffffff"
    }
}

/// Drawable cells: suppressed cells are omitted, and so is any cell whose
/// resolved display color is near-white while background stitches are off.
pub fn render_cells(model: &PatternModel) -> Vec<RenderCell> {
    let include_background = model.config.include_background_stitches;
    let mut cells = Vec::new();
    for cell in &model.cells {
        let Some(key) = &cell.key else {
            continue;
        };
        let Some(entry) = model.entry(key) else {
            continue;
        };
        let Some(color) = model.display_color(key) else {
            continue;
        };
        if !include_background && is_near_white(color.rgb) {
            continue;
        }
        cells.push(RenderCell {
            x: cell.x,
            y: cell.y,
            hex: color.hex.clone(),
            symbol: entry.symbol.clone(),
            symbol_color: contrast_color(color.rgb).to_string(),
        });
    }
    cells
}

/// Stroke layout for one axis; both axes share it on a square grid.
pub fn grid_lines(grid_size: u32) -> Vec<GridLine> {
    (0..=grid_size)
        .map(|index| GridLine {
            index,
            major: index % MAJOR_GRIDLINE_INTERVAL == 0,
        })
        .collect()
}

/// Legend rows in descending stitch-count order, override-aware.
pub fn legend_rows(model: &PatternModel, strands: u32) -> Vec<LegendRow> {
    model
        .visible_palette()
        .into_iter()
        .map(|entry| {
            let key = entry.key();
            let display = model.display_color(&key).unwrap_or(&entry.color);
            LegendRow {
                symbol: entry.symbol.clone(),
                floss: entry.color.floss.clone(),
                name: entry.color.name.clone(),
                hex: display.hex.clone(),
                stitch_count: entry.count,
                skein_estimate: estimate_skeins(
                    entry.count,
                    model.config.stitches_per_inch,
                    strands,
                ),
            }
        })
        .collect()
}

/// Shopping rows with skein quantities rounded up to the configured unit.
pub fn shopping_rows(model: &PatternModel, strands: u32, round_to: f64) -> Vec<ShoppingRow> {
    model
        .visible_palette()
        .into_iter()
        .map(|entry| {
            let key = entry.key();
            let display = model.display_color(&key).unwrap_or(&entry.color);
            let raw = estimate_skeins_value(entry.count, model.config.stitches_per_inch, strands);
            let rounded = round_up_to_unit(raw, round_to);
            ShoppingRow {
                floss: entry.color.floss.clone(),
                name: entry.color.name.clone(),
                hex: display.hex.clone(),
                skeins_label: shopping_label(rounded, round_to),
            }
        })
        .collect()
}

/// Assemble the full print payload for a pattern.
pub fn build_print_payload(model: &PatternModel, options: &PrintOptions) -> PrintPayload {
    PrintPayload {
        grid_size: model.config.grid_size,
        stitches_per_inch: model.config.stitches_per_inch,
        cells: render_cells(model),
        grid_lines: grid_lines(model.config.grid_size),
        legend: legend_rows(model, options.strands),
        shopping_list: options
            .include_shopping_list
            .then(|| shopping_rows(model, options.strands, options.shopping_round_to)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmc::DmcCatalog;
    use crate::pattern::{CompositeHints, PatternRequest};
    use crate::sampler::{HoopShape, HoopSpec};
    use image::{DynamicImage, Rgba, RgbaImage};

    fn black_white_model(include_background: bool) -> PatternModel {
        let image = RgbaImage::from_fn(42, 42, |x, _| {
            if x < 21 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        PatternModel::generate(
            &DynamicImage::ImageRgba8(image),
            &PatternRequest {
                hoop: HoopSpec::new(HoopShape::Circle, 3.0, 3.0),
                color_budget: 12,
                include_background_stitches: include_background,
                hints: CompositeHints::default(),
            },
        )
    }

    #[test]
    fn contrast_flips_on_luminance() {
        assert_eq!(contrast_color([0, 0, 0]), "#ffffff");
        assert_eq!(contrast_color([255, 255, 255]), "#111111");
        assert_eq!(contrast_color([255, 230, 0]), "#111111");
    }

    #[test]
    fn every_tenth_line_is_major() {
        let lines = grid_lines(42);
        assert_eq!(lines.len(), 43);
        assert!(lines[0].major);
        assert!(lines[10].major);
        assert!(lines[40].major);
        assert!(!lines[7].major);
        assert!(!lines[42].major);
    }

    #[test]
    fn suppressed_cells_are_not_rendered() {
        let model = black_white_model(false);
        let cells = render_cells(&model);
        assert_eq!(cells.len(), 21 * 42);
        assert!(cells.iter().all(|cell| cell.x < 21));
    }

    #[test]
    fn background_stitches_render_when_enabled() {
        let model = black_white_model(true);
        let cells = render_cells(&model);
        assert_eq!(cells.len(), 42 * 42);
    }

    #[test]
    fn legend_rows_follow_overrides() {
        let mut model = black_white_model(false);
        let key = model.palette[0].key();
        let green = DmcCatalog::global().find_by_floss("699").unwrap().clone();
        model.override_swatch(&key, green.clone());

        let rows = legend_rows(&model, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].floss, "310");
        assert_eq!(rows[0].hex, green.hex);
        assert_eq!(rows[0].stitch_count, 21 * 42);
    }

    #[test]
    fn shopping_rows_round_up() {
        let model = black_white_model(false);
        // 882 stitches at 2 strands: 882 * 1.6 / 313.2 = 4.5057... skeins.
        let rows = shopping_rows(&model, 2, 1.0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].skeins_label, "5");

        let rows = shopping_rows(&model, 2, 0.25);
        assert_eq!(rows[0].skeins_label, "4.75");
    }

    #[test]
    fn payload_skips_shopping_list_when_disabled() {
        let model = black_white_model(false);
        let options = PrintOptions {
            include_shopping_list: false,
            ..PrintOptions::default()
        };
        let payload = build_print_payload(&model, &options);
        assert!(payload.shopping_list.is_none());
        assert_eq!(payload.grid_size, 42);
        assert_eq!(payload.legend.len(), 1);
    }

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let model = black_white_model(false);
        let payload = build_print_payload(&model, &PrintOptions::default());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("gridSize").is_some());
        assert!(json.get("stitchesPerInch").is_some());
        assert!(json["legend"][0].get("skeinEstimate").is_some());
    }

    #[test]
    fn empty_model_produces_empty_views() {
        let model = PatternModel::empty();
        assert!(render_cells(&model).is_empty());
        assert!(legend_rows(&model, 2).is_empty());
        assert!(shopping_rows(&model, 2, 1.0).is_empty());
    }
}
