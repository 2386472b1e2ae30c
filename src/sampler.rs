//! Grid sampling: turn the rendered hoop composite into one source color per
//! stitch cell.

use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};

/// Fixed fabric density for generated patterns.
pub const STITCHES_PER_INCH: u32 = 14;

/// Patterns never drop below this many stitches per side, even for tiny hoops.
pub const MIN_GRID_SIZE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoopShape {
    Circle,
    Square,
    Oval,
    Rectangle,
}

/// Physical hoop descriptor. Only the larger dimension drives the stitch
/// grid; the aspect ratio is preview-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoopSpec {
    pub shape: HoopShape,
    pub width_inches: f32,
    pub height_inches: f32,
}

impl HoopSpec {
    pub fn new(shape: HoopShape, width_inches: f32, height_inches: f32) -> Self {
        Self {
            shape,
            width_inches,
            height_inches,
        }
    }

    pub fn circle(diameter_inches: f32) -> Self {
        Self::new(HoopShape::Circle, diameter_inches, diameter_inches)
    }

    /// Parse a hoop size label: a single diameter (`"6"`) or a `WxH` pair
    /// (`"5x7"`). Unparseable labels fall back to a 6 inch hoop.
    pub fn from_label(shape: HoopShape, label: &str) -> Self {
        let rect_like = matches!(shape, HoopShape::Oval | HoopShape::Rectangle);
        if rect_like && label.contains('x') {
            let mut parts = label.splitn(2, 'x');
            let width = parts.next().and_then(|v| v.trim().parse::<f32>().ok());
            let height = parts.next().and_then(|v| v.trim().parse::<f32>().ok());
            if let (Some(width), Some(height)) = (width, height) {
                return Self::new(shape, width, height);
            }
        }
        let diameter = label.trim().parse::<f32>().unwrap_or(6.0);
        Self::new(shape, diameter, diameter)
    }

    /// The resolved diameter: the larger of width/height for non-circular
    /// hoops.
    pub fn diameter_inches(&self) -> f32 {
        self.width_inches.max(self.height_inches)
    }
}

impl Default for HoopSpec {
    fn default() -> Self {
        Self::circle(6.0)
    }
}

/// One sampled grid cell with its source color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledCell {
    pub x: u32,
    pub y: u32,
    pub rgb: [u8; 3],
}

/// Stitches per side for a hoop: `max(40, round(diameter * 14))`.
pub fn grid_size_for(hoop: &HoopSpec) -> u32 {
    let stitches = (hoop.diameter_inches() * STITCHES_PER_INCH as f32).round() as u32;
    stitches.max(MIN_GRID_SIZE)
}

/// Rescale the composite to exactly `grid_size` x `grid_size` and read one
/// RGB triple per cell. Fully transparent pixels become pure white, the
/// designated background fill. Pure function, row-major output.
pub fn sample_grid(image: &DynamicImage, grid_size: u32) -> Vec<SampledCell> {
    let scaled = image
        .resize_exact(grid_size, grid_size, FilterType::Nearest)
        .to_rgba8();

    let mut cells = Vec::with_capacity((grid_size * grid_size) as usize);
    for (x, y, pixel) in scaled.enumerate_pixels() {
        let rgb = if pixel[3] == 0 {
            [255, 255, 255]
        } else {
            [pixel[0], pixel[1], pixel[2]]
        };
        cells.push(SampledCell { x, y, rgb });
    }
    cells
}
