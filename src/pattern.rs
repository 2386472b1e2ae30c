//! Pattern model and the palette-reduction pipeline.
//!
//! Construction flows one way: sampled grid -> full reference mapping ->
//! reduced working palette -> symbols -> model. Editing operations re-derive
//! counts and palettes wholesale from the cell bindings rather than patching
//! them incrementally; the invariants in the tests below depend on that.

use crate::dmc::{
    color_key, is_near_black, is_near_white, squared_distance, DmcCatalog, DmcColor,
    NearestColorCache,
};
use crate::sampler::{grid_size_for, sample_grid, HoopSpec, STITCHES_PER_INCH};
use crate::symbols::symbol_for_index;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const MIN_COLOR_BUDGET: u32 = 2;
pub const DEFAULT_COLOR_BUDGET: u32 = 12;

/// One stitch cell. `key` is the `"r,g,b"` key of the bound working color,
/// `None` when the cell is suppressed (near-white with background stitches
/// disabled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
    pub key: Option<String>,
}

/// Working-palette entry: a reference color, its authoritative stitch count,
/// and the display symbol assigned at reduction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingPaletteEntry {
    pub color: DmcColor,
    pub count: u32,
    pub symbol: String,
}

impl WorkingPaletteEntry {
    pub fn key(&self) -> String {
        color_key(self.color.rgb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternConfig {
    pub grid_size: u32,
    pub stitches_per_inch: u32,
    pub color_budget: u32,
    pub max_color_budget: u32,
    pub include_background_stitches: bool,
}

/// Hints handed over by the composite renderer: the intended foreground color
/// and whether the preview background is white. Only used to detect the
/// two-color high-contrast mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompositeHints {
    pub foreground_rgb: Option<[u8; 3]>,
    pub background_is_white: bool,
}

impl CompositeHints {
    /// Build hints from the renderer's foreground hex string. Unparseable
    /// values leave the foreground hint unset.
    pub fn from_foreground_hex(value: &str, background_is_white: bool) -> Self {
        Self {
            foreground_rgb: crate::dmc::parse_hex_color(value),
            background_is_white,
        }
    }
}

/// Everything the engine needs besides the bitmap itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternRequest {
    pub hoop: HoopSpec,
    pub color_budget: u32,
    pub include_background_stitches: bool,
    pub hints: CompositeHints,
}

impl Default for PatternRequest {
    fn default() -> Self {
        Self {
            hoop: HoopSpec::default(),
            color_budget: DEFAULT_COLOR_BUDGET,
            include_background_stitches: false,
            hints: CompositeHints::default(),
        }
    }
}

/// The reduced pattern: grid cells, working palette, display overrides, and
/// the snapshot used by "reset edits".
///
/// The per-cell reference assignments from construction are retained so that
/// budget or background-toggle changes re-derive the grid from the same
/// source of truth without another bitmap decode.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternModel {
    pub config: PatternConfig,
    pub cells: Vec<GridCell>,
    pub palette: Vec<WorkingPaletteEntry>,
    pub overrides: HashMap<String, DmcColor>,
    hints: CompositeHints,
    reference_cells: Vec<(u32, u32, usize)>,
    snapshot_cells: Vec<GridCell>,
    snapshot_palette: Vec<WorkingPaletteEntry>,
}

impl PatternModel {
    /// The "no pattern data" state produced for missing input.
    pub fn empty() -> Self {
        Self {
            config: PatternConfig {
                grid_size: 0,
                stitches_per_inch: STITCHES_PER_INCH,
                color_budget: MIN_COLOR_BUDGET,
                max_color_budget: MIN_COLOR_BUDGET,
                include_background_stitches: false,
            },
            cells: Vec::new(),
            palette: Vec::new(),
            overrides: HashMap::new(),
            hints: CompositeHints::default(),
            reference_cells: Vec::new(),
            snapshot_cells: Vec::new(),
            snapshot_palette: Vec::new(),
        }
    }

    /// Sample the composite into a stitch grid, map every cell to its nearest
    /// reference color, and run the first reduction pass.
    pub fn generate(image: &DynamicImage, request: &PatternRequest) -> Self {
        let grid_size = grid_size_for(&request.hoop);
        let sampled = sample_grid(image, grid_size);

        // One memoized lookup table per construction pass; warmed in
        // parallel over the distinct sampled colors.
        let mut cache = NearestColorCache::new();
        let mut seen = HashSet::new();
        let distinct: Vec<[u8; 3]> = sampled
            .iter()
            .map(|cell| cell.rgb)
            .filter(|rgb| seen.insert(*rgb))
            .collect();
        cache.warm(&distinct);

        let reference_cells: Vec<(u32, u32, usize)> = sampled
            .iter()
            .map(|cell| (cell.x, cell.y, cache.nearest(cell.rgb)))
            .collect();

        let mut model = Self {
            config: PatternConfig {
                grid_size,
                stitches_per_inch: STITCHES_PER_INCH,
                color_budget: request.color_budget,
                max_color_budget: MIN_COLOR_BUDGET,
                include_background_stitches: request.include_background_stitches,
            },
            cells: Vec::new(),
            palette: Vec::new(),
            overrides: HashMap::new(),
            hints: request.hints,
            reference_cells,
            snapshot_cells: Vec::new(),
            snapshot_palette: Vec::new(),
        };
        model.reduce(request.color_budget, request.include_background_stitches);
        model
    }

    /// Re-run the reduction against the retained reference assignments.
    /// Replaces cells, palette, symbols, and the reset snapshot; clears all
    /// overrides.
    fn reduce(&mut self, requested_budget: u32, include_background: bool) {
        let catalog = DmcCatalog::global();

        // Frequency tally in first-encountered order so that ranking ties
        // stay deterministic.
        let mut slot: HashMap<usize, usize> = HashMap::new();
        let mut tally: Vec<(usize, u32)> = Vec::new();
        for &(_, _, reference) in &self.reference_cells {
            match slot.get(&reference) {
                Some(&at) => tally[at].1 += 1,
                None => {
                    slot.insert(reference, tally.len());
                    tally.push((reference, 1));
                }
            }
        }

        let forced_black_white = include_background
            && self.hints.background_is_white
            && self.hints.foreground_rgb.map(is_near_black).unwrap_or(false);

        let (working, max_budget, budget) = if forced_black_white {
            // Deliberate two-color high-contrast mode for near-black artwork
            // on a white background.
            let black = catalog.nearest_index([0, 0, 0]);
            let white = catalog.nearest_index([255, 255, 255]);
            let mut unique: Vec<usize> = Vec::new();
            for index in [black, white] {
                if !unique.contains(&index) {
                    unique.push(index);
                }
            }
            (unique, MIN_COLOR_BUDGET, MIN_COLOR_BUDGET)
        } else {
            let mut surviving: Vec<(usize, u32)> = tally
                .iter()
                .filter(|(reference, _)| {
                    include_background || !is_near_white(catalog.color(*reference).rgb)
                })
                .copied()
                .collect();
            // Stable sort: equal counts keep first-encountered order.
            surviving.sort_by(|a, b| b.1.cmp(&a.1));

            let max_budget = (surviving.len() as u32).max(MIN_COLOR_BUDGET);
            let budget = requested_budget.clamp(MIN_COLOR_BUDGET, max_budget);
            let working = surviving
                .iter()
                .take(budget as usize)
                .map(|(reference, _)| *reference)
                .collect();
            (working, max_budget, budget)
        };

        let working_colors: Vec<DmcColor> = working
            .iter()
            .map(|&reference| catalog.color(reference).clone())
            .collect();

        // Independent cache per reduction run; the working set changes with
        // every budget or background change.
        let mut working_cache: HashMap<[u8; 3], usize> = HashMap::new();
        let cells: Vec<GridCell> = self
            .reference_cells
            .iter()
            .map(|&(x, y, reference)| {
                let rgb = catalog.color(reference).rgb;
                let key = if !include_background && is_near_white(rgb) {
                    None
                } else {
                    nearest_working(&working_colors, &mut working_cache, rgb)
                        .map(|at| color_key(working_colors[at].rgb))
                };
                GridCell { x, y, key }
            })
            .collect();

        let mut palette: Vec<WorkingPaletteEntry> = working_colors
            .into_iter()
            .enumerate()
            .map(|(index, color)| WorkingPaletteEntry {
                color,
                count: 0,
                symbol: symbol_for_index(index),
            })
            .collect();
        rebuild_counts(&mut palette, &cells);

        self.config.color_budget = budget;
        self.config.max_color_budget = max_budget;
        self.config.include_background_stitches = include_background;
        self.cells = cells;
        self.palette = palette;
        self.overrides.clear();
        self.snapshot_cells = self.cells.clone();
        self.snapshot_palette = self.palette.clone();
    }

    /// Change the working-color budget and re-derive the pattern.
    pub fn set_color_budget(&mut self, budget: u32) {
        let include_background = self.config.include_background_stitches;
        self.reduce(budget, include_background);
    }

    /// Toggle white background stitches and re-derive the pattern.
    pub fn set_background_stitches(&mut self, include_background: bool) {
        let budget = self.config.color_budget;
        self.reduce(budget, include_background);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of non-suppressed cells.
    pub fn stitch_count(&self) -> u32 {
        self.cells.iter().filter(|cell| cell.key.is_some()).count() as u32
    }

    pub fn cell_at(&self, x: u32, y: u32) -> Option<&GridCell> {
        if x >= self.config.grid_size || y >= self.config.grid_size {
            return None;
        }
        self.cells.get((y * self.config.grid_size + x) as usize)
    }

    pub fn entry(&self, key: &str) -> Option<&WorkingPaletteEntry> {
        self.palette.iter().find(|entry| entry.key() == key)
    }

    /// Display color for a working key: the override if one is set, the
    /// palette color otherwise.
    pub fn display_color(&self, key: &str) -> Option<&DmcColor> {
        if let Some(replacement) = self.overrides.get(key) {
            return Some(replacement);
        }
        self.entry(key).map(|entry| &entry.color)
    }

    /// Palette entries visible in the legend, most-stitched first.
    /// Near-white entries are hidden while background stitches are off.
    pub fn visible_palette(&self) -> Vec<&WorkingPaletteEntry> {
        let mut entries: Vec<&WorkingPaletteEntry> = self
            .palette
            .iter()
            .filter(|entry| {
                self.config.include_background_stitches || !is_near_white(entry.color.rgb)
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }

    pub(crate) fn restore_snapshot(&mut self) {
        self.cells = self.snapshot_cells.clone();
        self.palette = self.snapshot_palette.clone();
        self.overrides.clear();
    }
}

fn nearest_working(
    working: &[DmcColor],
    cache: &mut HashMap<[u8; 3], usize>,
    rgb: [u8; 3],
) -> Option<usize> {
    if working.is_empty() {
        return None;
    }
    if let Some(&at) = cache.get(&rgb) {
        return Some(at);
    }
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (at, color) in working.iter().enumerate() {
        let distance = squared_distance(rgb, color.rgb);
        if distance < best_distance {
            best_distance = distance;
            best = at;
        }
    }
    cache.insert(rgb, best);
    Some(best)
}

/// Recompute every entry's count by re-scanning all cells. Authoritative:
/// counts are never trusted across structural changes.
pub(crate) fn rebuild_counts(palette: &mut [WorkingPaletteEntry], cells: &[GridCell]) {
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    for (at, entry) in palette.iter_mut().enumerate() {
        entry.count = 0;
        index_by_key.insert(entry.key(), at);
    }
    for cell in cells {
        if let Some(key) = &cell.key {
            if let Some(&at) = index_by_key.get(key) {
                palette[at].count += 1;
            }
        }
    }
}
