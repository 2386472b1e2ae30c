//! Interactive palette editing: single-cell painting, swatch overrides,
//! calibration, and the paint-mode drag state machine.
//!
//! Every mutation goes through [`PatternModel`] and re-derives counts from
//! the cell bindings before returning, so a renderer never observes a
//! half-updated grid or palette.

use crate::dmc::{color_key, is_near_white, squared_distance, DmcCatalog, DmcColor, NearestColorCache};
use crate::pattern::{rebuild_counts, PatternModel, WorkingPaletteEntry};
use crate::symbols::symbol_for_index;
use std::collections::HashMap;

impl PatternModel {
    /// Rebind one cell to `color`, extending the working palette if the color
    /// is new to it.
    ///
    /// No-ops: a near-white paint color while background stitches are off, a
    /// suppressed target cell, or coordinates outside the grid.
    pub fn paint_cell(&mut self, x: u32, y: u32, color: &DmcColor) {
        if !self.config.include_background_stitches && is_near_white(color.rgb) {
            return;
        }
        if x >= self.config.grid_size || y >= self.config.grid_size {
            return;
        }
        let index = (y * self.config.grid_size + x) as usize;
        if self.cells[index].key.is_none() {
            return;
        }

        let paint_key = color_key(color.rgb);
        if self.entry(&paint_key).is_none() {
            // Appended at the end of the current order; the symbol comes from
            // the palette length, existing assignments stay put.
            let symbol = symbol_for_index(self.palette.len());
            self.palette.push(WorkingPaletteEntry {
                color: color.clone(),
                count: 0,
                symbol,
            });
        }
        self.cells[index].key = Some(paint_key);
        rebuild_counts(&mut self.palette, &self.cells);
    }

    /// Replace the displayed color for one swatch without touching cell
    /// bindings or counts.
    pub fn override_swatch(&mut self, original_key: &str, color: DmcColor) {
        self.overrides.insert(original_key.to_string(), color);
    }

    /// Shift the whole working palette toward a chosen catalog color.
    ///
    /// The working entry nearest the target becomes the anchor; every entry
    /// is moved by the anchor's delta, clamped, and mapped back to the
    /// nearest catalog color. The override map is rebuilt from scratch on
    /// each invocation. Unknown floss ids are a no-op.
    pub fn calibrate(&mut self, floss: &str) {
        let catalog = DmcCatalog::global();
        let Some(raw_target) = catalog.find_by_floss(floss) else {
            return;
        };
        if self.palette.is_empty() {
            return;
        }
        let include_background = self.config.include_background_stitches;

        // Calibration must never anchor to a suppressed color.
        let mut target = raw_target.clone();
        if !include_background && is_near_white(target.rgb) {
            if let Some(substitute) = catalog.nearest_excluding_near_white(target.rgb) {
                target = substitute.clone();
            }
        }

        let mut anchor = &self.palette[0];
        let mut anchor_distance = u32::MAX;
        for entry in &self.palette {
            let distance = squared_distance(entry.color.rgb, target.rgb);
            if distance < anchor_distance {
                anchor_distance = distance;
                anchor = entry;
            }
        }

        let delta = [
            target.rgb[0] as i32 - anchor.color.rgb[0] as i32,
            target.rgb[1] as i32 - anchor.color.rgb[1] as i32,
            target.rgb[2] as i32 - anchor.color.rgb[2] as i32,
        ];

        let mut cache = NearestColorCache::new();
        let mut next: HashMap<String, DmcColor> = HashMap::new();
        for entry in &self.palette {
            if !include_background && is_near_white(entry.color.rgb) {
                continue;
            }
            let shifted = [
                (entry.color.rgb[0] as i32 + delta[0]).clamp(0, 255) as u8,
                (entry.color.rgb[1] as i32 + delta[1]).clamp(0, 255) as u8,
                (entry.color.rgb[2] as i32 + delta[2]).clamp(0, 255) as u8,
            ];
            let mut nearest = catalog.color(cache.nearest(shifted)).clone();
            if !include_background && is_near_white(nearest.rgb) {
                if let Some(substitute) = catalog.nearest_excluding_near_white(shifted) {
                    nearest = substitute.clone();
                }
            }
            next.insert(entry.key(), nearest);
        }
        self.overrides = next;
    }

    /// Restore the post-reduction snapshot and drop every override.
    pub fn reset_edits(&mut self) {
        self.restore_snapshot();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Viewing,
    Paint,
}

/// Cell picked in viewing mode, for the single-cell color picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSelection {
    pub x: u32,
    pub y: u32,
    pub key: Option<String>,
}

/// Pointer-driven editing state: viewing/paint toggle plus the active paint
/// drag. Painting is continuous from pointer-down until pointer-up or the
/// pointer leaves the grid.
#[derive(Debug, Clone)]
pub struct EditSession {
    mode: EditorMode,
    paint_color: Option<DmcColor>,
    dragging: bool,
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Viewing,
            paint_color: None,
            dragging: false,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn paint_color(&self) -> Option<&DmcColor> {
        self.paint_color.as_ref()
    }

    pub fn set_paint_mode(&mut self, enabled: bool) {
        self.mode = if enabled {
            EditorMode::Paint
        } else {
            EditorMode::Viewing
        };
        self.dragging = false;
    }

    pub fn set_paint_color(&mut self, color: DmcColor) {
        self.paint_color = Some(color);
    }

    pub fn pointer_down(&mut self, model: &mut PatternModel, x: u32, y: u32) {
        if self.mode != EditorMode::Paint {
            return;
        }
        let Some(color) = self.paint_color.clone() else {
            return;
        };
        self.dragging = true;
        model.paint_cell(x, y, &color);
    }

    pub fn pointer_move(&mut self, model: &mut PatternModel, x: u32, y: u32) {
        if self.mode != EditorMode::Paint || !self.dragging {
            return;
        }
        let Some(color) = self.paint_color.clone() else {
            return;
        };
        model.paint_cell(x, y, &color);
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn pointer_leave(&mut self) {
        self.dragging = false;
    }

    /// In paint mode a click paints; in viewing mode it selects the cell for
    /// the picker.
    pub fn click(&mut self, model: &mut PatternModel, x: u32, y: u32) -> Option<CellSelection> {
        match self.mode {
            EditorMode::Paint => {
                if let Some(color) = self.paint_color.clone() {
                    model.paint_cell(x, y, &color);
                }
                None
            }
            EditorMode::Viewing => model.cell_at(x, y).map(|cell| CellSelection {
                x,
                y,
                key: cell.key.clone(),
            }),
        }
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}
