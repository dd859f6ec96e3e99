//! Class colors and per-state styling.
//!
//! Both mappings are pure: the palette and the opacity table are plain
//! configuration values, and the same class always maps to the same colors.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PALETTE_SIZE;
use crate::model::{ClassId, DetectionId};

/// An RGB color.
pub type Rgb = [u8; 3];

/// Fill and border colors for one palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub fill: Rgb,
    pub border: Rgb,
}

impl ColorPair {
    pub fn new(fill: Rgb, border: Rgb) -> Self {
        Self { fill, border }
    }

    /// Fill as `#rrggbb`.
    pub fn fill_hex(&self) -> String {
        to_hex(self.fill)
    }

    /// Border as `#rrggbb`.
    pub fn border_hex(&self) -> String {
        to_hex(self.border)
    }
}

/// Ordered list of color pairs indexed by `class_id mod len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    entries: Vec<ColorPair>,
}

impl Palette {
    /// Create a palette from explicit entries. Returns None if empty.
    pub fn new(entries: Vec<ColorPair>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    /// Generate `size` well-separated colors by stepping the hue by the
    /// golden angle.
    pub fn generated(size: usize) -> Self {
        let entries = (0..size.max(1))
            .map(|i| {
                let hue = (i as f64 * GOLDEN_ANGLE) % 360.0;
                ColorPair::new(hsv_to_rgb(hue, 0.55, 0.95), hsv_to_rgb(hue, 0.85, 0.7))
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ColorPair] {
        &self.entries
    }

    /// Colors for a class.
    pub fn color_for(&self, class_id: ClassId) -> ColorPair {
        match self.entries.len() {
            0 => ColorPair::new([255, 255, 255], [0, 0, 0]),
            len => self.entries[class_id as usize % len],
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::generated(DEFAULT_PALETTE_SIZE)
    }
}

/// How a detection is drawn relative to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualState {
    /// Nothing is selected
    Normal,
    /// This detection is selected
    Selected,
    /// Another detection is selected
    Dimmed,
}

impl VisualState {
    /// Visual state of detection `id` given the current selection.
    pub fn of(id: DetectionId, selected: Option<DetectionId>) -> Self {
        match selected {
            None => VisualState::Normal,
            Some(sel) if sel == id => VisualState::Selected,
            Some(_) => VisualState::Dimmed,
        }
    }
}

/// Opacity multiplier and stroke width for one visual state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateStyle {
    pub opacity: f64,
    pub stroke_width: f64,
}

impl StateStyle {
    pub fn new(opacity: f64, stroke_width: f64) -> Self {
        Self {
            opacity,
            stroke_width,
        }
    }
}

/// Style per visual state, applied the same way to every class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpacityTable {
    #[serde(default = "default_normal")]
    pub normal: StateStyle,
    #[serde(default = "default_selected")]
    pub selected: StateStyle,
    #[serde(default = "default_dimmed")]
    pub dimmed: StateStyle,
}

fn default_normal() -> StateStyle {
    StateStyle::new(0.8, 2.0)
}

fn default_selected() -> StateStyle {
    StateStyle::new(1.0, 3.0)
}

fn default_dimmed() -> StateStyle {
    StateStyle::new(0.3, 1.0)
}

impl Default for OpacityTable {
    fn default() -> Self {
        Self {
            normal: default_normal(),
            selected: default_selected(),
            dimmed: default_dimmed(),
        }
    }
}

impl OpacityTable {
    pub fn style_for(&self, state: VisualState) -> StateStyle {
        match state {
            VisualState::Normal => self.normal,
            VisualState::Selected => self.selected,
            VisualState::Dimmed => self.dimmed,
        }
    }

    /// All entries, for validation.
    pub(crate) fn entries(&self) -> [(VisualState, StateStyle); 3] {
        [
            (VisualState::Normal, self.normal),
            (VisualState::Selected, self.selected),
            (VisualState::Dimmed, self.dimmed),
        ]
    }
}

/// Hue step between consecutive generated palette slots, in degrees.
const GOLDEN_ANGLE: f64 = 137.5;

/// Color for a hue (degrees), saturation and value (both `[0, 1]`).
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let hue = hue.rem_euclid(360.0);
    let chroma = value * saturation;
    let sector = hue / 60.0;
    let second = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let base = value - chroma;

    let (r, g, b) = match sector as u8 {
        0 => (chroma, second, 0.0),
        1 => (second, chroma, 0.0),
        2 => (0.0, chroma, second),
        3 => (0.0, second, chroma),
        4 => (second, 0.0, chroma),
        _ => (chroma, 0.0, second),
    };
    let byte = |c: f64| ((c + base).clamp(0.0, 1.0) * 255.0).round() as u8;
    [byte(r), byte(g), byte(b)]
}

fn to_hex([r, g, b]: Rgb) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}
