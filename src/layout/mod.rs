pub mod labels;
mod squarify;

use std::fmt;
use std::str::FromStr;

use crate::dataset::{Dataset, Record};
use crate::error::{Error, Result};

pub use labels::{LabelPlacement, TileLabel};

/// The rectangle the waffle is tiled into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box of the given size at the origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Categorical color slot: position `slot` (rank - 1) among `slots` shown tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaletteIndex {
    pub slot: u32,
    pub slots: u32,
}

/// A positioned rectangle representing one record's share of the waffle.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub record: Record,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: PaletteIndex,
    /// Present only when textboxes are enabled.
    pub label: Option<TileLabel>,
}

impl Tile {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn centroid(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Direction of the strips the bounding box is cut into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripAxis {
    /// Each strip runs along the shorter side of the remaining rectangle,
    /// so the cut direction alternates as the rectangle shrinks.
    #[default]
    Alternate,
    /// Horizontal strips stacked top to bottom.
    Rows,
    /// Vertical strips left to right.
    Columns,
}

impl FromStr for StripAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alternate" | "auto" => Ok(StripAxis::Alternate),
            "rows" => Ok(StripAxis::Rows),
            "columns" | "cols" => Ok(StripAxis::Columns),
            other => Err(format!(
                "unknown strip axis '{other}' (expected alternate, rows or columns)"
            )),
        }
    }
}

impl fmt::Display for StripAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StripAxis::Alternate => "alternate",
            StripAxis::Rows => "rows",
            StripAxis::Columns => "columns",
        })
    }
}

/// Configuration for the waffle layout.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub strip_axis: StripAxis,
    /// Compute label anchors and inline/callout placement for every tile.
    pub textboxes: bool,
    /// A tile holds inline text only if it is wider than this (px)...
    pub min_inline_width: f64,
    /// ...and taller than this (px).
    pub min_inline_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strip_axis: StripAxis::Alternate,
            textboxes: false,
            min_inline_width: 72.0,
            min_inline_height: 22.0,
        }
    }
}

/// Tile the records ranked `<= maxrank` into `bbox`, areas proportional to
/// each record's share of the included total.
pub fn layout(
    dataset: &Dataset,
    maxrank: u32,
    bbox: BoundingBox,
    config: &LayoutConfig,
) -> Result<Vec<Tile>> {
    if maxrank == 0 {
        return Err(Error::InvalidCutoff);
    }
    if !bbox.is_valid() {
        return Err(Error::InvalidGeometry {
            width: bbox.width,
            height: bbox.height,
        });
    }

    let view = dataset.view(maxrank);
    if view.is_empty() {
        return Err(Error::EmptyView { maxrank });
    }

    let total: f64 = view.iter().map(|r| r.count as f64).sum();
    let box_area = bbox.area();
    let areas: Vec<f64> = view
        .iter()
        .map(|r| (r.count as f64 / total) * box_area)
        .collect();

    tracing::info!(
        "Laying out {} of {} records (total={}) in {:.0}x{:.0} box",
        view.len(),
        dataset.len(),
        total,
        bbox.width,
        bbox.height
    );

    let positioned = squarify::squarify(&areas, bbox, config.strip_axis);
    debug_assert_eq!(positioned.len(), view.len());

    let slots = view.len() as u32;
    let tiles = view
        .iter()
        .zip(positioned)
        .enumerate()
        .map(|(i, (record, pos))| {
            let label = config
                .textboxes
                .then(|| labels::label_for(record, pos.x, pos.y, pos.w, pos.h, config));
            Tile {
                record: record.clone(),
                x: pos.x,
                y: pos.y,
                width: pos.w,
                height: pos.h,
                color: PaletteIndex {
                    slot: i as u32,
                    slots,
                },
                label,
            }
        })
        .collect();

    Ok(tiles)
}
