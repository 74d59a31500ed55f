//! Figure composition: where the waffle, legend and textboxes go on the canvas.
//!
//! Everything here is plain geometry so the window, raster and SVG outputs
//! draw exactly the same chart.

use crate::config::ChartConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::layout::{self, BoundingBox, LabelPlacement, Tile};
use crate::render::colors::{palette_color, AppColor};

/// Average glyph advance as a fraction of font size, used to size boxes
/// before any font is loaded.
const APPROX_CHAR_WIDTH: f64 = 0.58;
const LINE_HEIGHT: f64 = 1.4;
const TEXTBOX_PAD: f64 = 3.0;
const CALLOUT_OFFSET: f64 = 10.0;
const CALLOUT_MAX_NUDGES: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: AppColor,
    /// Top-left of the color swatch.
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub frame: BoundingBox,
    pub columns: usize,
    pub rows: usize,
    pub swatch: f64,
    pub font_px: f64,
    pub entries: Vec<LegendEntry>,
}

/// A placed text label with its backing box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub text: String,
    pub frame: BoundingBox,
    pub font_px: f64,
    pub placement: LabelPlacement,
    /// Leader line from the tile anchor to the box, for callouts.
    pub leader: Option<[f64; 4]>,
}

/// A fully composed figure.
#[derive(Debug, Clone)]
pub struct Chart {
    pub width: f64,
    pub height: f64,
    pub maxrank: u32,
    /// Area covered by the waffle tiles.
    pub plot: BoundingBox,
    pub tiles: Vec<Tile>,
    pub tile_colors: Vec<AppColor>,
    pub legend: Option<Legend>,
    pub textboxes: Vec<TextBox>,
}

/// Number of legend columns for `entries` with at most `max_rows` per column.
pub fn legend_columns(entries: usize, max_rows: usize) -> usize {
    entries.div_ceil(max_rows.max(1)).max(1)
}

/// Compose the chart for a `width`×`height` px canvas.
pub fn compose(
    dataset: &Dataset,
    maxrank: u32,
    config: &ChartConfig,
    width: f64,
    height: f64,
) -> Result<Chart> {
    let style = &config.style;
    let margin = style.margin_px;

    let legend_width = if config.show_legend {
        legend_width(dataset, maxrank, config)
    } else {
        0.0
    };

    let plot = BoundingBox::new(
        margin,
        margin,
        width - 2.0 * margin - legend_width,
        height - 2.0 * margin,
    );
    let tiles = layout::layout(dataset, maxrank, plot, &config.layout)?;
    let tile_colors: Vec<AppColor> = tiles.iter().map(|t| palette_color(t.color, style)).collect();

    let legend = config
        .show_legend
        .then(|| build_legend(&tiles, &tile_colors, plot, config));

    let textboxes = if config.layout.textboxes {
        place_textboxes(&tiles, width, height, legend.as_ref().map(|l| l.frame), config)
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Composed {}x{} chart: plot {:.0}x{:.0}, {} tiles, {} textboxes, legend={}",
        width,
        height,
        plot.width,
        plot.height,
        tiles.len(),
        textboxes.len(),
        legend.is_some()
    );

    Ok(Chart {
        width,
        height,
        maxrank,
        plot,
        tiles,
        tile_colors,
        legend,
        textboxes,
    })
}

fn legend_metrics(config: &ChartConfig) -> (f64, f64, f64) {
    let font_px = config.pt_to_px(config.style.legend_font_pt);
    let swatch = font_px;
    let row_height = font_px * LINE_HEIGHT;
    (font_px, swatch, row_height)
}

fn column_width(labels: impl Iterator<Item = usize>, font_px: f64, swatch: f64) -> f64 {
    let longest = labels.max().unwrap_or(0) as f64;
    swatch + font_px * 0.6 + longest * font_px * APPROX_CHAR_WIDTH + font_px
}

fn legend_width(dataset: &Dataset, maxrank: u32, config: &ChartConfig) -> f64 {
    let view = dataset.view(maxrank);
    if view.is_empty() {
        return 0.0;
    }
    let (font_px, swatch, _) = legend_metrics(config);
    let columns = legend_columns(view.len(), config.style.legend_max_rows);
    let max_chars = config.style.legend_max_chars;
    let col_w = column_width(
        view.iter().map(|r| r.name.chars().count().min(max_chars)),
        font_px,
        swatch,
    );
    // Panel padding on both sides plus the gap to the plot.
    columns as f64 * col_w + font_px * 2.0 + config.style.margin_px
}

fn build_legend(tiles: &[Tile], colors: &[AppColor], plot: BoundingBox, config: &ChartConfig) -> Legend {
    let (font_px, swatch, row_height) = legend_metrics(config);
    let max_chars = config.style.legend_max_chars;
    let columns = legend_columns(tiles.len(), config.style.legend_max_rows);
    let rows = tiles.len().div_ceil(columns);

    let labels: Vec<String> = tiles
        .iter()
        .map(|t| truncate_label(&t.record.name, max_chars))
        .collect();
    let col_w = column_width(labels.iter().map(|l| l.chars().count()), font_px, swatch);

    let x0 = plot.x + plot.width + config.style.margin_px;
    let y0 = plot.y;
    let pad = font_px;

    // Column-major, like a matplotlib legend with ncol > 1.
    let entries = labels
        .into_iter()
        .zip(colors)
        .enumerate()
        .map(|(i, (label, &color))| {
            let col = i / rows;
            let row = i % rows;
            LegendEntry {
                label,
                color,
                x: x0 + pad + col as f64 * col_w,
                y: y0 + pad + row as f64 * row_height + (row_height - swatch) / 2.0,
            }
        })
        .collect();

    Legend {
        frame: BoundingBox::new(
            x0,
            y0,
            columns as f64 * col_w + 2.0 * pad,
            rows as f64 * row_height + 2.0 * pad,
        ),
        columns,
        rows,
        swatch,
        font_px,
        entries,
    }
}

/// Inline labels are centred on their tile; callouts are placed up and to the
/// right of the anchor and nudged down until they clear every placed box and
/// the legend panel.
fn place_textboxes(
    tiles: &[Tile],
    width: f64,
    height: f64,
    legend: Option<BoundingBox>,
    config: &ChartConfig,
) -> Vec<TextBox> {
    let font_px = config.pt_to_px(config.style.textbox_font_pt);
    let box_h = font_px * LINE_HEIGHT + 2.0 * TEXTBOX_PAD;
    let box_w = |text: &str| text.chars().count() as f64 * font_px * APPROX_CHAR_WIDTH + 2.0 * TEXTBOX_PAD;

    let mut placed: Vec<TextBox> = Vec::new();

    for tile in tiles {
        let Some(label) = &tile.label else { continue };
        if label.placement != LabelPlacement::Inline {
            continue;
        }
        let w = box_w(&label.text);
        placed.push(TextBox {
            text: label.text.clone(),
            frame: BoundingBox::new(label.anchor_x - w / 2.0, label.anchor_y - box_h / 2.0, w, box_h),
            font_px,
            placement: LabelPlacement::Inline,
            leader: None,
        });
    }

    for tile in tiles {
        let Some(label) = &tile.label else { continue };
        if label.placement != LabelPlacement::Callout {
            continue;
        }
        let w = box_w(&label.text);
        // Callouts stay left of the legend panel.
        let right = legend.map_or(width, |l| l.x);
        let mut x = (label.anchor_x + CALLOUT_OFFSET).min(right - w).max(0.0);
        let mut y = (label.anchor_y - CALLOUT_OFFSET - box_h).max(0.0);
        for _ in 0..CALLOUT_MAX_NUDGES {
            let candidate = BoundingBox::new(x, y, w, box_h);
            let blocked = placed.iter().any(|p| rects_overlap(p.frame, candidate))
                || legend.is_some_and(|l| rects_overlap(l, candidate));
            if !blocked {
                break;
            }
            y += box_h + 2.0;
            if y + box_h > height {
                // Ran off the bottom: restart at the top, one box further right.
                y = 0.0;
                x = (x + w / 2.0).min(right - w).max(0.0);
            }
        }
        let frame = BoundingBox::new(x, y, w, box_h);
        let (lx, ly) = nearest_point(frame, label.anchor_x, label.anchor_y);
        placed.push(TextBox {
            text: label.text.clone(),
            frame,
            font_px,
            placement: LabelPlacement::Callout,
            leader: Some([label.anchor_x, label.anchor_y, lx, ly]),
        });
    }

    placed
}

fn rects_overlap(a: BoundingBox, b: BoundingBox) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

fn nearest_point(frame: BoundingBox, x: f64, y: f64) -> (f64, f64) {
    (
        x.clamp(frame.x, frame.x + frame.width),
        y.clamp(frame.y, frame.y + frame.height),
    )
}

/// Shorten `name` to at most `max_chars` characters, ending in "...".
pub fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let truncated: String = name.chars().take(max_chars - 3).collect();
    format!("{truncated}...")
}
