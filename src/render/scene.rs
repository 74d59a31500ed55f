use std::sync::Arc;

use vello::kurbo::{Affine, Line, Rect, Stroke};
use vello::peniko::{Blob, Fill, ImageAlphaType, ImageBrush, ImageData, ImageFormat};
use vello::Scene;

use super::text::{TextRenderResult, TextRenderer};
use crate::chart::Chart;
use crate::config::ChartConfig;
use crate::layout::BoundingBox;

/// Font slot used for all chart text.
pub const DEFAULT_FONT: &str = "default";

/// Build a Vello scene for a composed chart.
pub fn build_scene(scene: &mut Scene, chart: &Chart, config: &ChartConfig, text_renderer: &mut TextRenderer) {
    let style = &config.style;
    scene.reset();

    let canvas = Rect::new(0.0, 0.0, chart.width, chart.height);
    scene.fill(Fill::NonZero, Affine::IDENTITY, style.background.to_peniko(), None, &canvas);

    for (tile, color) in chart.tiles.iter().zip(&chart.tile_colors) {
        let shape = to_rect(BoundingBox::new(tile.x, tile.y, tile.width, tile.height));
        scene.fill(Fill::NonZero, Affine::IDENTITY, color.to_peniko(), None, &shape);
    }

    if config.show_grid {
        let dashed = Stroke::new(style.grid_width).with_dashes(0.0, style.grid_dashes.iter().copied());
        let grid = style.grid_color.to_peniko();
        for tile in &chart.tiles {
            let shape = to_rect(BoundingBox::new(tile.x, tile.y, tile.width, tile.height));
            scene.stroke(&dashed, Affine::IDENTITY, grid, None, &shape);
        }
        scene.stroke(
            &Stroke::new(style.grid_width),
            Affine::IDENTITY,
            grid,
            None,
            &to_rect(chart.plot),
        );
    }

    let text_rgb = style.text_color.to_rgb8();

    if let Some(legend) = &chart.legend {
        scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            style.background.to_peniko(),
            None,
            &to_rect(legend.frame),
        );
        scene.stroke(
            &Stroke::new(1.0),
            Affine::IDENTITY,
            style.grid_color.with_alpha(0.4).to_peniko(),
            None,
            &to_rect(legend.frame),
        );
        for entry in &legend.entries {
            let swatch = Rect::new(entry.x, entry.y, entry.x + legend.swatch, entry.y + legend.swatch);
            scene.fill(Fill::NonZero, Affine::IDENTITY, entry.color.to_peniko(), None, &swatch);
            let text_x = entry.x + legend.swatch + legend.font_px * 0.6;
            if let Some(text) =
                text_renderer.render_text(&entry.label, DEFAULT_FONT, legend.font_px as f32, None, text_rgb)
            {
                let ty = entry.y + (legend.swatch - text.height as f64) / 2.0;
                draw_text_to_scene(scene, text, text_x, ty);
            }
        }
    }

    if !chart.textboxes.is_empty() {
        let fill = style.textbox_fill.with_alpha(style.textbox_alpha).to_peniko();
        let edge = style.textbox_edge.to_peniko();
        for textbox in &chart.textboxes {
            if let Some([x0, y0, x1, y1]) = textbox.leader {
                scene.stroke(&Stroke::new(1.0), Affine::IDENTITY, edge, None, &Line::new((x0, y0), (x1, y1)));
            }
            let frame = to_rect(textbox.frame);
            scene.fill(Fill::NonZero, Affine::IDENTITY, fill, None, &frame);
            scene.stroke(&Stroke::new(1.0), Affine::IDENTITY, edge, None, &frame);

            if let Some(text) =
                text_renderer.render_text(&textbox.text, DEFAULT_FONT, textbox.font_px as f32, None, text_rgb)
            {
                let tx = textbox.frame.x + (textbox.frame.width - text.width as f64) / 2.0;
                let ty = textbox.frame.y + (textbox.frame.height - text.height as f64) / 2.0;
                draw_text_to_scene(scene, text, tx, ty);
            }
        }
    }
}

fn to_rect(b: BoundingBox) -> Rect {
    Rect::new(b.x, b.y, b.x + b.width, b.y + b.height)
}

/// Draw rendered text to a Vello scene.
fn draw_text_to_scene(scene: &mut Scene, text_result: TextRenderResult, x: f64, y: f64) {
    for glyph in text_result.glyphs {
        if glyph.bitmap.is_empty() {
            continue;
        }

        let brush = ImageBrush::new(image_from_rgba(glyph.bitmap, glyph.width as u32, glyph.height as u32));
        let transform = Affine::translate((x + glyph.x as f64, y + glyph.y as f64));
        scene.draw_image(&brush, transform);
    }
}

/// Create peniko image data from an RGBA pixel buffer.
pub fn image_from_rgba(buf: Vec<u8>, width: u32, height: u32) -> ImageData {
    let data: Arc<dyn AsRef<[u8]> + Send + Sync> = Arc::new(buf);
    ImageData {
        data: Blob::new(data),
        format: ImageFormat::Rgba8,
        alpha_type: ImageAlphaType::Alpha,
        width,
        height,
    }
}
