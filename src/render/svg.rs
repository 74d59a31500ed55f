//! Vector export of a composed chart.
//!
//! Produces the same geometry as the GPU scene, with text left to the SVG
//! viewer's font engine.

use std::fmt::{self, Write as _};
use std::path::Path;

use anyhow::Context;

use crate::chart::Chart;
use crate::config::ChartConfig;
use crate::layout::BoundingBox;

/// Render `chart` to an SVG document.
pub fn render_svg(chart: &Chart, config: &ChartConfig) -> String {
    let mut out = String::with_capacity(512 + chart.tiles.len() * 160);
    // Writing into a String is infallible.
    let _ = write_document(&mut out, chart, config);
    out
}

/// Render `chart` and write it to `path`.
pub fn write_svg(chart: &Chart, config: &ChartConfig, path: &Path) -> anyhow::Result<()> {
    let svg = render_svg(chart, config);
    std::fs::write(path, svg).with_context(|| format!("writing SVG to {}", path.display()))?;
    tracing::info!("Wrote SVG chart to {}", path.display());
    Ok(())
}

fn write_document(out: &mut String, chart: &Chart, config: &ChartConfig) -> fmt::Result {
    let style = &config.style;
    let (w, h) = (chart.width, chart.height);

    write!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" \
         width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    )?;
    write!(
        out,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        style.background.to_hex()
    )?;

    out.push_str("<g class=\"tiles\">");
    for (tile, color) in chart.tiles.iter().zip(&chart.tile_colors) {
        write!(
            out,
            "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" fill=\"{}\"><title>",
            tile.x,
            tile.y,
            tile.width,
            tile.height,
            color.to_hex()
        )?;
        svg_escape_into(out, &tile.record.name);
        write!(out, " ({}, rank {})</title></rect>", tile.record.count, tile.record.rank)?;
    }
    out.push_str("</g>");

    if config.show_grid {
        let dashes = style
            .grid_dashes
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(
            out,
            "<g class=\"grid\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\">",
            style.grid_color.to_hex(),
            style.grid_width
        )?;
        for tile in &chart.tiles {
            write_rect(
                out,
                BoundingBox::new(tile.x, tile.y, tile.width, tile.height),
                &format!(" stroke-dasharray=\"{dashes}\""),
            )?;
        }
        // Plot outline stays solid.
        write_rect(out, chart.plot, "")?;
        out.push_str("</g>");
    }

    if let Some(legend) = &chart.legend {
        write!(
            out,
            "<g class=\"legend\" font-family=\"sans-serif\" font-size=\"{:.2}\" fill=\"{}\">",
            legend.font_px,
            style.text_color.to_hex()
        )?;
        write!(
            out,
            "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" fill=\"{}\" \
             stroke=\"{}\" stroke-opacity=\"0.4\"/>",
            legend.frame.x,
            legend.frame.y,
            legend.frame.width,
            legend.frame.height,
            style.background.to_hex(),
            style.grid_color.to_hex()
        )?;
        for entry in &legend.entries {
            write!(
                out,
                "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" fill=\"{}\"/>",
                entry.x,
                entry.y,
                legend.swatch,
                legend.swatch,
                entry.color.to_hex()
            )?;
            write!(
                out,
                "<text x=\"{:.3}\" y=\"{:.3}\" dominant-baseline=\"central\">",
                entry.x + legend.swatch + legend.font_px * 0.6,
                entry.y + legend.swatch / 2.0
            )?;
            svg_escape_into(out, &entry.label);
            out.push_str("</text>");
        }
        out.push_str("</g>");
    }

    if !chart.textboxes.is_empty() {
        let edge = style.textbox_edge.to_hex();
        out.push_str("<g class=\"textboxes\" font-family=\"sans-serif\">");
        for textbox in &chart.textboxes {
            if let Some([x0, y0, x1, y1]) = textbox.leader {
                write!(
                    out,
                    "<line x1=\"{x0:.3}\" y1=\"{y0:.3}\" x2=\"{x1:.3}\" y2=\"{y1:.3}\" stroke=\"{edge}\"/>"
                )?;
            }
            let f = textbox.frame;
            write!(
                out,
                "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\" fill=\"{}\" \
                 fill-opacity=\"{}\" stroke=\"{edge}\"/>",
                f.x,
                f.y,
                f.width,
                f.height,
                style.textbox_fill.to_hex(),
                style.textbox_alpha
            )?;
            write!(
                out,
                "<text x=\"{:.3}\" y=\"{:.3}\" font-size=\"{:.2}\" fill=\"{}\" \
                 text-anchor=\"middle\" dominant-baseline=\"central\">",
                f.x + f.width / 2.0,
                f.y + f.height / 2.0,
                textbox.font_px,
                style.text_color.to_hex()
            )?;
            svg_escape_into(out, &textbox.text);
            out.push_str("</text>");
        }
        out.push_str("</g>");
    }

    out.push_str("</svg>");
    Ok(())
}

fn write_rect(out: &mut String, b: BoundingBox, attrs: &str) -> fmt::Result {
    write!(
        out,
        "<rect x=\"{:.3}\" y=\"{:.3}\" width=\"{:.3}\" height=\"{:.3}\"{attrs}/>",
        b.x, b.y, b.width, b.height
    )
}

fn svg_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
