use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::layout::LayoutConfig;
use crate::render::colors::{AppColor, Colormap};

/// Figure size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

impl FigureSize {
    pub const fn square(side: f64) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Size in pixels at `dpi`.
    pub fn to_pixels(self, dpi: f64) -> (f64, f64) {
        (self.width * dpi, self.height * dpi)
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        Self::square(10.0)
    }
}

impl FromStr for FigureSize {
    type Err = String;

    /// Accepts `N` (square) or `WxH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", v.trim()))
        };
        match s.split_once(['x', 'X']) {
            Some((w, h)) => Ok(Self {
                width: parse(w)?,
                height: parse(h)?,
            }),
            None => Ok(Self::square(parse(s)?)),
        }
    }
}

impl fmt::Display for FigureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == self.height {
            write!(f, "{}", self.width)
        } else {
            write!(f, "{}x{}", self.width, self.height)
        }
    }
}

/// Plot aesthetics shared by the window, raster and SVG outputs.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    pub background: AppColor,
    pub colormap: Colormap,
    pub margin_px: f64,

    pub grid_color: AppColor,
    pub grid_width: f64,
    /// Dash-dot pattern, in px.
    pub grid_dashes: Vec<f64>,

    pub legend_max_rows: usize,
    pub legend_font_pt: f64,
    /// Names longer than this are truncated with an ellipsis.
    pub legend_max_chars: usize,

    pub text_color: AppColor,
    pub textbox_font_pt: f64,
    pub textbox_fill: AppColor,
    pub textbox_alpha: f32,
    pub textbox_edge: AppColor,

    /// Font used for legend and textboxes; system fonts are tried if unset.
    pub font_path: Option<PathBuf>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: AppColor::new(1.0, 1.0, 1.0),
            colormap: Colormap::Ncar,
            margin_px: 24.0,
            grid_color: AppColor::new(0.15, 0.15, 0.18),
            grid_width: 1.0,
            grid_dashes: vec![8.0, 4.0, 2.0, 4.0],
            legend_max_rows: 12,
            legend_font_pt: 10.0,
            legend_max_chars: 24,
            text_color: AppColor::new(0.0, 0.0, 0.0),
            textbox_font_pt: 9.0,
            textbox_fill: AppColor::new(1.0, 1.0, 1.0),
            textbox_alpha: 0.5,
            textbox_edge: AppColor::new(0.0, 0.0, 0.0),
            font_path: None,
        }
    }
}

/// Everything the layout engine and the renderers need for one chart.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub figure: FigureSize,
    /// Pixels per inch.
    pub dpi: f64,
    pub show_legend: bool,
    pub show_grid: bool,
    pub layout: LayoutConfig,
    pub style: StyleConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            figure: FigureSize::default(),
            dpi: 100.0,
            show_legend: true,
            show_grid: true,
            layout: LayoutConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

impl ChartConfig {
    /// Figure size in pixels.
    pub fn canvas_size(&self) -> (f64, f64) {
        self.figure.to_pixels(self.dpi)
    }

    /// Convert a font size in points to pixels at this config's dpi.
    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }
}
