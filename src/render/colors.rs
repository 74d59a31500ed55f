use std::fmt;
use std::str::FromStr;

use vello::peniko::Color;

use crate::config::StyleConfig;
use crate::layout::PaletteIndex;

/// Our custom color representation for easy manipulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl AppColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Convert to vello's peniko Color (AlphaColor<Srgb>).
    pub fn to_peniko(self) -> Color {
        Color::new([self.r, self.g, self.b, self.a])
    }

    /// `#rrggbb`, alpha dropped (SVG carries it as `fill-opacity`).
    pub fn to_hex(self) -> String {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b)]
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: 1.0,
        }
    }
}

/// Continuous colormap sampled to give each rank a categorical color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// NCAR-style spectrum: navy → cyan → green → yellow → red → magenta → white.
    #[default]
    Ncar,
    /// Fully saturated hue wheel.
    Hue,
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ncar" | "gist_ncar" => Ok(Colormap::Ncar),
            "hue" | "hsv" => Ok(Colormap::Hue),
            other => Err(format!("unknown colormap '{other}' (expected ncar or hue)")),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Colormap::Ncar => "ncar",
            Colormap::Hue => "hue",
        })
    }
}

/// Control points of the NCAR-style spectrum, evenly spaced on [0, 1].
const NCAR_STOPS: [AppColor; 11] = [
    AppColor::new(0.00, 0.00, 0.50),
    AppColor::new(0.00, 0.35, 0.95),
    AppColor::new(0.00, 0.85, 1.00),
    AppColor::new(0.00, 0.95, 0.55),
    AppColor::new(0.25, 0.90, 0.05),
    AppColor::new(0.55, 1.00, 0.10),
    AppColor::new(1.00, 0.95, 0.05),
    AppColor::new(1.00, 0.60, 0.00),
    AppColor::new(1.00, 0.15, 0.00),
    AppColor::new(0.95, 0.10, 0.85),
    AppColor::new(0.99, 0.97, 0.96),
];

impl Colormap {
    /// Sample the map at `t` in [0, 1).
    pub fn sample(self, t: f32) -> AppColor {
        let t = t.rem_euclid(1.0);
        match self {
            Colormap::Ncar => {
                let scaled = t * (NCAR_STOPS.len() - 1) as f32;
                let i = (scaled.floor() as usize).min(NCAR_STOPS.len() - 2);
                NCAR_STOPS[i].lerp(NCAR_STOPS[i + 1], scaled - i as f32)
            }
            Colormap::Hue => hsv_to_rgb(t, 0.75, 0.92),
        }
    }
}

/// Color for a tile slot. Deterministic in (slot, slots): the same rank under
/// the same cutoff always gets the same color.
///
/// The map is swept once, so every tile in a view gets a distinct color.
pub fn palette_color(index: PaletteIndex, style: &StyleConfig) -> AppColor {
    let slots = index.slots.max(1);
    style.colormap.sample(index.slot as f32 / slots as f32)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> AppColor {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let i = h6.floor() as i32;
    let f = h6 - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    AppColor { r, g, b, a: 1.0 }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn idx(slot: u32, slots: u32) -> PaletteIndex {
        PaletteIndex { slot, slots }
    }

    #[test]
    fn first_slot_is_start_of_map() {
        let style = StyleConfig::default();
        assert_eq!(palette_color(idx(0, 10), &style), NCAR_STOPS[0]);
    }

    #[test]
    fn same_slot_same_color() {
        let style = StyleConfig::default();
        assert_eq!(palette_color(idx(3, 10), &style), palette_color(idx(3, 10), &style));
        assert_ne!(palette_color(idx(3, 10), &style), palette_color(idx(4, 10), &style));
    }

    #[test]
    fn large_views_keep_every_color_distinct() {
        for colormap in [Colormap::Ncar, Colormap::Hue] {
            let style = StyleConfig {
                colormap,
                ..StyleConfig::default()
            };
            for slots in [30, 60] {
                let colors: HashSet<[u8; 3]> = (0..slots)
                    .map(|slot| palette_color(idx(slot, slots), &style).to_rgb8())
                    .collect();
                assert_eq!(colors.len(), slots as usize, "{colormap} with {slots} slots");
            }
        }
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(AppColor::new(1.0, 0.0, 0.5).to_hex(), "#ff0080");
    }

    #[test]
    fn hue_map_is_saturated() {
        let c = Colormap::Hue.sample(0.0);
        assert!(c.r > c.g && c.r > c.b);
    }
}
