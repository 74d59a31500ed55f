use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::Font;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct TextRenderer {
    fonts: HashMap<String, Font>,
    layout: Layout,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }

    pub fn load_font_from_path(&mut self, name: &str, path: &Path) -> anyhow::Result<()> {
        let data = std::fs::read(path)?;
        let font = Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| anyhow::anyhow!("cannot parse font {}: {e}", path.display()))?;
        self.fonts.insert(name.to_string(), font);
        tracing::info!("Loaded text font from {}", path.display());
        Ok(())
    }

    pub fn load_system_font(&mut self, name: &str) -> anyhow::Result<()> {
        let mut candidates: Vec<PathBuf> = Vec::new();

        if let Ok(windir) = std::env::var("WINDIR") {
            candidates.push(PathBuf::from(format!("{windir}\\Fonts\\segoeui.ttf")));
            candidates.push(PathBuf::from(format!("{windir}\\Fonts\\arial.ttf")));
        }

        candidates.push(PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"));
        candidates.push(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"));
        candidates.push(PathBuf::from("/usr/share/fonts/dejavu/DejaVuSans.ttf"));
        candidates.push(PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"));
        candidates.push(PathBuf::from("/System/Library/Fonts/Supplemental/Arial.ttf"));
        candidates.push(PathBuf::from("/Library/Fonts/Arial.ttf"));

        for path in candidates {
            let Ok(font_data) = std::fs::read(&path) else {
                continue;
            };
            if let Ok(font) = Font::from_bytes(font_data, fontdue::FontSettings::default()) {
                self.fonts.insert(name.to_string(), font);
                tracing::info!("Loaded text font from {}", path.display());
                return Ok(());
            }
        }

        anyhow::bail!("unable to load a system font from known locations")
    }

    /// Lay out and rasterize `text` as `color` glyphs with alpha coverage.
    pub fn render_text(
        &mut self,
        text: &str,
        font_name: &str,
        font_size: f32,
        max_width: Option<f32>,
        color: [u8; 3],
    ) -> Option<TextRenderResult> {
        let font = self.fonts.get(font_name)?;

        self.layout.reset(&LayoutSettings {
            max_width,
            ..Default::default()
        });
        self.layout.append(&[font], &TextStyle::new(text, font_size, 0));

        let mut glyphs = Vec::new();
        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;

        for glyph in self.layout.glyphs() {
            let (metrics, bitmap) = font.rasterize_config(glyph.key);

            let mut rgba_bitmap = Vec::with_capacity(bitmap.len() * 4);
            for &coverage in &bitmap {
                rgba_bitmap.extend_from_slice(&[color[0], color[1], color[2], coverage]);
            }

            glyphs.push(TextGlyph {
                x: glyph.x,
                y: glyph.y,
                width: metrics.width,
                height: metrics.height,
                bitmap: rgba_bitmap,
            });

            width = width.max(glyph.x + metrics.width as f32);
            height = height.max(glyph.y + metrics.height as f32);
        }

        if glyphs.is_empty() {
            return None;
        }

        Some(TextRenderResult {
            glyphs,
            width: width.ceil() as u32,
            height: height.ceil() as u32,
        })
    }
}

pub struct TextRenderResult {
    pub glyphs: Vec<TextGlyph>,
    pub width: u32,
    pub height: u32,
}

pub struct TextGlyph {
    pub x: f32,
    pub y: f32,
    pub width: usize,
    pub height: usize,
    pub bitmap: Vec<u8>, // RGBA format
}
