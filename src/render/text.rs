use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use std::path::Path;

use super::canvas::{Canvas, Color};

pub struct TextOverlay {
    font: Font,
}

impl TextOverlay {
    /// Loads `path` if given, otherwise the first matching system sans-serif face.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let font = match path {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read font: {}", path.display()))?;
                Font::from_bytes(bytes, FontSettings::default()).map_err(|e| anyhow!(e))?
            }
            None => system_font()?,
        };
        Ok(Self { font })
    }

    /// Composite text onto the canvas with its top-left corner at (x, y).
    pub fn draw(&self, canvas: &mut Canvas, text: &str, x: i32, y: i32, size: f32, color: Color) {
        let mut cursor_x = x as f32;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let glyph_x = cursor_x.round() as i32 + metrics.xmin;
            let glyph_y = y + size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = bitmap[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }
                    canvas.blend(
                        glyph_x + gx as i32,
                        glyph_y + gy as i32,
                        color,
                        alpha as f32 / 255.0,
                    );
                }
            }

            cursor_x += metrics.advance_width;
        }
    }

    /// Measure the width of rendered text in pixels.
    pub fn measure_width(&self, text: &str, size: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, size).advance_width)
            .sum()
    }
}

fn system_font() -> Result<Font> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif, fontdb::Family::Monospace],
        ..fontdb::Query::default()
    };
    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|face| face.id))
        .context("No system fonts found")?;

    db.with_face_data(id, |data, index| {
        let settings = FontSettings {
            collection_index: index,
            ..FontSettings::default()
        };
        Font::from_bytes(data, settings)
    })
    .context("Font face data unavailable")?
    .map_err(|e| anyhow!(e))
}
