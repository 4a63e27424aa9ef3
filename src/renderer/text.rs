//! Glyph measurement and caching

use std::collections::HashMap;

use glam::Vec2;

use crate::sim::GameMode;
use crate::{Rect, Rgb};

/// A rendered (or measured) piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub size: Vec2,
    pub color: Rgb,
}

impl Glyph {
    /// Bounding rectangle when the glyph is centered on `center`
    pub fn bounding_rect(&self, center: Vec2) -> Rect {
        Rect::from_center(center, self.size)
    }
}

/// Font collaborator: a cache lookup with a direct-render fallback
pub trait TextRenderer {
    fn cached(&self, mode: GameMode, value: &str, color: Rgb) -> Option<Glyph>;

    fn render(&mut self, mode: GameMode, value: &str, color: Rgb) -> Glyph;

    /// Cached glyph when available, otherwise render directly
    fn glyph(&mut self, mode: GameMode, value: &str, color: Rgb) -> Glyph {
        match self.cached(mode, value, color) {
            Some(glyph) => glyph,
            None => self.render(mode, value, color),
        }
    }
}

/// Fixed-advance measuring renderer.
///
/// Text is measured as `0.6 * font_size` per character; shape names in
/// shapes mode are drawn as a square of `font_size`.
#[derive(Debug, Clone)]
pub struct BlockGlyphs {
    font_size: f32,
    cache: HashMap<(GameMode, String, Rgb), Glyph>,
}

impl BlockGlyphs {
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            cache: HashMap::new(),
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Warm the cache for every value/color pair of a mode
    pub fn preload(&mut self, mode: GameMode, values: &[String], colors: &[Rgb]) {
        for value in values {
            for &color in colors {
                self.render(mode, value, color);
            }
        }
        log::debug!("Preloaded {} glyphs for {}", self.cache.len(), mode.as_str());
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn measure(&self, mode: GameMode, value: &str) -> Vec2 {
        if mode == GameMode::Shapes {
            return Vec2::splat(self.font_size);
        }
        let chars = value.chars().count().max(1) as f32;
        Vec2::new(chars * self.font_size * 0.6, self.font_size)
    }
}

impl TextRenderer for BlockGlyphs {
    fn cached(&self, mode: GameMode, value: &str, color: Rgb) -> Option<Glyph> {
        self.cache.get(&(mode, value.to_string(), color)).cloned()
    }

    fn render(&mut self, mode: GameMode, value: &str, color: Rgb) -> Glyph {
        let glyph = Glyph {
            text: value.to_string(),
            size: self.measure(mode, value),
            color,
        };
        self.cache
            .insert((mode, value.to_string(), color), glyph.clone());
        glyph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_falls_back_to_render_then_caches() {
        let mut glyphs = BlockGlyphs::new(100.0);
        let black = Rgb::new(0, 0, 0);
        assert!(glyphs.cached(GameMode::Alphabet, "A", black).is_none());

        let glyph = glyphs.glyph(GameMode::Alphabet, "A", black);
        assert_eq!(glyph.size, Vec2::new(60.0, 100.0));
        assert!(glyphs.cached(GameMode::Alphabet, "A", black).is_some());
    }

    #[test]
    fn test_shapes_are_square() {
        let mut glyphs = BlockGlyphs::new(80.0);
        let glyph = glyphs.glyph(GameMode::Shapes, "Rectangle", Rgb::new(0, 0, 0));
        assert_eq!(glyph.size, Vec2::splat(80.0));
        let rect = glyph.bounding_rect(Vec2::new(100.0, 100.0));
        assert!(rect.contains(Vec2::new(60.0, 60.0)));
    }

    #[test]
    fn test_preload_fills_cache() {
        let mut glyphs = BlockGlyphs::new(40.0);
        let colors = [Rgb::new(0, 0, 0), Rgb::new(150, 150, 150)];
        glyphs.preload(GameMode::Numbers, &GameMode::Numbers.sequence(), &colors);
        assert_eq!(glyphs.cached_len(), 20);
        assert!(glyphs.cached(GameMode::Numbers, "10", colors[1]).is_some());
    }
}
