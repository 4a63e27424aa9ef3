//! CPU-side frame batch implementing [`Surface`]

use glam::Vec2;

use super::Surface;
use super::shapes;
use super::text::Glyph;
use super::vertex::Vertex;
use crate::{Rect, Rgb};

/// A text blit recorded for the backend's glyph atlas pass
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub rect: Rect,
    pub color: [f32; 4],
}

/// Accumulates one frame of triangles and text runs
#[derive(Debug, Clone)]
pub struct VertexBatch {
    size: Vec2,
    clear_color: [f32; 4],
    vertices: Vec<Vertex>,
    text_runs: Vec<TextRun>,
}

impl VertexBatch {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            vertices: Vec::with_capacity(4096),
            text_runs: Vec::new(),
        }
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex data ready for a buffer upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn text_runs(&self) -> &[TextRun] {
        &self.text_runs
    }
}

impl Surface for VertexBatch {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fill(&mut self, color: Rgb) {
        self.clear_color = color.to_rgba(255);
        self.vertices.clear();
        self.text_runs.clear();
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8) {
        if radius <= 0.0 || alpha == 0 {
            return;
        }
        self.vertices.extend(shapes::circle(
            center,
            radius,
            color.to_rgba(alpha),
            shapes::segments_for(radius),
        ));
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgb, alpha: u8) {
        if alpha == 0 {
            return;
        }
        self.vertices
            .extend(shapes::line(from, to, width.max(1.0), color.to_rgba(alpha)));
    }

    fn glyph(&mut self, glyph: &Glyph, rect: Rect, alpha: u8) {
        self.text_runs.push(TextRun {
            text: glyph.text.clone(),
            rect,
            color: glyph.color.to_rgba(alpha),
        });
    }
}
