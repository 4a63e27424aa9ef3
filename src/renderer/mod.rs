//! Rendering contract
//!
//! The simulation draws through the [`Surface`] trait and measures text through
//! [`TextRenderer`]. [`VertexBatch`] tessellates everything into `bytemuck`
//! vertices for whatever GPU backend presents the frame.

pub mod batch;
pub mod shapes;
pub mod text;
pub mod vertex;

pub use batch::{TextRun, VertexBatch};
pub use text::{BlockGlyphs, Glyph, TextRenderer};
pub use vertex::Vertex;

use glam::Vec2;

use crate::{Rect, Rgb};

/// Immediate-mode draw target for one frame.
///
/// Callers add the current shake offset to positions themselves.
pub trait Surface {
    /// Visible size in pixels
    fn size(&self) -> Vec2;

    /// Clear the whole surface
    fn fill(&mut self, color: Rgb);

    fn circle(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8);

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgb, alpha: u8);

    /// Blit a pre-measured glyph into `rect`
    fn glyph(&mut self, glyph: &Glyph, rect: Rect, alpha: u8);

    /// Visible area as a rectangle anchored at the origin
    fn bounds(&self) -> Rect {
        Rect::new(Vec2::ZERO, self.size())
    }
}
