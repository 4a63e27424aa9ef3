//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Byte stride of one vertex in an uploaded buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
}

/// Colors for game elements
pub mod colors {
    use crate::Rgb;

    /// Swirl particle tint around the center piece
    pub const SWIRL: Rgb = Rgb::new(120, 180, 255);
    /// Falling object drawn in the target color
    pub const TARGET: Rgb = Rgb::new(0, 0, 0);
    /// Falling object that is not the current target
    pub const NON_TARGET: Rgb = Rgb::new(150, 150, 150);
    /// Crack overlay line color
    pub const CRACK: Rgb = Rgb::new(60, 60, 70);
    /// Shard particles spawned on a misclick
    pub const GLASS_SHARD: Rgb = Rgb::new(200, 220, 255);
    pub const STAR: Rgb = Rgb::new(200, 200, 200);
    /// Background before any crack
    pub const BACKGROUND: Rgb = Rgb::new(255, 255, 255);
    /// Background once the screen is fully shattered
    pub const BACKGROUND_SHATTERED: Rgb = Rgb::new(180, 185, 200);
    pub const LASER: [Rgb; 2] = [Rgb::new(255, 0, 0), Rgb::new(255, 128, 0)];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 24);
        let verts = [Vertex::new(1.0, 2.0, [0.0, 0.5, 1.0, 1.0])];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), Vertex::STRIDE);
    }
}
