//! Super Student - falling-targets learning game, simulation core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (particles, effects, collisions, levels)
//! - `renderer`: Draw surface contract, text glyphs and vertex batching
//! - `platform`: Pointer and multi-touch input
//! - `persistence`: Level progress marker
//! - `settings`: Display-mode driven configuration
//! - `audio`: Fire-and-forget audio dispatch
//! - `session`: Fixed-rate frame driver and level lifecycle

pub mod audio;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use settings::{DisplayMode, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    use super::Rgb;

    /// Fixed frame rate; all motion is expressed per frame
    pub const FRAME_RATE: u32 = 50;

    /// Frames between two spawns of the current group
    pub const LETTER_SPAWN_INTERVAL: u64 = 60;
    /// Number of sequence values per group
    pub const GROUP_SIZE: usize = 5;
    /// Score awarded per destroyed target
    pub const POINTS_PER_HIT: u32 = 10;

    /// Cracks needed to shatter the screen
    pub const MAX_CRACKS: u32 = 10;
    pub const SHAKE_DURATION_MISCLICK: u32 = 10;
    pub const SHAKE_MAGNITUDE_MISCLICK: f32 = 5.0;
    /// Minor shake when a non-target object is tapped
    pub const SHAKE_DURATION_WRONG_TARGET: u32 = 5;
    pub const SHAKE_MAGNITUDE_WRONG_TARGET: f32 = 3.0;
    /// Frames between the last crack and the game-over screen
    pub const GAME_OVER_DELAY_FRAMES: u32 = 60;

    /// Velocity kept after a wall bounce
    pub const BOUNCE_DAMPENING: f32 = 0.8;
    /// Restitution applied to object/object impulses
    pub const RESTITUTION: f32 = 0.85;

    /// Destructions between two checkpoint screens
    pub const CHECKPOINT_INTERVAL: u32 = 10;
    /// Settle frames before a pending checkpoint may show
    pub const CHECKPOINT_SETTLE_FRAMES: u32 = 60;

    /// Frames with dot collisions disarmed after a colors round starts
    pub const COLORS_COLLISION_DELAY: u32 = 250;

    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const FLAME_COLORS: [Rgb; 3] = [
        Rgb::new(255, 69, 0),
        Rgb::new(255, 215, 0),
        Rgb::new(0, 191, 255),
    ];
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend toward `other` (t clamped to [0, 1])
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Normalized RGBA for vertex colors
    pub fn to_rgba(self, alpha: u8) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha as f32 / 255.0,
        ]
    }
}

/// Axis-aligned rectangle in screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half-open containment (left/top inclusive), so an empty rect holds nothing
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grow by `pad` on every side
    pub fn padded(&self, pad: f32) -> Rect {
        Rect {
            min: self.min - Vec2::splat(pad),
            max: self.max + Vec2::splat(pad),
        }
    }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
