//! Short-lived visual effects
//!
//! Explosions and flamethrower beams live in bounded collections. Each frame
//! an effect is drawn, then aged, and removed on the frame after it runs out
//! (draw-then-expire).

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::rng;
use crate::consts::FLAME_COLORS;
use crate::renderer::Surface;
use crate::renderer::vertex::colors;
use crate::{Rgb, polar_to_cartesian};

/// Radius every explosion starts from
pub const EXPLOSION_START_RADIUS: f32 = 10.0;
/// Fraction of the remaining gap an explosion closes per frame
const EXPLOSION_EASE: f32 = 0.1;
pub const DEFAULT_EXPLOSION_RADIUS: f32 = 270.0;
pub const DEFAULT_EXPLOSION_DURATION: u32 = 30;

/// Flame collection capacity
pub const MAX_FLAMES: usize = 10;
pub const FLAME_DURATION: u32 = 10;
const FLAME_WIDTHS: [f32; 2] = [3.0, 5.0];
const FLAME_FLICKERS: usize = 8;

/// An expanding, fading circle
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub color: Rgb,
    pub duration: u32,
    pub initial_duration: u32,
}

impl Explosion {
    pub fn new(pos: Vec2, color: Rgb, max_radius: f32, duration: u32) -> Self {
        Self {
            pos,
            radius: EXPLOSION_START_RADIUS,
            max_radius,
            color,
            duration,
            initial_duration: duration,
        }
    }

    pub fn alpha(&self) -> u8 {
        if self.initial_duration == 0 {
            return 0;
        }
        (255.0 * self.duration as f32 / self.initial_duration as f32).clamp(0.0, 255.0) as u8
    }

    fn expand(&mut self) {
        self.radius += (self.max_radius - self.radius) * EXPLOSION_EASE;
    }
}

/// Which explosion makes room when the collection is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Drop the earliest spawned
    #[default]
    Oldest,
    /// Drop the one with the least remaining duration
    ShortestRemaining,
}

/// Bounded explosion collection
#[derive(Debug, Clone)]
pub struct ExplosionSet {
    items: Vec<Explosion>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl ExplosionSet {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn spawn(&mut self, explosion: Explosion) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() >= self.capacity {
            let victim = match self.policy {
                EvictionPolicy::Oldest => 0,
                EvictionPolicy::ShortestRemaining => self
                    .items
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| e.duration)
                    .map(|(i, _)| i)
                    .unwrap_or(0),
            };
            self.items.remove(victim);
        }
        self.items.push(explosion);
    }

    pub fn update_and_draw(&mut self, surface: &mut dyn Surface, offset: Vec2) {
        self.items.retain_mut(|e| {
            if e.duration == 0 {
                return false;
            }
            e.expand();
            surface.circle(e.pos + offset, e.radius, e.color, e.alpha());
            e.duration -= 1;
            true
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Explosion> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A flamethrower beam from the player origin to a destroyed target
#[derive(Debug, Clone, PartialEq)]
pub struct Flame {
    pub start: Vec2,
    pub end: Vec2,
    pub duration: u32,
    pub initial_duration: u32,
}

impl Flame {
    fn alpha(&self) -> u8 {
        if self.initial_duration == 0 {
            return 0;
        }
        (255.0 * self.duration as f32 / self.initial_duration as f32) as u8
    }
}

/// Bounded flame collection, oldest evicted
#[derive(Debug, Clone)]
pub struct FlameSet {
    items: Vec<Flame>,
    capacity: usize,
    rng: Pcg32,
}

impl FlameSet {
    pub fn new(capacity: usize, rng: Pcg32) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            rng,
        }
    }

    pub fn spawn(&mut self, start: Vec2, end: Vec2, duration: u32) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() >= self.capacity {
            self.items.remove(0);
        }
        self.items.push(Flame {
            start,
            end,
            duration,
            initial_duration: duration,
        });
    }

    pub fn update_and_draw(&mut self, surface: &mut dyn Surface, offset: Vec2) {
        let rng = &mut self.rng;
        self.items.retain_mut(|flame| {
            if flame.duration == 0 {
                return false;
            }
            draw_flame(flame, surface, offset, rng);
            flame.duration -= 1;
            true
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flame> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

fn draw_flame(flame: &Flame, surface: &mut dyn Surface, offset: Vec2, rng: &mut Pcg32) {
    let alpha = flame.alpha();
    let start = flame.start + offset;
    let end = flame.end + offset;

    // Core beam
    let core = *colors::LASER.choose(rng).unwrap_or(&colors::LASER[0]);
    let width = *FLAME_WIDTHS.choose(rng).unwrap_or(&FLAME_WIDTHS[0]);
    surface.line(start, end, width, core, alpha);

    // Flicker blobs along the beam
    let dir = (end - start).normalize_or_zero();
    let perp = Vec2::new(-dir.y, dir.x);
    for i in 1..=FLAME_FLICKERS {
        let t = i as f32 / (FLAME_FLICKERS + 1) as f32;
        let jitter = rng::symmetric(rng, 6.0);
        let pos = start.lerp(end, t) + perp * jitter;
        let color = *FLAME_COLORS.choose(rng).unwrap_or(&FLAME_COLORS[0]);
        let size = 4.0 + 8.0 * (1.0 - t) + rng.random_range(0.0..2.0);
        surface.circle(pos, size, color, alpha);
    }
}

#[derive(Debug, Clone, Copy)]
struct Star {
    pos: Vec2,
    radius: f32,
}

/// Slowly falling background stars
#[derive(Debug, Clone)]
pub struct Starfield {
    stars: Vec<Star>,
    size: Vec2,
    rng: Pcg32,
}

impl Starfield {
    pub const DEFAULT_COUNT: usize = 100;
    const FALL_SPEED: f32 = 1.0;

    pub fn new(size: Vec2, count: usize, mut rng: Pcg32) -> Self {
        let stars = (0..count)
            .map(|_| Star {
                pos: Vec2::new(rng::uniform(&mut rng, 0.0, size.x), rng::uniform(&mut rng, 0.0, size.y)),
                radius: rng.random_range(2.0..4.0),
            })
            .collect();
        Self { stars, size, rng }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn update_and_draw(&mut self, surface: &mut dyn Surface, offset: Vec2) {
        for star in &mut self.stars {
            star.pos.y += Self::FALL_SPEED;
            if star.pos.y > self.size.y {
                star.pos = Vec2::new(rng::uniform(&mut self.rng, 0.0, self.size.x), 0.0);
            }
            surface.circle(star.pos + offset, star.radius, colors::STAR, 255);
        }
    }
}

/// Random unit direction scaled by `speed`
pub(crate) fn random_direction(rng: &mut Pcg32, speed: f32) -> Vec2 {
    polar_to_cartesian(speed, rng.random_range(0.0..std::f32::consts::TAU))
}
