//! Pooled particle store
//!
//! A fixed arena of slots with a free list. Slots are recycled, never freed;
//! handles carry a generation so a stale handle to a recycled slot resolves to
//! nothing.

use glam::Vec2;

use crate::renderer::Surface;
use crate::{Rect, Rgb};

/// Default culling distance when the screen width is unknown
pub const DEFAULT_CULLING_DISTANCE: f32 = 1920.0;
/// Draw padding around the visible area
pub const DRAW_PADDING: f32 = 50.0;
/// Minimum alpha of a fading particle
const MIN_ALPHA: f32 = 50.0;

/// A single particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Rgb,
    pub size: f32,
    /// Remaining frames
    pub duration: u32,
    pub initial_duration: u32,
    pub active: bool,
}

impl Particle {
    const INACTIVE: Particle = Particle {
        pos: Vec2::ZERO,
        vel: Vec2::ZERO,
        color: Rgb::new(0, 0, 0),
        size: 0.0,
        duration: 0,
        initial_duration: 0,
        active: false,
    };

    /// Fade by remaining life; tiny particles stay opaque
    pub fn alpha(&self) -> u8 {
        if self.size <= 2.0 || self.initial_duration == 0 {
            return 255;
        }
        let ratio = self.duration as f32 / self.initial_duration as f32;
        (255.0 * ratio).clamp(MIN_ALPHA, 255.0) as u8
    }
}

/// Generational reference to a pooled particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    particle: Particle,
    generation: u32,
}

/// Fixed-capacity particle pool
#[derive(Debug, Clone)]
pub struct ParticleManager {
    slots: Vec<Slot>,
    free: Vec<u32>,
    active: usize,
    culling_distance: f32,
}

impl ParticleManager {
    pub fn new(capacity: usize) -> Self {
        let slots = vec![
            Slot {
                particle: Particle::INACTIVE,
                generation: 0,
            };
            capacity
        ];
        Self {
            slots,
            // Reversed so the lowest index is handed out first
            free: (0..capacity as u32).rev().collect(),
            active: 0,
            culling_distance: DEFAULT_CULLING_DISTANCE,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn culling_distance(&self) -> f32 {
        self.culling_distance
    }

    pub fn set_culling_distance(&mut self, distance: f32) {
        self.culling_distance = distance.max(0.0);
    }

    /// Activate a particle, evicting the shortest-lived one when full.
    ///
    /// Returns `None` only for a zero-capacity pool.
    pub fn create(
        &mut self,
        pos: Vec2,
        color: Rgb,
        size: f32,
        vel: Vec2,
        duration: u32,
    ) -> Option<ParticleHandle> {
        if self.free.is_empty() {
            let victim = self.shortest_lived()?;
            self.release(victim);
        }
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.particle = Particle {
            pos,
            vel,
            color,
            size,
            duration,
            initial_duration: duration,
            active: true,
        };
        self.active += 1;
        Some(ParticleHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Resolve a handle; stale handles resolve to `None`
    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.particle.active)
            .map(|slot| &slot.particle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots
            .iter()
            .map(|slot| &slot.particle)
            .filter(|p| p.active)
    }

    /// Advance every active particle one frame and retire the expired or culled
    pub fn update(&mut self) {
        let lo = -self.culling_distance;
        let hi = self.culling_distance * 2.0;

        for index in 0..self.slots.len() {
            let expired = {
                let p = &mut self.slots[index].particle;
                if !p.active {
                    continue;
                }
                p.pos += p.vel;
                p.duration = p.duration.saturating_sub(1);
                p.duration == 0 || p.pos.x < lo || p.pos.x > hi || p.pos.y < lo || p.pos.y > hi
            };
            if expired {
                self.release(index as u32);
            }
        }
    }

    /// Draw active particles that overlap the padded visible area
    pub fn draw(&self, surface: &mut dyn Surface, offset: Vec2) {
        let visible = surface.bounds().padded(DRAW_PADDING);
        for p in self.iter() {
            let center = p.pos + offset;
            let bbox = Rect::from_center(center, Vec2::splat(p.size * 2.0));
            if !bbox.intersects(&visible) {
                continue;
            }
            surface.circle(center, p.size, p.color, p.alpha());
        }
    }

    /// Shed load when the frame rate falls below 80% of target.
    ///
    /// Evicts up to `min(10, active / 4)` of the shortest-lived particles and
    /// returns how many were evicted.
    pub fn shed_load(&mut self, target_fps: f32, current_fps: f32) -> usize {
        if current_fps >= target_fps * 0.8 {
            return 0;
        }
        let budget = (self.active / 4).min(10);
        let mut evicted = 0;
        while evicted < budget {
            let Some(victim) = self.shortest_lived() else {
                break;
            };
            self.release(victim);
            evicted += 1;
        }
        if evicted > 0 {
            log::debug!("Shed {} particles at {:.1} fps", evicted, current_fps);
        }
        evicted
    }

    /// Deactivate everything
    pub fn cleanup(&mut self) {
        for index in 0..self.slots.len() as u32 {
            self.release(index);
        }
    }

    fn shortest_lived(&self) -> Option<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.particle.active)
            .min_by_key(|(_, slot)| slot.particle.duration)
            .map(|(index, _)| index as u32)
    }

    fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if !slot.particle.active {
            return;
        }
        slot.particle.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.active -= 1;
    }
}
