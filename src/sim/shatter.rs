//! Glass shatter feedback
//!
//! Misclicks crack the "glass" over the play field and shake the screen. The
//! background tints toward a shattered color as cracks accumulate; at
//! [`MAX_CRACKS`](crate::consts::MAX_CRACKS) the level may show game over.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::particles::ParticleManager;
use super::rng;
use crate::consts::{GAME_OVER_DELAY_FRAMES, SHAKE_DURATION_MISCLICK, SHAKE_MAGNITUDE_MISCLICK};
use crate::renderer::Surface;
use crate::renderer::vertex::colors;
use crate::{Rgb, polar_to_cartesian};

/// Frames a new crack takes to fade in
pub const CRACK_FADE_IN_FRAMES: u32 = 20;
/// Frames after a crack before another misclick may crack again
pub const MISCLICK_COOLDOWN_FRAMES: u32 = 15;
const CRACK_MAX_ALPHA: f32 = 220.0;
const CRACK_WIDTH: f32 = 2.0;
const SHARD_COUNT: usize = 8;

/// Where the glass is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShatterPhase {
    Intact,
    Cracking(u32),
    GameOverReady,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrackSegment {
    pub start: Vec2,
    pub end: Vec2,
}

/// A star of jagged segments radiating from one misclick
#[derive(Debug, Clone, PartialEq)]
pub struct Crack {
    pub origin: Vec2,
    pub segments: Vec<CrackSegment>,
    pub age: u32,
}

impl Crack {
    pub fn alpha(&self) -> u8 {
        let t = (self.age as f32 / CRACK_FADE_IN_FRAMES as f32).min(1.0);
        (CRACK_MAX_ALPHA * t) as u8
    }
}

/// Shake, cracks and background tint for one level run
#[derive(Debug, Clone)]
pub struct GlassShatterManager {
    screen: Vec2,
    max_cracks: u32,
    cracks: Vec<Crack>,
    shake_duration: u32,
    shake_magnitude: f32,
    shake_offset: Vec2,
    shake_enabled: bool,
    cooldown: u32,
    game_over_delay: u32,
    rng: Pcg32,
}

impl GlassShatterManager {
    pub fn new(screen: Vec2, max_cracks: u32, rng: Pcg32) -> Self {
        Self {
            screen,
            max_cracks: max_cracks.max(1),
            cracks: Vec::new(),
            shake_duration: 0,
            shake_magnitude: 0.0,
            shake_offset: Vec2::ZERO,
            shake_enabled: true,
            cooldown: 0,
            game_over_delay: 0,
            rng,
        }
    }

    /// Disable shake entirely (reduced motion)
    pub fn set_shake_enabled(&mut self, enabled: bool) {
        self.shake_enabled = enabled;
        if !enabled {
            self.shake_offset = Vec2::ZERO;
        }
    }

    pub fn phase(&self) -> ShatterPhase {
        match self.crack_count() {
            0 => ShatterPhase::Intact,
            n if n >= self.max_cracks => ShatterPhase::GameOverReady,
            n => ShatterPhase::Cracking(n),
        }
    }

    pub fn crack_count(&self) -> u32 {
        self.cracks.len() as u32
    }

    pub fn cracks(&self) -> &[Crack] {
        &self.cracks
    }

    /// Shattered and the post-shatter delay has elapsed
    pub fn is_game_over_ready(&self) -> bool {
        self.phase() == ShatterPhase::GameOverReady && self.game_over_delay == 0
    }

    /// Tap that hit nothing: shake, and crack when the cooldown allows.
    ///
    /// Returns whether a crack was added.
    pub fn handle_misclick(&mut self, pos: Vec2, particles: &mut ParticleManager) -> bool {
        self.trigger_shake(SHAKE_DURATION_MISCLICK, SHAKE_MAGNITUDE_MISCLICK);
        if self.cooldown > 0 || self.phase() == ShatterPhase::GameOverReady {
            return false;
        }

        let crack = self.generate_crack(pos);
        self.cracks.push(crack);
        self.cooldown = MISCLICK_COOLDOWN_FRAMES;
        self.spawn_shards(pos, particles);

        if self.phase() == ShatterPhase::GameOverReady {
            self.game_over_delay = GAME_OVER_DELAY_FRAMES;
            log::info!("Glass shattered after {} cracks", self.crack_count());
        } else {
            log::debug!("Crack {}/{} at {:?}", self.crack_count(), self.max_cracks, pos);
        }
        true
    }

    /// Shake without cracking; a stronger or longer shake wins
    pub fn trigger_shake(&mut self, duration: u32, magnitude: f32) {
        self.shake_magnitude = if self.shake_duration > 0 {
            self.shake_magnitude.max(magnitude)
        } else {
            magnitude
        };
        self.shake_duration = self.shake_duration.max(duration);
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_duration > 0
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    /// Per-frame step: decay shake, age cracks, count down timers
    pub fn update(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        for crack in &mut self.cracks {
            crack.age = (crack.age + 1).min(CRACK_FADE_IN_FRAMES);
        }

        if self.shake_duration > 0 {
            self.shake_offset = if self.shake_enabled {
                Vec2::new(
                    rng::symmetric(&mut self.rng, self.shake_magnitude),
                    rng::symmetric(&mut self.rng, self.shake_magnitude),
                )
            } else {
                Vec2::ZERO
            };
            self.shake_duration -= 1;
        } else {
            self.shake_offset = Vec2::ZERO;
            self.shake_magnitude = 0.0;
        }

        if self.phase() == ShatterPhase::GameOverReady {
            self.game_over_delay = self.game_over_delay.saturating_sub(1);
        }
    }

    /// Base background blended toward the shattered tint by crack count
    pub fn background_color(&self) -> Rgb {
        let t = self.crack_count() as f32 / self.max_cracks as f32;
        colors::BACKGROUND.lerp(colors::BACKGROUND_SHATTERED, t)
    }

    pub fn draw_cracks(&self, surface: &mut dyn Surface) {
        for crack in &self.cracks {
            let alpha = crack.alpha();
            for segment in &crack.segments {
                surface.line(segment.start, segment.end, CRACK_WIDTH, colors::CRACK, alpha);
            }
        }
    }

    /// Back to intact glass for a new run
    pub fn reset(&mut self) {
        self.cracks.clear();
        self.shake_duration = 0;
        self.shake_magnitude = 0.0;
        self.shake_offset = Vec2::ZERO;
        self.cooldown = 0;
        self.game_over_delay = 0;
    }

    fn generate_crack(&mut self, origin: Vec2) -> Crack {
        let branches = self.rng.random_range(3..=6);
        let base = self.rng.random_range(0.0..std::f32::consts::TAU);
        let mut segments = Vec::with_capacity(branches * 3);

        for i in 0..branches {
            let mut angle = base
                + i as f32 * std::f32::consts::TAU / branches as f32
                + rng::symmetric(&mut self.rng, 0.3);
            let length = self.rng.random_range(40.0..160.0);
            let mut start = origin;
            // Three jagged pieces per branch
            for _ in 0..3 {
                angle += rng::symmetric(&mut self.rng, 0.35);
                let end = (start + polar_to_cartesian(length / 3.0, angle))
                    .clamp(Vec2::ZERO, self.screen);
                segments.push(CrackSegment { start, end });
                start = end;
            }
        }

        Crack {
            origin,
            segments,
            age: 0,
        }
    }

    fn spawn_shards(&mut self, pos: Vec2, particles: &mut ParticleManager) {
        for _ in 0..SHARD_COUNT {
            let speed = self.rng.random_range(1.0..3.0);
            let vel = super::effects::random_direction(&mut self.rng, speed);
            let size = self.rng.random_range(2.0..5.0);
            particles.create(pos, colors::GLASS_SHARD, size, vel, 25);
        }
    }
}
