//! Per-level effect state
//!
//! One `SimulationContext` per level run owns every effect subsystem. It is
//! reset when a run starts and cleaned up when it completes.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::center_piece::CenterPieceManager;
use super::effects::{EvictionPolicy, Explosion, ExplosionSet, FlameSet, MAX_FLAMES};
use super::particles::ParticleManager;
use super::rng::{self, streams};
use super::shatter::GlassShatterManager;
use crate::consts::{FLAME_COLORS, MAX_CRACKS};
use crate::{Rgb, Settings};

/// Hit burst parameters
const BURST_COUNT: usize = 20;
const BURST_SIZE: (f32, f32) = (40.0, 80.0);
const BURST_SPEED: f32 = 2.0;
const BURST_DURATION: u32 = 20;

#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub particles: ParticleManager,
    pub explosions: ExplosionSet,
    pub flames: FlameSet,
    pub shatter: GlassShatterManager,
    pub center: CenterPieceManager,
    pub rng: Pcg32,
}

impl SimulationContext {
    pub fn new(settings: &Settings, screen: Vec2, seed: u64, eviction: EvictionPolicy) -> Self {
        let mut particles = ParticleManager::new(settings.max_particles());
        particles.set_culling_distance(screen.x);

        let mut shatter = GlassShatterManager::new(screen, MAX_CRACKS, rng::stream(seed, streams::SHATTER));
        shatter.set_shake_enabled(settings.effective_screen_shake());

        Self {
            particles,
            explosions: ExplosionSet::new(settings.max_explosions(), eviction),
            flames: FlameSet::new(MAX_FLAMES, rng::stream(seed, streams::FLAMES)),
            shatter,
            center: CenterPieceManager::new(
                screen,
                settings.display_mode.max_swirl_particles(),
                rng::stream(seed, streams::CENTER),
            ),
            rng: rng::stream(seed, streams::PARTICLES),
        }
    }

    /// Fresh state for the start of a run
    pub fn reset(&mut self) {
        self.cleanup();
        self.shatter.reset();
        self.center.reset();
    }

    /// Drop every live effect
    pub fn cleanup(&mut self) {
        self.particles.cleanup();
        self.explosions.clear();
        self.flames.clear();
    }

    /// No checkpoint may show while more than one effect of a kind is live
    /// or the swirl is still converging
    pub fn effects_settled(&self) -> bool {
        self.explosions.len() <= 1 && self.flames.len() <= 1 && !self.center.is_converging()
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shatter.shake_offset()
    }

    /// Tap that hit nothing
    pub fn misclick(&mut self, pos: Vec2) -> bool {
        self.shatter.handle_misclick(pos, &mut self.particles)
    }

    pub fn random_flame_color(&mut self) -> Rgb {
        *FLAME_COLORS.choose(&mut self.rng).unwrap_or(&FLAME_COLORS[0])
    }

    /// Default explosion in a random flame color
    pub fn explode(&mut self, pos: Vec2, max_radius: f32, duration: u32) {
        let color = self.random_flame_color();
        self.explosions.spawn(Explosion::new(pos, color, max_radius, duration));
    }

    /// Large flame-colored particles scattering from a hit
    pub fn particle_burst(&mut self, pos: Vec2) -> usize {
        let mut created = 0;
        for _ in 0..BURST_COUNT {
            let color = self.random_flame_color();
            let size = self.rng.random_range(BURST_SIZE.0..=BURST_SIZE.1);
            let vel = Vec2::new(
                rng::symmetric(&mut self.rng, BURST_SPEED),
                rng::symmetric(&mut self.rng, BURST_SPEED),
            );
            if self.particles.create(pos, color, size, vel, BURST_DURATION).is_some() {
                created += 1;
            }
        }
        created
    }

    /// A few small particles at a contact point
    pub fn sparks(&mut self, pos: Vec2, color: Rgb, count: usize) {
        for _ in 0..count {
            let size = self.rng.random_range(5.0..=10.0);
            let vel = Vec2::new(rng::symmetric(&mut self.rng, 2.0), rng::symmetric(&mut self.rng, 2.0));
            self.particles.create(pos, color, size, vel, 10);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::DEFAULT_EXPLOSION_RADIUS;

    fn context() -> SimulationContext {
        SimulationContext::new(&Settings::default(), Vec2::new(800.0, 600.0), 1, EvictionPolicy::Oldest)
    }

    #[test]
    fn test_capacities_follow_settings() {
        let ctx = context();
        assert_eq!(ctx.particles.capacity(), 100);
        assert_eq!(ctx.particles.culling_distance(), 800.0);
        assert_eq!(ctx.center.swirl_count(), 20);
    }

    #[test]
    fn test_settled_rules() {
        let mut ctx = context();
        assert!(ctx.effects_settled());
        ctx.explode(Vec2::ZERO, DEFAULT_EXPLOSION_RADIUS, 30);
        assert!(ctx.effects_settled());
        ctx.explode(Vec2::ZERO, DEFAULT_EXPLOSION_RADIUS, 30);
        assert!(!ctx.effects_settled());
        ctx.explosions.clear();
        ctx.center.trigger_convergence(Vec2::ONE);
        assert!(!ctx.effects_settled());
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut ctx = context();
        ctx.particle_burst(Vec2::new(100.0, 100.0));
        ctx.misclick(Vec2::new(10.0, 10.0));
        ctx.flames.spawn(Vec2::ZERO, Vec2::ONE, 10);
        ctx.reset();
        assert_eq!(ctx.particles.active_count(), 0);
        assert_eq!(ctx.shatter.crack_count(), 0);
        assert!(ctx.flames.is_empty());
    }

    #[test]
    fn test_burst_bounded_by_pool() {
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        let mut ctx = SimulationContext::new(&settings, Vec2::new(800.0, 600.0), 1, EvictionPolicy::Oldest);
        assert_eq!(ctx.particle_burst(Vec2::ZERO), 0);
        let mut ctx = context();
        assert_eq!(ctx.particle_burst(Vec2::ZERO), 20);
    }
}
