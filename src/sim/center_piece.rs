//! Swirl around the screen center and the convergence effect
//!
//! The current target value sits at the middle of an orbiting swirl. A hit
//! pulls the swirl toward the destroyed object and lets it spring back.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::mode::GameMode;
use crate::renderer::vertex::colors;
use crate::renderer::{Surface, TextRenderer};
use crate::{Rgb, polar_to_cartesian};

/// Frames a convergence takes from trigger to release
pub const CONVERGENCE_FRAMES: u32 = 30;
const SWIRL_ALPHA: u8 = 180;
const ORBIT_WOBBLE: f32 = 10.0;
/// Share of the swirl that orbits permanently; the rest arrives with a burst
const AMBIENT_SHARE: f32 = 2.0 / 3.0;

#[derive(Debug, Clone, PartialEq)]
struct SwirlParticle {
    angle: f32,
    orbit: f32,
    angular_speed: f32,
    phase: f32,
    size: f32,
    pos: Vec2,
    /// Burst particles leave when their convergence ends
    transient: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Convergence {
    target: Vec2,
    timer: u32,
}

/// Center swirl and convergence state
#[derive(Debug, Clone)]
pub struct CenterPieceManager {
    center: Vec2,
    max_swirl: usize,
    swirl: Vec<SwirlParticle>,
    convergence: Option<Convergence>,
    tint: Rgb,
    frame: u64,
    rng: Pcg32,
}

impl CenterPieceManager {
    pub fn new(screen: Vec2, max_swirl: usize, rng: Pcg32) -> Self {
        let mut manager = Self {
            center: screen * 0.5,
            max_swirl,
            swirl: Vec::with_capacity(max_swirl),
            convergence: None,
            tint: colors::SWIRL,
            frame: 0,
            rng,
        };
        manager.reset();
        manager
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn swirl_count(&self) -> usize {
        self.swirl.len()
    }

    pub fn is_converging(&self) -> bool {
        self.convergence.is_some()
    }

    /// Point the swirl is converging on, if any
    pub fn convergence_target(&self) -> Option<Vec2> {
        self.convergence.map(|c| c.target)
    }

    /// Pull the swirl toward `target`; a new trigger restarts toward the new point
    pub fn trigger_convergence(&mut self, target: Vec2) {
        self.convergence = Some(Convergence {
            target,
            timer: CONVERGENCE_FRAMES,
        });
        while self.swirl.len() < self.max_swirl {
            let particle = self.spawn_particle(true);
            self.swirl.push(particle);
        }
    }

    pub fn update_and_draw(
        &mut self,
        surface: &mut dyn Surface,
        text: &mut dyn TextRenderer,
        target: Option<&str>,
        mode: GameMode,
        offset: Vec2,
    ) {
        self.update();

        for p in &self.swirl {
            surface.circle(p.pos + offset, p.size, self.tint, SWIRL_ALPHA);
        }

        if let Some(value) = target {
            let glyph = text.glyph(mode, mode.display_value(value), colors::TARGET);
            let rect = glyph.bounding_rect(self.center + offset);
            surface.glyph(&glyph, rect, 255);
        }
    }

    /// Advance the swirl one frame
    pub fn update(&mut self) {
        self.frame += 1;
        let pull = match self.convergence {
            Some(c) => {
                let progress = 1.0 - c.timer as f32 / CONVERGENCE_FRAMES as f32;
                Some((c.target, (std::f32::consts::PI * progress).sin()))
            }
            None => None,
        };
        self.tint = pull.map_or(colors::SWIRL, |(_, weight)| convergence_tint(weight));

        let wobble_t = self.frame as f32 * 0.05;
        for p in &mut self.swirl {
            p.angle += p.angular_speed;
            let orbit = p.orbit + (wobble_t + p.phase).sin() * ORBIT_WOBBLE;
            let ambient = self.center + polar_to_cartesian(orbit, p.angle);
            p.pos = match pull {
                Some((target, weight)) => ambient.lerp(target, weight),
                None => ambient,
            };
        }

        if let Some(c) = &mut self.convergence {
            c.timer = c.timer.saturating_sub(1);
            if c.timer == 0 {
                self.convergence = None;
                self.swirl.retain(|p| !p.transient);
            }
        }
    }

    /// Drop convergence and rebuild the ambient swirl
    pub fn reset(&mut self) {
        self.convergence = None;
        self.tint = colors::SWIRL;
        self.swirl.clear();
        let ambient = ((self.max_swirl as f32 * AMBIENT_SHARE).round() as usize).min(self.max_swirl);
        for _ in 0..ambient {
            let particle = self.spawn_particle(false);
            self.swirl.push(particle);
        }
    }

    fn spawn_particle(&mut self, transient: bool) -> SwirlParticle {
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let orbit = self.rng.random_range(60.0..140.0);
        let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        SwirlParticle {
            angle,
            orbit,
            angular_speed: direction * self.rng.random_range(0.02..0.06),
            phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            size: self.rng.random_range(2.0..5.0),
            pos: if transient {
                self.center
            } else {
                self.center + polar_to_cartesian(orbit, angle)
            },
            transient,
        }
    }
}

/// Swirl tint for a given progress through a convergence
pub fn convergence_tint(progress: f32) -> Rgb {
    colors::SWIRL.lerp(Rgb::new(255, 255, 255), progress)
}
