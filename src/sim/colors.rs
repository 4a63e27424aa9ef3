//! Colors-mode level runner
//!
//! No groups and no sequence. A mother dot vibrates, waits for a tap, then
//! disperses into a field of bouncing dots. Dots matching the mother color are
//! targets; the mother color moves on every few destructions and the field is
//! repopulated whenever the targets run out.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::checkpoint::CheckpointTracker;
use super::collision::{Body, pair_mut, resolve_swap};
use super::context::SimulationContext;
use super::effects::{EvictionPolicy, Explosion, Starfield};
use super::error::LevelError;
use super::level::{Completion, LevelPhase, LevelStatus};
use super::mode::GameMode;
use super::rng::{self, streams};
use super::services::{CollisionStatus, HudInfo, Services};
use crate::audio::SoundEffect;
use crate::consts::{BOUNCE_DAMPENING, COLORS_COLLISION_DELAY, POINTS_PER_HIT, WHITE};
use crate::platform::{InputEvent, PointerAction, PointerInput};
use crate::renderer::Surface;
use crate::renderer::vertex::colors;
use crate::{Rgb, Settings};

/// A nameable target color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub rgb: Rgb,
}

pub const PALETTE: [PaletteColor; 5] = [
    PaletteColor { name: "Blue", rgb: Rgb::new(0, 0, 255) },
    PaletteColor { name: "Red", rgb: Rgb::new(255, 0, 0) },
    PaletteColor { name: "Green", rgb: Rgb::new(0, 200, 0) },
    PaletteColor { name: "Yellow", rgb: Rgb::new(255, 255, 0) },
    PaletteColor { name: "Purple", rgb: Rgb::new(128, 0, 255) },
];

pub const DOT_RADIUS: f32 = 48.0;
/// Population after dispersal and after every regeneration
pub const DOT_COUNT: usize = 100;
/// Mother-colored dots in the first dispersal
pub const MOTHER_DOTS: usize = 25;
/// Destructions before the mother color moves on
pub const DOTS_PER_COLOR: u32 = 5;
/// Targets guaranteed by a regeneration
pub const MIN_TARGETS: usize = 10;

const VIBRATION_FRAMES: u32 = 30;
const VIBRATION_JITTER: f32 = 6.0;
const DISPERSE_FRAMES: u32 = 30;
const DISPERSE_SPEED: (f32, f32) = (12.0, 18.0);
const DOT_SPEED: f32 = 6.0;
const SPAWN_SCATTER: f32 = 20.0;

const REGEN_MARGIN: f32 = 100.0;
const REGEN_SPACING: f32 = 100.0;
const REGEN_ATTEMPTS: usize = 10;

const GHOST_FRAMES: u32 = 100;
const GHOST_FADE_FRAMES: u32 = 50;
const GHOST_FADE_STEP: u8 = 5;
const GHOST_RADIUS: f32 = 150.0;

const EXPLOSION_RADIUS: f32 = 60.0;
const EXPLOSION_DURATION: u32 = 15;
const CONTACT_SPARKS: usize = 3;
const ARMING_FLASH_DURATION: u32 = 15;

/// A bouncing dot
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Index into [`PALETTE`]
    pub color: usize,
    pub target: bool,
    pub alive: bool,
}

impl Dot {
    pub fn new(pos: Vec2, vel: Vec2, color: usize) -> Self {
        Self {
            pos,
            vel,
            radius: DOT_RADIUS,
            color,
            target: false,
            alive: true,
        }
    }

    pub fn rgb(&self) -> Rgb {
        PALETTE[self.color % PALETTE.len()].rgb
    }

    /// Move one frame and reflect off the screen edges
    pub fn integrate(&mut self, screen: Vec2) {
        self.pos += self.vel;
        let r = self.radius;
        if self.pos.x - r < 0.0 {
            self.pos.x = r;
            self.vel.x = -self.vel.x;
        }
        if self.pos.x + r > screen.x {
            self.pos.x = screen.x - r;
            self.vel.x = -self.vel.x;
        }
        if self.pos.y - r < 0.0 {
            self.pos.y = r;
            self.vel.y = -self.vel.y;
        }
        if self.pos.y + r > screen.y {
            self.pos.y = screen.y - r;
            self.vel.y = -self.vel.y;
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }
}

impl Body for Dot {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn mass(&self) -> f32 {
        1.0
    }

    fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    fn set_velocity(&mut self, vel: Vec2) {
        self.vel = vel;
    }

    fn is_solid(&self) -> bool {
        self.alive
    }
}

/// Intro and play stages of a colors run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorsPhase {
    /// Mother dot shaking in place; frames left
    Vibrating(u32),
    AwaitingDispersal,
    /// Ring animation; frames elapsed
    Dispersing(u32),
    Playing,
}

#[derive(Debug, Clone, Copy)]
struct DisperseParticle {
    angle: f32,
    radius: f32,
    speed: f32,
    color: usize,
}

/// Large translucent announcement of a new mother color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostNotification {
    pub color: usize,
    pub frames_left: u32,
    pub alpha: u8,
}

impl GhostNotification {
    fn new(color: usize) -> Self {
        Self {
            color,
            frames_left: GHOST_FRAMES,
            alpha: 255,
        }
    }

    pub fn is_active(&self) -> bool {
        self.frames_left > 0
    }

    fn tick(&mut self) {
        self.frames_left = self.frames_left.saturating_sub(1);
        if self.frames_left < GHOST_FADE_FRAMES {
            self.alpha = self.alpha.saturating_sub(GHOST_FADE_STEP);
        }
    }
}

pub struct ColorsLevelRunner {
    screen: Vec2,
    ctx: SimulationContext,
    services: Services,
    rng: Pcg32,
    stars: Starfield,
    input: PointerInput,
    checkpoint: CheckpointTracker,
    phase: ColorsPhase,
    dots: Vec<Dot>,
    disperse: Vec<DisperseParticle>,
    mother: usize,
    used_colors: Vec<usize>,
    ghost: Option<GhostNotification>,
    mother_radius: f32,
    collisions_armed: bool,
    arming_counter: u32,
    current_color_destroyed: u32,
    total_destroyed: u32,
    targets_left: usize,
    shapes_completed: bool,
    completion: Option<Completion>,
    score: u32,
}

impl ColorsLevelRunner {
    /// `shapes_completed` turns a continued checkpoint into a level restart
    pub fn new(
        settings: &Settings,
        screen: Vec2,
        services: Services,
        seed: u64,
        shapes_completed: bool,
    ) -> Result<Self, LevelError> {
        let mut rng = rng::stream(seed, streams::LEVEL);
        let mother = rng.random_range(0..PALETTE.len());

        let mut runner = Self {
            screen,
            ctx: SimulationContext::new(settings, screen, seed, EvictionPolicy::ShortestRemaining),
            services,
            rng,
            stars: Starfield::new(screen, Starfield::DEFAULT_COUNT, rng::stream(seed, streams::STARS)),
            input: PointerInput::new(screen),
            checkpoint: CheckpointTracker::default(),
            phase: ColorsPhase::Vibrating(VIBRATION_FRAMES),
            dots: Vec::with_capacity(DOT_COUNT),
            disperse: Vec::new(),
            mother,
            used_colors: vec![mother],
            ghost: None,
            mother_radius: settings.display_mode.mother_radius(),
            collisions_armed: false,
            arming_counter: 0,
            current_color_destroyed: 0,
            total_destroyed: 0,
            targets_left: 0,
            shapes_completed,
            completion: None,
            score: 0,
        };
        runner.ctx.reset();
        log::info!("Starting colors with mother color {}", PALETTE[mother].name);
        Ok(runner)
    }

    pub fn mode(&self) -> GameMode {
        GameMode::Colors
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn colors_phase(&self) -> ColorsPhase {
        self.phase
    }

    pub fn phase(&self) -> LevelPhase {
        match (self.completion, self.phase) {
            (Some(completion), _) => LevelPhase::Complete(completion),
            (None, ColorsPhase::Vibrating(_) | ColorsPhase::AwaitingDispersal) => {
                LevelPhase::AwaitingFirstInput
            }
            (None, _) if self.checkpoint.is_waiting() => LevelPhase::CheckpointPending,
            (None, _) => LevelPhase::Playing,
        }
    }

    /// Colors mode never runs out
    pub fn sequence_finished(&self) -> bool {
        false
    }

    pub fn mother_color(&self) -> PaletteColor {
        PALETTE[self.mother]
    }

    pub fn used_colors(&self) -> &[usize] {
        &self.used_colors
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn targets_left(&self) -> usize {
        self.targets_left
    }

    pub fn current_color_destroyed(&self) -> u32 {
        self.current_color_destroyed
    }

    pub fn total_destroyed(&self) -> u32 {
        self.total_destroyed
    }

    pub fn ghost(&self) -> Option<&GhostNotification> {
        self.ghost.as_ref().filter(|g| g.is_active())
    }

    pub fn collision_status(&self) -> CollisionStatus {
        if self.collisions_armed {
            CollisionStatus::Armed
        } else {
            CollisionStatus::Arming(COLORS_COLLISION_DELAY.saturating_sub(self.arming_counter))
        }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Position of a live target dot, if any
    pub fn target_hint(&self) -> Option<Vec2> {
        if self.phase != ColorsPhase::Playing {
            return None;
        }
        self.dots.iter().find(|d| d.alive && d.target).map(|d| d.pos)
    }

    pub fn frame(
        &mut self,
        events: &[InputEvent],
        surface: &mut dyn Surface,
    ) -> Result<LevelStatus, LevelError> {
        if let Some(completion) = self.completion {
            return Ok(LevelStatus::Complete(completion));
        }

        for event in events {
            match self.input.translate(event) {
                Some(PointerAction::Quit) => return Ok(self.finish(Completion::Quit)),
                Some(PointerAction::Tap(pos)) => match self.phase {
                    ColorsPhase::AwaitingDispersal => self.start_dispersal(),
                    ColorsPhase::Playing => self.handle_tap(pos),
                    ColorsPhase::Vibrating(_) | ColorsPhase::Dispersing(_) => {}
                },
                None => {}
            }
        }

        match self.phase {
            ColorsPhase::Vibrating(left) => {
                self.draw_mother(surface, true);
                self.phase = match left.saturating_sub(1) {
                    0 => ColorsPhase::AwaitingDispersal,
                    n => ColorsPhase::Vibrating(n),
                };
                Ok(LevelStatus::Running)
            }
            ColorsPhase::AwaitingDispersal => {
                self.draw_mother(surface, false);
                Ok(LevelStatus::Running)
            }
            ColorsPhase::Dispersing(elapsed) => {
                self.draw_dispersal(surface);
                self.phase = if elapsed + 1 >= DISPERSE_FRAMES {
                    self.disperse.clear();
                    ColorsPhase::Playing
                } else {
                    ColorsPhase::Dispersing(elapsed + 1)
                };
                Ok(LevelStatus::Running)
            }
            ColorsPhase::Playing => self.play_frame(surface),
        }
    }

    fn play_frame(&mut self, surface: &mut dyn Surface) -> Result<LevelStatus, LevelError> {
        if self.ctx.shatter.is_game_over_ready() {
            self.services.audio.play_destruction_sound(SoundEffect::GameOver);
            let completion = if self.services.screens.show_game_over_screen() {
                Completion::RestartLevel
            } else {
                Completion::ReturnToMenu
            };
            return Ok(self.finish(completion));
        }

        for dot in self.dots.iter_mut().filter(|d| d.alive) {
            dot.integrate(self.screen);
        }

        if !self.collisions_armed {
            self.arming_counter += 1;
            if self.arming_counter >= COLORS_COLLISION_DELAY {
                self.arm_collisions();
            }
        }
        if self.collisions_armed {
            self.resolve_dot_collisions();
        }

        self.draw_play(surface);

        if self.targets_left == 0 {
            self.regenerate();
        }

        if let Some(completion) = self.checkpoint_step() {
            return Ok(self.finish(completion));
        }
        Ok(LevelStatus::Running)
    }

    /// Resolve a tap during play
    pub fn handle_tap(&mut self, pos: Vec2) {
        match self.dots.iter().position(|d| d.alive && d.contains(pos)) {
            Some(index) if self.dots[index].target => self.destroy(index),
            // Tapping a distractor is neither a hit nor a misclick
            Some(_) => {}
            None => {
                if self.ctx.misclick(pos) {
                    self.services.audio.play_destruction_sound(SoundEffect::GlassCrack);
                }
            }
        }
    }

    fn destroy(&mut self, index: usize) {
        let dot = &mut self.dots[index];
        dot.alive = false;
        let (pos, color) = (dot.pos, dot.rgb());

        self.targets_left = self.targets_left.saturating_sub(1);
        self.score += POINTS_PER_HIT;
        self.current_color_destroyed += 1;
        self.total_destroyed += 1;

        self.services
            .audio
            .play_target_sound(&PALETTE[self.mother].name.to_lowercase());
        self.services.audio.play_destruction_sound(SoundEffect::Explosion);
        self.ctx
            .explosions
            .spawn(Explosion::new(pos, color, EXPLOSION_RADIUS, EXPLOSION_DURATION));

        log::debug!(
            "Destroyed {} dot ({} left, score {})",
            PALETTE[self.mother].name,
            self.targets_left,
            self.score
        );

        if self.current_color_destroyed >= DOTS_PER_COLOR {
            self.switch_color();
        }
    }

    /// Pick a mother color not used since the last reset of the rotation
    fn next_color(&mut self) -> usize {
        let mut available: Vec<usize> = (0..PALETTE.len())
            .filter(|i| !self.used_colors.contains(i))
            .collect();
        if available.is_empty() {
            self.used_colors = vec![self.mother];
            available = (0..PALETTE.len()).filter(|&i| i != self.mother).collect();
        }
        let next = *available.choose(&mut self.rng).unwrap_or(&self.mother);
        self.used_colors.push(next);
        next
    }

    fn switch_color(&mut self) {
        self.mother = self.next_color();
        self.current_color_destroyed = 0;
        self.retarget();
        self.ghost = Some(GhostNotification::new(self.mother));
        self.services.audio.play_destruction_sound(SoundEffect::ColorSwitch);
        log::info!(
            "Mother color is now {} ({} targets)",
            PALETTE[self.mother].name,
            self.targets_left
        );
    }

    /// Mark live dots of the mother color as targets and recount
    fn retarget(&mut self) {
        let mother = self.mother;
        for dot in self.dots.iter_mut().filter(|d| d.alive) {
            dot.target = dot.color == mother;
        }
        self.targets_left = self.dots.iter().filter(|d| d.alive && d.target).count();
    }

    fn start_dispersal(&mut self) {
        let center = self.screen / 2.0;
        let distractors: Vec<usize> = (0..PALETTE.len()).filter(|&i| i != self.mother).collect();
        let per_color = (DOT_COUNT - MOTHER_DOTS) / distractors.len();
        let extra = (DOT_COUNT - MOTHER_DOTS) % distractors.len();

        let mut palette = vec![self.mother; MOTHER_DOTS];
        for (i, &color) in distractors.iter().enumerate() {
            let count = per_color + usize::from(i < extra);
            palette.extend(std::iter::repeat_n(color, count));
        }

        self.disperse.clear();
        self.dots.clear();
        for color in palette {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = rng::uniform(&mut self.rng, DISPERSE_SPEED.0, DISPERSE_SPEED.1);
            self.disperse.push(DisperseParticle {
                angle,
                radius: 0.0,
                speed,
                color,
            });

            let scatter = Vec2::new(
                rng::symmetric(&mut self.rng, SPAWN_SCATTER),
                rng::symmetric(&mut self.rng, SPAWN_SCATTER),
            );
            let pos = (center + scatter).clamp(
                Vec2::splat(DOT_RADIUS),
                (self.screen - DOT_RADIUS).max(Vec2::splat(DOT_RADIUS)),
            );
            let vel = Vec2::new(
                rng::symmetric(&mut self.rng, DOT_SPEED),
                rng::symmetric(&mut self.rng, DOT_SPEED),
            );
            self.dots.push(Dot::new(pos, vel, color));
        }
        self.retarget();
        self.phase = ColorsPhase::Dispersing(0);
        log::info!(
            "Dispersed {} dots, {} {} targets",
            self.dots.len(),
            self.targets_left,
            PALETTE[self.mother].name
        );
    }

    fn arm_collisions(&mut self) {
        self.collisions_armed = true;
        self.arming_counter = 0;
        for dot in self.dots.iter().filter(|d| d.alive) {
            self.ctx
                .particles
                .create(dot.pos, dot.rgb(), dot.radius * 1.5, Vec2::ZERO, ARMING_FLASH_DURATION);
        }
        log::debug!("Dot collisions armed");
    }

    fn resolve_dot_collisions(&mut self) {
        let n = self.dots.len();
        for i in 0..n {
            if !self.dots[i].is_solid() {
                continue;
            }
            for j in (i + 1)..n {
                if !self.dots[j].is_solid() {
                    continue;
                }
                let (a, b) = pair_mut(&mut self.dots, i, j);
                let contact = resolve_swap(a, b, BOUNCE_DAMPENING);
                if contact.hit {
                    let pick = [a.rgb(), b.rgb()];
                    for _ in 0..CONTACT_SPARKS {
                        let color = *pick.choose(&mut self.rng).unwrap_or(&pick[0]);
                        self.ctx.sparks(contact.point, color, 1);
                    }
                }
            }
        }
    }

    /// Refill the field once the mother color has no targets left
    fn regenerate(&mut self) {
        self.mother = self.next_color();
        self.current_color_destroyed = 0;
        self.collisions_armed = false;
        self.arming_counter = 0;
        self.dots.retain(|d| d.alive);

        let existing_targets = self.dots.iter().filter(|d| d.color == self.mother).count();
        let targets_needed = MIN_TARGETS.saturating_sub(existing_targets);
        let to_add = DOT_COUNT.saturating_sub(self.dots.len()).max(targets_needed);
        let distractors: Vec<usize> = (0..PALETTE.len()).filter(|&i| i != self.mother).collect();

        for i in 0..to_add {
            let pos = self.free_position();
            let vel = Vec2::new(
                rng::symmetric(&mut self.rng, DOT_SPEED),
                rng::symmetric(&mut self.rng, DOT_SPEED),
            );
            let color = if i < targets_needed {
                self.mother
            } else {
                *distractors.choose(&mut self.rng).unwrap_or(&self.mother)
            };
            self.dots.push(Dot::new(pos, vel, color));
        }

        self.retarget();
        self.ghost = Some(GhostNotification::new(self.mother));
        self.services.audio.play_destruction_sound(SoundEffect::ColorSwitch);
        log::info!(
            "Regenerated {} dots, {} {} targets",
            self.dots.len(),
            self.targets_left,
            PALETTE[self.mother].name
        );
    }

    /// A spot away from other dots; the last attempt wins if none is free
    fn free_position(&mut self) -> Vec2 {
        let lo = Vec2::splat(REGEN_MARGIN);
        let hi = self.screen - REGEN_MARGIN;
        let mut pos = self.screen / 2.0;
        for _ in 0..REGEN_ATTEMPTS {
            pos = Vec2::new(
                rng::uniform(&mut self.rng, lo.x, hi.x),
                rng::uniform(&mut self.rng, lo.y, hi.y),
            );
            if self.dots.iter().all(|d| d.pos.distance(pos) >= REGEN_SPACING) {
                break;
            }
        }
        pos
    }

    fn checkpoint_step(&mut self) -> Option<Completion> {
        if !self.checkpoint.is_waiting() {
            self.checkpoint.observe(self.total_destroyed, false);
            return None;
        }
        if !self.checkpoint.poll(self.ctx.effects_settled()) {
            return None;
        }

        self.services.audio.play_destruction_sound(SoundEffect::Checkpoint);
        if !self.services.screens.show_checkpoint_screen(GameMode::Colors) {
            return Some(Completion::ReturnToMenu);
        }
        if self.shapes_completed {
            return Some(Completion::RestartLevel);
        }
        // Remind the player what they were hunting
        self.ghost = Some(GhostNotification::new(self.mother));
        None
    }

    fn draw_mother(&mut self, surface: &mut dyn Surface, vibrating: bool) {
        let center = self.screen / 2.0;
        let jitter = if vibrating {
            Vec2::new(
                rng::symmetric(&mut self.rng, VIBRATION_JITTER),
                rng::symmetric(&mut self.rng, VIBRATION_JITTER),
            )
        } else {
            Vec2::ZERO
        };

        surface.fill(colors::BACKGROUND);
        surface.circle(center + jitter, self.mother_radius, PALETTE[self.mother].rgb, 255);

        let text = self.services.text.as_mut();
        let label = text.glyph(GameMode::Colors, "Remember this color!", colors::TARGET);
        let label_at = Vec2::new(center.x, center.y + self.mother_radius + 60.0);
        surface.glyph(&label, label.bounding_rect(label_at), 255);
        if !vibrating {
            let prompt = text.glyph(GameMode::Colors, "Click to start!", colors::TARGET);
            let prompt_at = Vec2::new(center.x, center.y + self.mother_radius + 120.0);
            surface.glyph(&prompt, prompt.bounding_rect(prompt_at), 255);
        }
    }

    fn draw_dispersal(&mut self, surface: &mut dyn Surface) {
        let center = self.screen / 2.0;
        surface.fill(colors::BACKGROUND);
        for p in &mut self.disperse {
            p.radius += p.speed;
            let pos = center + Vec2::from_angle(p.angle) * p.radius;
            surface.circle(pos, DOT_RADIUS, PALETTE[p.color].rgb, 255);
        }
    }

    fn draw_play(&mut self, surface: &mut dyn Surface) {
        self.ctx.shatter.update();
        let offset = self.ctx.shake_offset();

        surface.fill(self.ctx.shatter.background_color());
        self.ctx.shatter.draw_cracks(surface);
        self.stars.update_and_draw(surface, offset);
        for dot in self.dots.iter().filter(|d| d.alive) {
            surface.circle(dot.pos + offset, dot.radius, dot.rgb(), 255);
        }
        self.ctx.explosions.update_and_draw(surface, offset);
        self.ctx.particles.update();
        self.ctx.particles.draw(surface, offset);

        let mother = PALETTE[self.mother];
        let info = HudInfo {
            mode: GameMode::Colors,
            score: self.score,
            target: Some(mother.name),
            destroyed: self.total_destroyed as usize,
            total: 0,
            cracks: self.ctx.shatter.crack_count(),
            target_swatch: Some(mother.rgb),
            targets_left: Some(self.targets_left),
            collisions: Some(self.collision_status()),
        };
        self.services.hud.display_info(surface, &info);

        self.draw_ghost(surface);
    }

    fn draw_ghost(&mut self, surface: &mut dyn Surface) {
        let Some(ghost) = self.ghost.as_mut().filter(|g| g.is_active()) else {
            return;
        };
        let center = self.screen / 2.0;
        let color = PALETTE[ghost.color];
        surface.circle(center, GHOST_RADIUS, color.rgb, ghost.alpha);

        let text = self.services.text.as_mut();
        let label = text.glyph(GameMode::Colors, "TARGET COLOR:", WHITE);
        let label_at = Vec2::new(center.x, center.y - GHOST_RADIUS - 20.0);
        surface.glyph(&label, label.bounding_rect(label_at), ghost.alpha);
        let name = text.glyph(GameMode::Colors, color.name, color.rgb);
        let name_at = Vec2::new(center.x, center.y + GHOST_RADIUS + 30.0);
        surface.glyph(&name, name.bounding_rect(name_at), ghost.alpha);

        ghost.tick();
    }

    fn finish(&mut self, completion: Completion) -> LevelStatus {
        self.completion = Some(completion);
        self.checkpoint.clear_pending();
        if completion != Completion::Quit {
            self.ctx.cleanup();
        }
        self.dots.clear();
        self.disperse.clear();
        log::info!("colors ended: {:?} (score {})", completion, self.score);
        LevelStatus::Complete(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::VertexBatch;
    use crate::sim::services::ScriptedScreens;

    const SCREEN: Vec2 = Vec2::new(1600.0, 1000.0);
    const RED: usize = 1;

    fn runner(shapes_completed: bool, checkpoints: u32) -> ColorsLevelRunner {
        let services = Services::headless(24.0, Box::new(ScriptedScreens::new(checkpoints, false)));
        ColorsLevelRunner::new(&Settings::default(), SCREEN, services, 9, shapes_completed).unwrap()
    }

    fn tap(pos: Vec2) -> [InputEvent; 2] {
        [
            InputEvent::MouseDown { pos, time_ms: 0 },
            InputEvent::MouseUp { pos, time_ms: 10 },
        ]
    }

    /// Drive the intro until dots are in play
    fn start(level: &mut ColorsLevelRunner, surface: &mut VertexBatch) {
        for _ in 0..VIBRATION_FRAMES {
            level.frame(&[], surface).unwrap();
        }
        assert_eq!(level.colors_phase(), ColorsPhase::AwaitingDispersal);
        level.frame(&tap(SCREEN / 2.0), surface).unwrap();
        let mut frames = 1;
        while matches!(level.colors_phase(), ColorsPhase::Dispersing(_)) {
            level.frame(&[], surface).unwrap();
            frames += 1;
        }
        assert_eq!(frames, DISPERSE_FRAMES);
        assert_eq!(level.colors_phase(), ColorsPhase::Playing);
    }

    /// Mother red with 12 red dots spread in a grid among 100
    fn red_field(level: &mut ColorsLevelRunner) {
        level.mother = RED;
        level.used_colors = vec![RED];
        level.current_color_destroyed = 0;
        level.phase = ColorsPhase::Playing;
        level.dots = (0..DOT_COUNT)
            .map(|i| {
                let pos = Vec2::new(60.0 + (i % 10) as f32 * 140.0, 60.0 + (i / 10) as f32 * 98.0);
                let color = if i < 12 { RED } else { [0, 2, 3, 4][i % 4] };
                Dot::new(pos, Vec2::ZERO, color)
            })
            .collect();
        level.retarget();
    }

    #[test]
    fn test_intro_ignores_taps_until_waiting() {
        let mut level = runner(false, u32::MAX);
        let mut surface = VertexBatch::new(SCREEN);
        level.frame(&tap(Vec2::new(10.0, 10.0)), &mut surface).unwrap();
        assert!(matches!(level.colors_phase(), ColorsPhase::Vibrating(_)));
        assert_eq!(level.phase(), LevelPhase::AwaitingFirstInput);
        assert!(level.dots().is_empty());
        assert_eq!(level.context().shatter.crack_count(), 0);
    }

    #[test]
    fn test_dispersal_population() {
        let mut level = runner(false, u32::MAX);
        let mut surface = VertexBatch::new(SCREEN);
        start(&mut level, &mut surface);

        assert_eq!(level.dots().len(), DOT_COUNT);
        let mother = level.mother;
        let mother_dots = level.dots().iter().filter(|d| d.color == mother).count();
        assert_eq!(mother_dots, MOTHER_DOTS);
        assert_eq!(level.targets_left(), MOTHER_DOTS);
        for color in (0..PALETTE.len()).filter(|&c| c != mother) {
            let count = level.dots().iter().filter(|d| d.color == color).count();
            assert!(count == 18 || count == 19, "{count}");
        }
        assert!(level.dots().iter().all(|d| d.target == (d.color == mother)));
    }

    #[test]
    fn test_red_switches_after_five() {
        let mut level = runner(false, u32::MAX);
        red_field(&mut level);
        assert_eq!(level.targets_left(), 12);

        let reds: Vec<Vec2> = level.dots().iter().filter(|d| d.color == RED).map(|d| d.pos).take(5).collect();
        for (n, pos) in reds.into_iter().enumerate() {
            level.handle_tap(pos);
            if n < 4 {
                assert_eq!(level.current_color_destroyed(), n as u32 + 1);
            }
        }

        assert_eq!(level.score(), 50);
        assert_ne!(level.mother_color().name, "Red");
        assert_eq!(level.used_colors().len(), 2);
        assert_eq!(level.used_colors()[0], RED);
        assert_eq!(level.current_color_destroyed(), 0);

        let mother = level.mother;
        for dot in level.dots().iter().filter(|d| d.alive) {
            assert_eq!(dot.target, dot.color == mother);
        }
        assert!(level.ghost().is_some());
    }

    #[test]
    fn test_rotation_resets_when_exhausted() {
        let mut level = runner(false, u32::MAX);
        level.mother = 0;
        level.used_colors = (0..PALETTE.len()).collect();
        let next = level.next_color();
        assert_ne!(next, 0);
        assert_eq!(level.used_colors(), &[0, next]);
    }

    #[test]
    fn test_distractor_tap_does_nothing() {
        let mut level = runner(false, u32::MAX);
        red_field(&mut level);
        let pos = level.dots()[20].pos;
        level.handle_tap(pos);
        assert_eq!(level.score(), 0);
        assert_eq!(level.context().shatter.crack_count(), 0);
        assert!(level.dots()[20].alive);
    }

    #[test]
    fn test_empty_tap_cracks() {
        let mut level = runner(false, u32::MAX);
        red_field(&mut level);
        level.handle_tap(Vec2::new(1590.0, 990.0));
        assert_eq!(level.context().shatter.crack_count(), 1);
    }

    #[test]
    fn test_collisions_arm_after_delay() {
        let mut level = runner(false, u32::MAX);
        let mut surface = VertexBatch::new(SCREEN);
        start(&mut level, &mut surface);
        assert_eq!(level.collision_status(), CollisionStatus::Arming(COLORS_COLLISION_DELAY));
        for _ in 0..COLORS_COLLISION_DELAY {
            level.frame(&[], &mut surface).unwrap();
        }
        assert_eq!(level.collision_status(), CollisionStatus::Armed);
    }

    #[test]
    fn test_regenerates_when_targets_run_out() {
        let mut level = runner(false, u32::MAX);
        let mut surface = VertexBatch::new(SCREEN);
        red_field(&mut level);
        for dot in level.dots.iter_mut().filter(|d| d.color == RED) {
            dot.alive = false;
        }
        level.retarget();
        level.collisions_armed = true;
        assert_eq!(level.targets_left(), 0);

        level.frame(&[], &mut surface).unwrap();
        assert!(level.dots().iter().all(|d| d.alive));
        assert_eq!(level.dots().len(), DOT_COUNT);
        assert!(level.targets_left() >= MIN_TARGETS);
        assert!(matches!(level.collision_status(), CollisionStatus::Arming(_)));
        assert_ne!(level.mother, RED);
    }

    #[test]
    fn test_ghost_fades_over_last_frames() {
        let mut ghost = GhostNotification::new(0);
        for _ in 0..50 {
            ghost.tick();
        }
        assert_eq!(ghost.alpha, 255);
        ghost.tick();
        assert_eq!(ghost.alpha, 250);
        for _ in 0..49 {
            ghost.tick();
        }
        assert!(!ghost.is_active());
    }

    #[test]
    fn test_checkpoint_restarts_when_shapes_done() {
        let mut level = runner(true, u32::MAX);
        let mut surface = VertexBatch::new(SCREEN);
        red_field(&mut level);
        level.total_destroyed = 10;
        let mut status = LevelStatus::Running;
        for _ in 0..200 {
            status = level.frame(&[], &mut surface).unwrap();
            if status != LevelStatus::Running {
                break;
            }
        }
        assert_eq!(status, LevelStatus::Complete(Completion::RestartLevel));
    }

    #[test]
    fn test_checkpoint_declined_returns_to_menu() {
        let mut level = runner(false, 0);
        let mut surface = VertexBatch::new(SCREEN);
        red_field(&mut level);
        level.total_destroyed = 10;
        let mut status = LevelStatus::Running;
        for _ in 0..200 {
            status = level.frame(&[], &mut surface).unwrap();
            if status != LevelStatus::Running {
                break;
            }
        }
        assert_eq!(status, LevelStatus::Complete(Completion::ReturnToMenu));
    }

    #[test]
    fn test_quit_during_intro() {
        let mut level = runner(false, u32::MAX);
        let mut surface = VertexBatch::new(SCREEN);
        let status = level.frame(&[InputEvent::Quit], &mut surface).unwrap();
        assert_eq!(status, LevelStatus::Complete(Completion::Quit));
    }
}
