//! Group-mode level runner (alphabet, numbers, lower case, shapes)
//!
//! One call to [`LevelRunner::frame`] is one frame: drain input, spawn, step
//! the simulation, draw every layer in a fixed order, then evaluate the
//! checkpoint and group progression.

use glam::Vec2;

use super::checkpoint::CheckpointTracker;
use super::context::SimulationContext;
use super::effects::{
    DEFAULT_EXPLOSION_DURATION, DEFAULT_EXPLOSION_RADIUS, EvictionPolicy, FLAME_DURATION, Starfield,
};
use super::error::LevelError;
use super::groups::{GroupAdvance, GroupTracker};
use super::mode::GameMode;
use super::objects::{FallingObjectSet, HitTest, PUSH_RADIUS};
use super::rng::{self, streams};
use super::services::{HudInfo, Services};
use crate::Settings;
use crate::audio::SoundEffect;
use crate::consts::{
    GROUP_SIZE, LETTER_SPAWN_INTERVAL, POINTS_PER_HIT, SHAKE_DURATION_WRONG_TARGET,
    SHAKE_MAGNITUDE_WRONG_TARGET,
};
use crate::platform::{InputEvent, PointerAction, PointerInput};
use crate::renderer::Surface;

/// Height above the screen center flames are fired from
const PLAYER_ORIGIN_LIFT: f32 = 80.0;

/// How a level run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    ReturnToMenu,
    RestartLevel,
    /// Escape or window close; in-flight state is abandoned
    Quit,
}

/// Result of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Running,
    Complete(Completion),
}

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPhase {
    AwaitingFirstInput,
    Playing,
    /// Still playing, with a checkpoint waiting for the screen to settle
    CheckpointPending,
    Complete(Completion),
}

pub struct LevelRunner {
    mode: GameMode,
    screen: Vec2,
    ctx: SimulationContext,
    services: Services,
    groups: GroupTracker,
    objects: FallingObjectSet,
    checkpoint: CheckpointTracker,
    input: PointerInput,
    stars: Starfield,
    started: bool,
    completion: Option<Completion>,
    sequence_finished: bool,
    just_completed_group: bool,
    score: u32,
    frame: u64,
}

impl LevelRunner {
    pub fn new(
        mode: GameMode,
        settings: &Settings,
        screen: Vec2,
        services: Services,
        seed: u64,
    ) -> Result<Self, LevelError> {
        if mode == GameMode::Colors {
            return Err(LevelError::UnsupportedMode(mode));
        }
        let groups = GroupTracker::new(mode, mode.sequence(), GROUP_SIZE)?;

        let mut runner = Self {
            mode,
            screen,
            ctx: SimulationContext::new(settings, screen, seed, EvictionPolicy::Oldest),
            services,
            groups,
            objects: FallingObjectSet::new(
                screen,
                settings.collision_check_frequency(),
                rng::stream(seed, streams::OBJECTS),
            ),
            checkpoint: CheckpointTracker::default(),
            input: PointerInput::new(screen),
            stars: Starfield::new(screen, Starfield::DEFAULT_COUNT, rng::stream(seed, streams::STARS)),
            started: false,
            completion: None,
            sequence_finished: false,
            just_completed_group: false,
            score: 0,
            frame: 0,
        };
        runner.ctx.reset();
        log::info!(
            "Starting {} with {} groups",
            mode.as_str(),
            runner.groups.group_count()
        );
        Ok(runner)
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> LevelPhase {
        match self.completion {
            Some(completion) => LevelPhase::Complete(completion),
            None if !self.started => LevelPhase::AwaitingFirstInput,
            None if self.checkpoint.is_waiting() => LevelPhase::CheckpointPending,
            None => LevelPhase::Playing,
        }
    }

    /// Every group of the sequence was cleared
    pub fn sequence_finished(&self) -> bool {
        self.sequence_finished
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn groups(&self) -> &GroupTracker {
        &self.groups
    }

    pub fn objects(&self) -> &FallingObjectSet {
        &self.objects
    }

    /// Center of a drawn object carrying the current target, if any
    pub fn target_hint(&self) -> Option<Vec2> {
        let target = self.groups.target()?;
        self.objects
            .iter()
            .find(|o| o.value == target && o.rect.width() > 0.0)
            .map(|o| o.rect.center())
    }

    /// Step one frame
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
                Some(PointerAction::Tap(_)) if !self.started => {
                    self.started = true;
                    log::info!("{} started", self.mode.as_str());
                }
                Some(PointerAction::Tap(pos)) => self.handle_tap(pos),
                None => {}
            }
        }

        if self.ctx.shatter.is_game_over_ready() {
            self.services.audio.play_destruction_sound(SoundEffect::GameOver);
            let restart = self.services.screens.show_game_over_screen();
            let completion = if restart {
                Completion::RestartLevel
            } else {
                Completion::ReturnToMenu
            };
            return Ok(self.finish(completion));
        }

        if self.started && self.frame % LETTER_SPAWN_INTERVAL == 0 {
            if let Some(value) = self.groups.next_spawn() {
                log::debug!("Spawning {}", value);
                self.objects.spawn(value, self.mode.fall_speed_scale());
            }
        }

        self.step_and_draw(surface);
        self.frame += 1;

        if let Some(completion) = self.checkpoint_step() {
            return Ok(self.finish(completion));
        }
        if let Some(completion) = self.progression_step()? {
            return Ok(self.finish(completion));
        }
        Ok(LevelStatus::Running)
    }

    /// Resolve a tap against the objects on screen
    pub fn handle_tap(&mut self, pos: Vec2) {
        match self.objects.hit_test(pos, self.groups.target()) {
            HitTest::Target(index) => self.destroy(index),
            HitTest::Other(_) => {
                self.services.audio.play_destruction_sound(SoundEffect::WrongTarget);
                self.ctx
                    .shatter
                    .trigger_shake(SHAKE_DURATION_WRONG_TARGET, SHAKE_MAGNITUDE_WRONG_TARGET);
            }
            HitTest::Miss => {
                if self.ctx.misclick(pos) {
                    self.services.audio.play_destruction_sound(SoundEffect::GlassCrack);
                }
            }
        }
    }

    fn destroy(&mut self, index: usize) {
        let object = self.objects.remove(index);
        self.score += POINTS_PER_HIT;

        self.services
            .audio
            .play_target_sound(&self.mode.spoken_word(&object.value));
        self.services.audio.play_destruction_sound(SoundEffect::Explosion);

        self.ctx
            .explode(object.pos, DEFAULT_EXPLOSION_RADIUS, DEFAULT_EXPLOSION_DURATION);
        let origin = self.player_origin();
        self.ctx.flames.spawn(origin, object.pos, FLAME_DURATION);
        self.ctx.particle_burst(object.pos);
        self.ctx.center.trigger_convergence(object.pos);
        self.objects.apply_push(object.pos, PUSH_RADIUS);

        self.groups.record_destroyed(&object.value);
        log::debug!(
            "Destroyed {} (score {}, next {:?})",
            object.value,
            self.score,
            self.groups.target()
        );
    }

    fn player_origin(&self) -> Vec2 {
        Vec2::new(self.screen.x / 2.0, self.screen.y / 2.0 - PLAYER_ORIGIN_LIFT)
    }

    fn step_and_draw(&mut self, surface: &mut dyn Surface) {
        self.ctx.shatter.update();
        let offset = self.ctx.shake_offset();
        let target = self.groups.target();
        let text = self.services.text.as_mut();

        self.objects.advance();
        self.objects.resolve_collisions(self.frame);

        surface.fill(self.ctx.shatter.background_color());
        self.ctx.shatter.draw_cracks(surface);
        self.stars.update_and_draw(surface, offset);
        self.ctx
            .center
            .update_and_draw(surface, text, target, self.mode, offset);
        self.objects.draw(surface, text, self.mode, target, offset);
        self.ctx.flames.update_and_draw(surface, offset);
        self.ctx.explosions.update_and_draw(surface, offset);
        self.ctx.particles.update();
        self.ctx.particles.draw(surface, offset);

        let info = HudInfo {
            mode: self.mode,
            score: self.score,
            target,
            destroyed: self.groups.overall_destroyed(),
            total: self.groups.total_values(),
            cracks: self.ctx.shatter.crack_count(),
            target_swatch: None,
            targets_left: None,
            collisions: None,
        };
        self.services.hud.display_info(surface, &info);
    }

    fn checkpoint_step(&mut self) -> Option<Completion> {
        if !self.checkpoint.is_waiting() {
            self.checkpoint
                .observe(self.groups.overall_destroyed() as u32, self.just_completed_group);
            return None;
        }
        if !self.checkpoint.poll(self.ctx.effects_settled()) {
            return None;
        }

        self.services.audio.play_destruction_sound(SoundEffect::Checkpoint);
        if !self.services.screens.show_checkpoint_screen(self.mode) {
            return Some(Completion::ReturnToMenu);
        }
        if self.mode == GameMode::Shapes {
            return Some(Completion::RestartLevel);
        }
        None
    }

    fn progression_step(&mut self) -> Result<Option<Completion>, LevelError> {
        if !self.groups.is_group_complete(self.objects.len()) {
            return Ok(None);
        }
        self.just_completed_group = true;
        match self.groups.advance()? {
            GroupAdvance::Next => {
                self.just_completed_group = false;
                self.checkpoint.rebase(self.groups.overall_destroyed() as u32);
                Ok(None)
            }
            GroupAdvance::Finished => {
                self.sequence_finished = true;
                log::info!("{} complete with score {}", self.mode.as_str(), self.score);
                // Either choice leaves the finished level
                let _ = self.services.screens.show_checkpoint_screen(self.mode);
                Ok(Some(Completion::ReturnToMenu))
            }
        }
    }

    fn finish(&mut self, completion: Completion) -> LevelStatus {
        self.completion = Some(completion);
        self.checkpoint.clear_pending();
        if completion != Completion::Quit {
            self.ctx.cleanup();
        }
        self.objects.clear();
        log::info!("{} ended: {:?}", self.mode.as_str(), completion);
        LevelStatus::Complete(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::VertexBatch;
    use crate::sim::objects::FallingObject;
    use crate::sim::services::ScriptedScreens;

    const SCREEN: Vec2 = Vec2::new(1200.0, 900.0);

    fn runner(mode: GameMode) -> LevelRunner {
        let services = Services::headless(100.0, Box::new(ScriptedScreens::new(u32::MAX, false)));
        LevelRunner::new(mode, &Settings::default(), SCREEN, services, 42).unwrap()
    }

    fn tap(pos: Vec2) -> [InputEvent; 2] {
        [
            InputEvent::MouseDown { pos, time_ms: 0 },
            InputEvent::MouseUp { pos, time_ms: 10 },
        ]
    }

    /// Place an object and draw once so its rectangle is live
    fn place(level: &mut LevelRunner, value: &str, pos: Vec2, surface: &mut VertexBatch) {
        level
            .objects
            .insert(FallingObject::new(value, pos, Vec2::ZERO, 240.0, 50.0));
        let target = level.groups.target().map(String::from);
        level.objects.draw(
            surface,
            level.services.text.as_mut(),
            level.mode,
            target.as_deref(),
            Vec2::ZERO,
        );
    }

    #[test]
    fn test_colors_mode_rejected() {
        let services = Services::headless(100.0, Box::new(ScriptedScreens::default()));
        let err = LevelRunner::new(GameMode::Colors, &Settings::default(), SCREEN, services, 1).err();
        assert_eq!(err, Some(LevelError::UnsupportedMode(GameMode::Colors)));
    }

    #[test]
    fn test_first_tap_only_starts() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        assert_eq!(level.phase(), LevelPhase::AwaitingFirstInput);

        level.frame(&tap(Vec2::new(5.0, 5.0)), &mut surface).unwrap();
        assert_eq!(level.phase(), LevelPhase::Playing);
        assert_eq!(level.context().shatter.crack_count(), 0);
        assert_eq!(level.score(), 0);
        // The spawn cadence starts on the same frame
        assert_eq!(level.objects().len(), 1);
    }

    #[test]
    fn test_spawn_cadence() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        level.frame(&tap(Vec2::ONE), &mut surface).unwrap();
        for _ in 0..(LETTER_SPAWN_INTERVAL * 2) {
            level.frame(&[], &mut surface).unwrap();
        }
        assert_eq!(level.groups().spawned(), 3);
        assert_eq!(level.objects().len(), 3);
    }

    #[test]
    fn test_hit_target_scenario() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        level.started = true;
        let pos = Vec2::new(600.0, 450.0);
        place(&mut level, "A", pos, &mut surface);

        level.handle_tap(pos);

        assert_eq!(level.score(), 10);
        assert_eq!(level.groups().remaining(), &["B", "C", "D", "E"]);
        assert_eq!(level.groups().target(), Some("B"));
        assert_eq!(level.context().explosions.len(), 1);
        assert_eq!(level.context().flames.len(), 1);
        assert_eq!(level.context().particles.active_count(), 20);
        assert!(level.context().center.is_converging());
        assert_eq!(level.objects().len(), 0);
    }

    #[test]
    fn test_non_target_tap_only_shakes() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        let pos = Vec2::new(300.0, 300.0);
        place(&mut level, "C", pos, &mut surface);

        level.handle_tap(pos);
        assert_eq!(level.score(), 0);
        assert_eq!(level.objects().len(), 1);
        assert!(level.context().shatter.is_shaking());
        assert_eq!(level.context().shatter.crack_count(), 0);
    }

    #[test]
    fn test_empty_space_tap_cracks() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        level.frame(&tap(Vec2::ONE), &mut surface).unwrap();

        level.frame(&tap(Vec2::new(1100.0, 100.0)), &mut surface).unwrap();
        assert_eq!(level.context().shatter.crack_count(), 1);
        assert_eq!(level.score(), 0);
    }

    #[test]
    fn test_cracks_monotonic_and_zero_at_start() {
        let mut level = runner(GameMode::Numbers);
        let mut surface = VertexBatch::new(SCREEN);
        assert_eq!(level.context().shatter.crack_count(), 0);
        level.frame(&tap(Vec2::ONE), &mut surface).unwrap();

        let mut last = 0;
        for i in 0..200u32 {
            let events = if i % 3 == 0 { tap(Vec2::new(5.0, 880.0)).to_vec() } else { Vec::new() };
            if level.frame(&events, &mut surface).unwrap() != LevelStatus::Running {
                break;
            }
            let cracks = level.context().shatter.crack_count();
            assert!(cracks >= last);
            last = cracks;
        }
        assert!(last > 0);
    }

    #[test]
    fn test_quit_abandons_run() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        let status = level.frame(&[InputEvent::Escape], &mut surface).unwrap();
        assert_eq!(status, LevelStatus::Complete(Completion::Quit));
        assert_eq!(level.phase(), LevelPhase::Complete(Completion::Quit));
        assert_eq!(
            level.frame(&[], &mut surface).unwrap(),
            LevelStatus::Complete(Completion::Quit)
        );
    }

    #[test]
    fn test_game_over_returns_to_menu() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        level.frame(&tap(Vec2::ONE), &mut surface).unwrap();

        let mut status = LevelStatus::Running;
        for i in 0..2000u32 {
            let events = if i % 20 == 0 { tap(Vec2::new(5.0, 880.0)).to_vec() } else { Vec::new() };
            status = level.frame(&events, &mut surface).unwrap();
            if status != LevelStatus::Running {
                break;
            }
        }
        assert_eq!(status, LevelStatus::Complete(Completion::ReturnToMenu));
        assert_eq!(level.context().particles.active_count(), 0);
    }

    /// Destroy every target of the current group through the frame loop
    fn clear_group(level: &mut LevelRunner, surface: &mut VertexBatch) -> LevelStatus {
        for _ in 0..5000 {
            let events = match level.target_hint() {
                Some(pos) => tap(pos).to_vec(),
                None => Vec::new(),
            };
            let status = level.frame(&events, surface).unwrap();
            if status != LevelStatus::Running {
                return status;
            }
            if level.groups().group_index() > 0 && level.objects().is_empty() && level.groups().spawned() == 0 {
                return status;
            }
        }
        LevelStatus::Running
    }

    #[test]
    fn test_group_advances_after_clearing() {
        let mut level = runner(GameMode::Alphabet);
        let mut surface = VertexBatch::new(SCREEN);
        level.frame(&tap(Vec2::ONE), &mut surface).unwrap();

        let status = clear_group(&mut level, &mut surface);
        assert_eq!(status, LevelStatus::Running);
        assert_eq!(level.groups().group_index(), 1);
        assert_eq!(level.groups().target(), Some("F"));
        assert_eq!(level.score(), 50);
    }

    #[test]
    fn test_shapes_finish_returns_to_menu() {
        let mut level = runner(GameMode::Shapes);
        let mut surface = VertexBatch::new(SCREEN);
        level.frame(&tap(Vec2::ONE), &mut surface).unwrap();

        let status = clear_group(&mut level, &mut surface);
        assert_eq!(status, LevelStatus::Complete(Completion::ReturnToMenu));
        assert!(level.sequence_finished());
        assert_eq!(level.score(), 50);
    }
}
