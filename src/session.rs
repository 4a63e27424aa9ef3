//! Level lifecycle driver
//!
//! Builds the runner for a mode, feeds it input once per frame at a fixed
//! rate, records progress and keeps an error budget across runs.

use std::fmt;
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::Settings;
use crate::consts::FRAME_RATE;
use crate::persistence::{ProgressMarker, SHAPES};
use crate::platform::InputEvent;
use crate::renderer::Surface;
use crate::sim::rng;
use crate::sim::{
    ColorsLevelRunner, Completion, GameMode, LevelError, LevelPhase, LevelRunner, LevelStatus,
    Services,
};

/// Errors tolerated before the session shuts down
pub const MAX_ERRORS: u32 = 5;
/// Back-to-back restarts allowed in one `play` call
pub const MAX_RESTARTS: u32 = 3;
/// Frames a single run may last before it is abandoned
pub const DEFAULT_FRAME_LIMIT: u64 = 50 * 60 * 10;

/// Sleeps out the rest of each frame.
///
/// A late frame is not compensated for; the next deadline is measured from
/// the moment the late frame finished.
#[derive(Debug)]
pub struct FrameClock {
    frame: Duration,
    deadline: Instant,
    frame_times: [Option<Instant>; 60],
    frame_index: usize,
    fps: u32,
}

impl FrameClock {
    pub fn new(rate: u32) -> Self {
        let frame = Duration::from_secs(1) / rate.max(1);
        Self {
            frame,
            deadline: Instant::now() + frame,
            frame_times: [None; 60],
            frame_index: 0,
            fps: 0,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Measured rate over the last 60 frames
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Block until the current frame's deadline; returns the time slept
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        let slept = if now < self.deadline {
            let remaining = self.deadline - now;
            std::thread::sleep(remaining);
            self.deadline += self.frame;
            remaining
        } else {
            self.deadline = now + self.frame;
            Duration::ZERO
        };
        self.track(Instant::now());
        slept
    }

    fn track(&mut self, now: Instant) {
        let oldest = self.frame_times[self.frame_index];
        self.frame_times[self.frame_index] = Some(now);
        self.frame_index = (self.frame_index + 1) % self.frame_times.len();
        if let Some(oldest) = oldest {
            let elapsed = now.duration_since(oldest).as_secs_f64();
            if elapsed > 0.0 {
                self.fps = (self.frame_times.len() as f64 / elapsed).round() as u32;
            }
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_RATE)
    }
}

/// Counts errors across runs; once exhausted the session shuts down
#[derive(Debug, Clone, Copy)]
pub struct ErrorBudget {
    count: u32,
    max: u32,
}

impl ErrorBudget {
    pub fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.max
    }

    /// Log and count an error; true once the budget is spent
    pub fn record(&mut self, context: &str, error: &dyn fmt::Display) -> bool {
        self.count += 1;
        log::warn!("Error #{} in {}: {}", self.count, context, error);
        if self.is_exhausted() {
            log::error!("Maximum error count ({}) reached, shutting down", self.max);
        }
        self.is_exhausted()
    }
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self::new(MAX_ERRORS)
    }
}

/// Whichever runner the mode needs
pub enum Level {
    Groups(LevelRunner),
    Colors(ColorsLevelRunner),
}

impl Level {
    pub fn new(
        mode: GameMode,
        settings: &Settings,
        screen: Vec2,
        services: Services,
        seed: u64,
        shapes_completed: bool,
    ) -> Result<Self, LevelError> {
        match mode {
            GameMode::Colors => Ok(Level::Colors(ColorsLevelRunner::new(
                settings,
                screen,
                services,
                seed,
                shapes_completed,
            )?)),
            _ => Ok(Level::Groups(LevelRunner::new(mode, settings, screen, services, seed)?)),
        }
    }

    pub fn mode(&self) -> GameMode {
        match self {
            Level::Groups(level) => level.mode(),
            Level::Colors(level) => level.mode(),
        }
    }

    pub fn frame(
        &mut self,
        events: &[InputEvent],
        surface: &mut dyn Surface,
    ) -> Result<LevelStatus, LevelError> {
        match self {
            Level::Groups(level) => level.frame(events, surface),
            Level::Colors(level) => level.frame(events, surface),
        }
    }

    pub fn phase(&self) -> LevelPhase {
        match self {
            Level::Groups(level) => level.phase(),
            Level::Colors(level) => level.phase(),
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            Level::Groups(level) => level.score(),
            Level::Colors(level) => level.score(),
        }
    }

    pub fn sequence_finished(&self) -> bool {
        match self {
            Level::Groups(level) => level.sequence_finished(),
            Level::Colors(level) => level.sequence_finished(),
        }
    }

    pub fn target_hint(&self) -> Option<Vec2> {
        match self {
            Level::Groups(level) => level.target_hint(),
            Level::Colors(level) => level.target_hint(),
        }
    }
}

/// Where a frame's raw events come from
pub trait InputSource {
    fn poll(&mut self, level: &Level, frame: u64) -> Vec<InputEvent>;
}

/// Scripted player: taps the current target and now and then misses
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    screen: Vec2,
    rng: Pcg32,
    /// Chance a tap lands on a random spot instead of the target
    pub miss_chance: f64,
    /// Frames between taps
    pub tap_every: u64,
}

impl AutoPlayer {
    pub fn new(screen: Vec2, seed: u64) -> Self {
        Self {
            screen,
            rng: rng::stream(seed, 0),
            miss_chance: 0.05,
            tap_every: 10,
        }
    }

    fn tap(pos: Vec2, frame: u64) -> Vec<InputEvent> {
        let time_ms = frame * 1000 / u64::from(FRAME_RATE);
        vec![
            InputEvent::MouseDown { pos, time_ms },
            InputEvent::MouseUp { pos, time_ms },
        ]
    }
}

impl InputSource for AutoPlayer {
    fn poll(&mut self, level: &Level, frame: u64) -> Vec<InputEvent> {
        if frame % self.tap_every.max(1) != 0 {
            return Vec::new();
        }
        if level.phase() == LevelPhase::AwaitingFirstInput {
            return Self::tap(self.screen / 2.0, frame);
        }
        if self.miss_chance > 0.0 && self.rng.random_bool(self.miss_chance.min(1.0)) {
            let pos = Vec2::new(
                rng::uniform(&mut self.rng, 0.0, self.screen.x),
                rng::uniform(&mut self.rng, 0.0, self.screen.y),
            );
            return Self::tap(pos, frame);
        }
        match level.target_hint() {
            Some(pos) => Self::tap(pos, frame),
            None => Vec::new(),
        }
    }
}

/// How one `run_level` or `play` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum LevelOutcome {
    Completed { completion: Completion, score: u32 },
    /// The frame limit ran out first
    TimedOut { score: u32 },
    Failed(LevelError),
    /// The error budget is spent
    Shutdown,
}

pub struct Session {
    settings: Settings,
    screen: Vec2,
    progress: ProgressMarker,
    seed: u64,
    runs: u64,
    errors: ErrorBudget,
    clock: Option<FrameClock>,
    frame_limit: u64,
}

impl Session {
    pub fn new(settings: Settings, screen: Vec2, progress: ProgressMarker, seed: u64) -> Self {
        Self {
            settings,
            screen,
            progress,
            seed,
            runs: 0,
            errors: ErrorBudget::default(),
            clock: None,
            frame_limit: DEFAULT_FRAME_LIMIT,
        }
    }

    /// Pace frames in real time instead of as fast as possible
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.clock = realtime.then(FrameClock::default);
        self
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = frames;
        self
    }

    pub fn errors(&self) -> &ErrorBudget {
        &self.errors
    }

    pub fn is_shut_down(&self) -> bool {
        self.errors.is_exhausted()
    }

    fn shapes_completed(&mut self) -> bool {
        match self.progress.is_completed(SHAPES) {
            Ok(done) => done,
            Err(e) => {
                self.errors.record("reading level progress", &e);
                false
            }
        }
    }

    /// One run of a level, start to completion
    pub fn run_level(
        &mut self,
        mode: GameMode,
        services: Services,
        input: &mut dyn InputSource,
        surface: &mut dyn Surface,
    ) -> LevelOutcome {
        if self.is_shut_down() {
            return LevelOutcome::Shutdown;
        }
        let shapes_completed = self.shapes_completed();
        let seed = self.seed.wrapping_add(self.runs);
        self.runs += 1;

        let mut level = match Level::new(mode, &self.settings, self.screen, services, seed, shapes_completed) {
            Ok(level) => level,
            Err(e) => return self.fail(mode, e),
        };

        for frame in 0..self.frame_limit {
            let events = input.poll(&level, frame);
            match level.frame(&events, surface) {
                Ok(LevelStatus::Running) => {}
                Ok(LevelStatus::Complete(completion)) => {
                    if mode == GameMode::Shapes && level.sequence_finished() {
                        if let Err(e) = self.progress.mark_completed(SHAPES) {
                            self.errors.record("writing level progress", &e);
                        }
                    }
                    return LevelOutcome::Completed {
                        completion,
                        score: level.score(),
                    };
                }
                Err(e) => return self.fail(mode, e),
            }
            if let Some(clock) = self.clock.as_mut() {
                clock.wait();
                if self.settings.show_fps && frame % (u64::from(FRAME_RATE) * 5) == 0 {
                    log::info!("{} fps", clock.fps());
                }
            }
        }

        log::warn!("{} abandoned after {} frames", mode.as_str(), self.frame_limit);
        LevelOutcome::TimedOut { score: level.score() }
    }

    fn fail(&mut self, mode: GameMode, error: LevelError) -> LevelOutcome {
        if self.errors.record(mode.as_str(), &error) {
            LevelOutcome::Shutdown
        } else {
            LevelOutcome::Failed(error)
        }
    }

    /// Run a mode, restarting it when the level asks, until it leaves for
    /// the menu
    pub fn play(
        &mut self,
        mode: GameMode,
        services: &mut dyn FnMut(GameMode) -> Services,
        input: &mut dyn InputSource,
        surface: &mut dyn Surface,
    ) -> LevelOutcome {
        let mut restarts = 0;
        loop {
            let outcome = self.run_level(mode, services(mode), input, surface);
            match outcome {
                LevelOutcome::Completed {
                    completion: Completion::RestartLevel,
                    ..
                } if restarts < MAX_RESTARTS => {
                    restarts += 1;
                    log::info!("Restarting {} ({}/{})", mode.as_str(), restarts, MAX_RESTARTS);
                }
                other => return other,
            }
        }
    }
}
