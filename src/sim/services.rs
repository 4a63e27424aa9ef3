//! Collaborators a level talks to
//!
//! Screens that block the frame (checkpoint, game over) and the HUD live
//! outside the simulation; a runner receives them once at construction.

use crate::Rgb;
use crate::audio::{AudioSink, SilentAudio};
use crate::renderer::{BlockGlyphs, Surface, TextRenderer};

use super::mode::GameMode;

/// Modal screens shown between stretches of play
pub trait Screens {
    /// Returns true to keep playing, false to leave for the menu
    fn show_checkpoint_screen(&mut self, mode: GameMode) -> bool;

    /// Returns true to restart the level, false to leave for the menu
    fn show_game_over_screen(&mut self) -> bool;
}

/// Whether dot collisions are armed yet in colors mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionStatus {
    Armed,
    /// Frames until collisions arm
    Arming(u32),
}

/// Snapshot handed to the HUD once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudInfo<'a> {
    pub mode: GameMode,
    pub score: u32,
    pub target: Option<&'a str>,
    /// Destroyed so far this run
    pub destroyed: usize,
    /// Values in the whole run; zero for open-ended colors mode
    pub total: usize,
    pub cracks: u32,
    pub target_swatch: Option<Rgb>,
    pub targets_left: Option<usize>,
    pub collisions: Option<CollisionStatus>,
}

pub trait Hud {
    fn display_info(&mut self, surface: &mut dyn Surface, info: &HudInfo<'_>);
}

/// HUD that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHud;

impl Hud for NoHud {
    fn display_info(&mut self, _surface: &mut dyn Surface, _info: &HudInfo<'_>) {}
}

/// Screens answered from a script: keep playing for the first
/// `checkpoints_to_continue` checkpoints, then return to the menu
#[derive(Debug, Clone, Default)]
pub struct ScriptedScreens {
    pub checkpoints_to_continue: u32,
    pub restart_on_game_over: bool,
    pub checkpoints_seen: u32,
    pub game_overs_seen: u32,
}

impl ScriptedScreens {
    pub fn new(checkpoints_to_continue: u32, restart_on_game_over: bool) -> Self {
        Self {
            checkpoints_to_continue,
            restart_on_game_over,
            ..Self::default()
        }
    }
}

impl Screens for ScriptedScreens {
    fn show_checkpoint_screen(&mut self, mode: GameMode) -> bool {
        self.checkpoints_seen += 1;
        let keep_playing = self.checkpoints_seen <= self.checkpoints_to_continue;
        log::info!(
            "Checkpoint {} in {} -> {}",
            self.checkpoints_seen,
            mode.as_str(),
            if keep_playing { "continue" } else { "menu" }
        );
        keep_playing
    }

    fn show_game_over_screen(&mut self) -> bool {
        self.game_overs_seen += 1;
        log::info!("Game over screen -> {}", if self.restart_on_game_over { "restart" } else { "menu" });
        self.restart_on_game_over
    }
}

/// Everything external a level needs
pub struct Services {
    pub audio: Box<dyn AudioSink>,
    pub text: Box<dyn TextRenderer>,
    pub screens: Box<dyn Screens>,
    pub hud: Box<dyn Hud>,
}

impl Services {
    /// Silent audio, measuring glyphs, no HUD
    pub fn headless(font_size: f32, screens: Box<dyn Screens>) -> Self {
        Self {
            audio: Box::new(SilentAudio),
            text: Box::new(BlockGlyphs::new(font_size)),
            screens,
            hud: Box::new(NoHud),
        }
    }
}
