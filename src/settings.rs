//! Game settings and preferences
//!
//! Persisted as JSON next to the binary. The display mode preset decides
//! every capacity the simulation allocates up front.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Display preset (regular monitor or large interactive board)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayMode {
    #[default]
    Default,
    QBoard,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Default => "DEFAULT",
            DisplayMode::QBoard => "QBOARD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" => Some(DisplayMode::Default),
            "qboard" | "q-board" => Some(DisplayMode::QBoard),
            _ => None,
        }
    }

    /// Particle pool capacity
    pub fn max_particles(&self) -> usize {
        match self {
            DisplayMode::Default => 100,
            DisplayMode::QBoard => 150,
        }
    }

    /// Explosion collection capacity
    pub fn max_explosions(&self) -> usize {
        match self {
            DisplayMode::Default => 5,
            DisplayMode::QBoard => 8,
        }
    }

    /// Swirl particles around the center piece
    pub fn max_swirl_particles(&self) -> usize {
        match self {
            DisplayMode::Default => 30,
            DisplayMode::QBoard => 50,
        }
    }

    /// Radius of the colors-mode mother dot
    pub fn mother_radius(&self) -> f32 {
        match self {
            DisplayMode::Default => 90.0,
            DisplayMode::QBoard => 120.0,
        }
    }

    pub fn font_size_regular(&self) -> f32 {
        match self {
            DisplayMode::Default => 24.0,
            DisplayMode::QBoard => 30.0,
        }
    }

    pub fn font_size_large(&self) -> f32 {
        match self {
            DisplayMode::Default => 48.0,
            DisplayMode::QBoard => 60.0,
        }
    }

    /// Object collisions are resolved every Nth frame
    pub fn collision_check_frequency(&self) -> u64 {
        match self {
            DisplayMode::Default => 1,
            DisplayMode::QBoard => 2,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Display preset
    pub display_mode: DisplayMode,

    // === Visual Effects ===
    /// Screen shake on misclicks and wrong taps
    pub screen_shake: bool,
    /// Particle effects (bursts, shards, collision sparks)
    pub particles: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Spoken target volume (0.0 - 1.0)
    pub voice_volume: f32,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,

    // === Simulation ===
    /// Override for the collision check frequency of the display mode
    pub collision_check_frequency: Option<u64>,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Default,

            screen_shake: true,
            particles: true,

            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            voice_volume: 1.0,

            reduced_motion: false,

            collision_check_frequency: None,
            seed: None,
        }
    }
}

impl Settings {
    /// Settings for a display mode with every other field at its default
    pub fn for_display(display_mode: DisplayMode) -> Self {
        Self {
            display_mode,
            ..Self::default()
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.display_mode.max_particles()
        }
    }

    pub fn max_explosions(&self) -> usize {
        self.display_mode.max_explosions()
    }

    pub fn collision_check_frequency(&self) -> u64 {
        self.collision_check_frequency
            .unwrap_or_else(|| self.display_mode.collision_check_frequency())
            .max(1)
    }

    /// Default file name, resolved relative to the working directory
    pub const FILE_NAME: &'static str = "settings.json";

    /// Load settings, falling back to defaults on a missing or malformed file
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&json)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
