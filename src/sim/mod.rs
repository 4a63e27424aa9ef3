//! Frame-stepped simulation module
//!
//! All gameplay logic lives here:
//! - Fixed per-frame motion, no wall-clock time
//! - Seeded RNG streams, one per subsystem
//! - Rendering and audio only through the `Surface` and `Services` seams

pub mod center_piece;
pub mod checkpoint;
pub mod collision;
pub mod colors;
pub mod context;
pub mod effects;
pub mod error;
pub mod groups;
pub mod level;
pub mod mode;
pub mod objects;
pub mod particles;
pub mod rng;
pub mod services;
pub mod shatter;

pub use center_piece::CenterPieceManager;
pub use checkpoint::CheckpointTracker;
pub use collision::{Body, CollisionResult, CollisionThrottle, resolve_elastic, resolve_swap};
pub use colors::{ColorsLevelRunner, ColorsPhase, Dot, PALETTE, PaletteColor};
pub use context::SimulationContext;
pub use effects::{EvictionPolicy, Explosion, ExplosionSet, Flame, FlameSet, Starfield};
pub use error::LevelError;
pub use groups::{GroupAdvance, GroupTracker};
pub use level::{Completion, LevelPhase, LevelRunner, LevelStatus};
pub use mode::GameMode;
pub use objects::{FallingObject, FallingObjectSet, HitTest};
pub use particles::{Particle, ParticleHandle, ParticleManager};
pub use services::{CollisionStatus, Hud, HudInfo, NoHud, Screens, ScriptedScreens, Services};
pub use shatter::{GlassShatterManager, ShatterPhase};
