//! Level errors

use thiserror::Error;

use super::mode::GameMode;

/// Errors that end a level run and return to the menu
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The mode has no values to play
    #[error("mode {} has an empty sequence", .mode.as_str())]
    EmptySequence { mode: GameMode },

    /// A group came up empty while advancing
    #[error("group {index} of mode {} is empty", .mode.as_str())]
    EmptyGroup { mode: GameMode, index: usize },

    /// Group size must be at least one
    #[error("invalid group size {0}")]
    InvalidGroupSize(usize),

    /// Colors mode has no group runner
    #[error("mode {} cannot run as a group level", .0.as_str())]
    UnsupportedMode(GameMode),
}
