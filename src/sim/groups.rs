//! Group and target tracking for the group modes
//!
//! The mode's sequence is cut into groups. Within a group values are spawned in
//! order and must be destroyed in order: the target is always the head of the
//! remaining list.

use std::collections::VecDeque;

use super::error::LevelError;
use super::mode::GameMode;

/// What happened when the current group was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAdvance {
    /// The next group is loaded
    Next,
    /// That was the last group
    Finished,
}

#[derive(Debug, Clone)]
pub struct GroupTracker {
    mode: GameMode,
    groups: Vec<Vec<String>>,
    index: usize,
    to_spawn: VecDeque<String>,
    remaining: Vec<String>,
    spawned: usize,
    destroyed: usize,
    /// Destroyed in groups already closed
    total_destroyed: usize,
}

impl GroupTracker {
    pub fn new(mode: GameMode, sequence: Vec<String>, group_size: usize) -> Result<Self, LevelError> {
        if group_size == 0 {
            return Err(LevelError::InvalidGroupSize(group_size));
        }
        if sequence.is_empty() {
            return Err(LevelError::EmptySequence { mode });
        }
        let groups: Vec<Vec<String>> = sequence.chunks(group_size).map(<[String]>::to_vec).collect();

        let mut tracker = Self {
            mode,
            groups,
            index: 0,
            to_spawn: VecDeque::new(),
            remaining: Vec::new(),
            spawned: 0,
            destroyed: 0,
            total_destroyed: 0,
        };
        tracker.load_group()?;
        Ok(tracker)
    }

    /// Current target: head of the remaining list
    pub fn target(&self) -> Option<&str> {
        self.remaining.first().map(String::as_str)
    }

    pub fn is_target(&self, value: &str) -> bool {
        self.target() == Some(value)
    }

    /// Next value to spawn, if the group still has queued ones
    pub fn next_spawn(&mut self) -> Option<String> {
        let value = self.to_spawn.pop_front()?;
        self.spawned += 1;
        Some(value)
    }

    pub fn record_destroyed(&mut self, value: &str) {
        self.destroyed += 1;
        if let Some(pos) = self.remaining.iter().position(|v| v == value) {
            self.remaining.remove(pos);
        }
    }

    /// Screen, spawn queue and target list are all empty
    pub fn is_group_complete(&self, on_screen: usize) -> bool {
        on_screen == 0 && self.to_spawn.is_empty() && self.remaining.is_empty()
    }

    /// Close the current group and load the next one
    pub fn advance(&mut self) -> Result<GroupAdvance, LevelError> {
        self.total_destroyed += self.destroyed;
        self.index += 1;
        if self.index >= self.groups.len() {
            self.destroyed = 0;
            return Ok(GroupAdvance::Finished);
        }
        self.load_group()?;
        Ok(GroupAdvance::Next)
    }

    /// Destructions across the whole run
    pub fn overall_destroyed(&self) -> usize {
        self.total_destroyed + self.destroyed
    }

    pub fn group_index(&self) -> usize {
        self.index
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn pending_spawns(&self) -> usize {
        self.to_spawn.len()
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Number of values across all groups
    pub fn total_values(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    fn load_group(&mut self) -> Result<(), LevelError> {
        let group = &self.groups[self.index];
        if group.is_empty() {
            return Err(LevelError::EmptyGroup {
                mode: self.mode,
                index: self.index,
            });
        }
        self.to_spawn = group.iter().cloned().collect();
        self.remaining = group.clone();
        self.spawned = 0;
        self.destroyed = 0;
        log::info!(
            "Group {}/{} of {}: {:?}",
            self.index + 1,
            self.groups.len(),
            self.mode.as_str(),
            self.remaining
        );
        Ok(())
    }
}
