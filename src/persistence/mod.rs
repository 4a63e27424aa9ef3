//! Level progress persistence
//!
//! A plain-text marker file. A line containing `<sequence>_completed` marks
//! that sequence as done; the shapes sequence is the one that matters to
//! level flow.

use std::io;
use std::path::{Path, PathBuf};

/// Default marker file name
pub const PROGRESS_FILE: &str = "level_progress.txt";
pub const SHAPES: &str = "shapes";

#[derive(Debug, Clone)]
pub struct ProgressMarker {
    path: PathBuf,
}

impl ProgressMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the sequence is recorded as completed
    pub fn is_completed(&self, sequence: &str) -> io::Result<bool> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let marker = marker(sequence);
                Ok(content.lines().any(|line| line.contains(&marker)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Record the sequence as completed; idempotent
    pub fn mark_completed(&self, sequence: &str) -> io::Result<()> {
        if self.is_completed(sequence)? {
            return Ok(());
        }
        let mut content = match std::fs::read_to_string(&self.path) {
            Ok(existing) => existing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&marker(sequence));
        content.push('\n');
        std::fs::write(&self.path, content)?;
        log::info!("Recorded {} at {}", marker(sequence), self.path.display());
        Ok(())
    }
}

fn marker(sequence: &str) -> String {
    format!("{sequence}_completed")
}
