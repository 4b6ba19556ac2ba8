//! High-score persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Where the best score survives between runs.
pub trait ScoreStore: Send + Sync + 'static {
    fn high_score(&self) -> Result<i32, StoreError>;
    fn set_high_score(&mut self, score: i32) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    high_score: i32,
}

impl ScoreStore for MemoryScoreStore {
    fn high_score(&self) -> Result<i32, StoreError> {
        Ok(self.high_score)
    }

    fn set_high_score(&mut self, score: i32) -> Result<(), StoreError> {
        self.high_score = score;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScoreFile {
    high_score: i32,
}

/// High score kept in a small RON file: `(high_score: 1234)`.
/// A missing file reads as zero.
#[derive(Debug, Clone)]
pub struct RonScoreStore {
    path: PathBuf,
}

impl RonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for RonScoreStore {
    fn high_score(&self) -> Result<i32, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let file: ScoreFile = ron::from_str(&contents).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(file.high_score)
    }

    fn set_high_score(&mut self, score: i32) -> Result<(), StoreError> {
        let contents = ron::ser::to_string_pretty(&ScoreFile { high_score: score }, ron::ser::PrettyConfig::default())
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}
