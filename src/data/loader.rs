// ============================================================
// Layer 4 — Parallel Text Loader
// ============================================================
// Reads one split of the corpus from two line-aligned files:
//
//   <data_dir>/<name><source_ext>    e.g. data/train.x
//   <data_dir>/<name><target_ext>    e.g. data/train.y
//
// Line N of the source file translates to line N of the target
// file. Both files must exist and have the same number of lines,
// otherwise loading fails before anything is tokenised.
//
// Line terminators ("\n" and "\r\n") are dropped here. They never
// become vocabulary symbols and do not count towards pad lengths,
// unlike a reader that keeps the trailing '\n' on every line.

use anyhow::{bail, ensure, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::traits::ParallelCorpusSource;

/// The two files making up one split.
#[derive(Debug, Clone)]
pub struct ParallelTextFiles {
    source: PathBuf,
    target: PathBuf,
}

impl ParallelTextFiles {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self { source: source.into(), target: target.into() }
    }

    /// Resolve `<dir>/<name><ext>` for both sides of a split.
    pub fn for_split(dir: impl AsRef<Path>, name: &str, source_ext: &str, target_ext: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(format!("{name}{source_ext}")),
            dir.join(format!("{name}{target_ext}")),
        )
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl ParallelCorpusSource for ParallelTextFiles {
    fn describe(&self) -> String {
        format!("{} / {}", self.source.display(), self.target.display())
    }

    fn read_pairs(&self) -> Result<Vec<(String, String)>> {
        // Check both up front so a missing target is reported even
        // when the source is huge.
        ensure!(self.source.exists(), "Source file '{}' does not exist", self.source.display());
        ensure!(self.target.exists(), "Target file '{}' does not exist", self.target.display());

        tracing::info!("Loading source file from: {}", self.source.display());
        let source_lines = read_lines(&self.source)?;
        tracing::info!("Loading target file from: {}", self.target.display());
        let target_lines = read_lines(&self.target)?;

        if source_lines.len() != target_lines.len() {
            bail!(
                "Misaligned split: '{}' has {} lines but '{}' has {}",
                self.source.display(),
                source_lines.len(),
                self.target.display(),
                target_lines.len()
            );
        }

        Ok(source_lines.into_iter().zip(target_lines).collect())
    }
}

/// Split a file into lines without their terminators; a trailing
/// '\n' is not part of the line and is never tokenised.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}
