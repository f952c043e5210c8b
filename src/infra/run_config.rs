// ============================================================
// Layer 6 — Run Configuration Store
// ============================================================
// Saves the resolved TrainConfig as pretty JSON so a run can be
// repeated later with `rerun --config <dir>/train_config.json`.
//
// Nothing else is persisted: model weights are not saved.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;

pub const CONFIG_FILE: &str = "train_config.json";

/// Write `cfg` to `<dir>/train_config.json`, creating `dir` if needed.
pub fn save_run_config(dir: impl AsRef<Path>, cfg: &TrainConfig) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;

    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

    tracing::debug!("Saved training config to '{}'", path.display());
    Ok(path)
}

/// Read a config previously written by `save_run_config`.
pub fn load_run_config(path: impl AsRef<Path>) -> Result<TrainConfig> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Malformed config in '{}'", path.display()))
}
