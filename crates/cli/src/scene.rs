use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use flamenco_sync_core::SceneSelections;

/// Reads the scene's selections; a missing file means nothing is selected.
pub fn load(path: &Path) -> Result<SceneSelections> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SceneSelections::default()),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save(path: &Path, scene: &SceneSelections) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let s = toml::to_string_pretty(scene).context("serialize scene")?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
