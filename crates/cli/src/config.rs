use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use directories::ProjectDirs;
use flamenco_sync_core::CACHE_FILE_NAME;

use crate::GlobalArgs;

const SCENE_FILE_NAME: &str = "scene.toml";

#[derive(Clone, Debug)]
pub struct Config {
    pub manager_url: String,
    pub cache_file: PathBuf,
    pub scene_file: PathBuf,
    pub timeout: Duration,
}

impl Config {
    /// Fills in per-user default paths for anything not given explicitly.
    pub fn resolve(args: &GlobalArgs) -> anyhow::Result<Self> {
        let config_dir = || -> anyhow::Result<PathBuf> {
            let dirs = ProjectDirs::from("org", "Flamenco", "flamenco-sync")
                .context("no home directory to put the configuration in")?;
            Ok(dirs.config_dir().to_path_buf())
        };

        let cache_file = match &args.cache_file {
            Some(p) => p.clone(),
            None => config_dir()?.join(CACHE_FILE_NAME),
        };
        let scene_file = match &args.scene_file {
            Some(p) => p.clone(),
            None => config_dir()?.join(SCENE_FILE_NAME),
        };

        Ok(Self {
            manager_url: args.manager_url.clone(),
            cache_file,
            scene_file,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}
