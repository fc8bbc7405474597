// User configuration, persisted as TOML in the per-user config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::msp_board::Difficulty;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub use_question_marks: bool, // right click cycles none/flag/?
    pub ascii_icons: bool,        // fallback glyphs for limited terminals
}

/// Config file location, e.g. ~/.config/mspro/mspro.toml on Linux.
/// Falls back to the current directory when no home directory is known.
pub fn config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem().and_then(|s| s.to_str())?.to_string();
    if let Some(proj) = ProjectDirs::from("com", "mspro", &name) {
        let mut path = proj.config_dir().to_path_buf();
        path.push(format!("{}.toml", name));
        Some(path)
    } else {
        let mut path = env::current_dir().ok()?;
        path.push(format!("{}.toml", name));
        Some(path)
    }
}

pub fn parse_config(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(s)
}

/// Load configuration from disk, writing defaults when the file is missing or unreadable
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if path.exists() {
        match fs::read_to_string(&path).map(|s| parse_config(&s)) {
            Ok(Ok(cfg)) => {
                debug!(path = %path.display(), "config loaded");
                return cfg;
            }
            Ok(Err(e)) => warn!(path = %path.display(), error = %e, "config unreadable, using defaults"),
            Err(e) => warn!(path = %path.display(), error = %e, "config could not be read"),
        }
    }
    let cfg = Config::default();
    save_config(&cfg);
    cfg
}

pub fn save_config(cfg: &Config) {
    let Some(path) = config_path() else {
        return;
    };
    let s = match toml::to_string(cfg) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "config could not be serialized");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %e, "config directory could not be created");
            return;
        }
    }
    match fs::write(&path, s) {
        Ok(()) => debug!(path = %path.display(), "config saved"),
        Err(e) => warn!(path = %path.display(), error = %e, "config could not be written"),
    }
}
