//! Configuration loading and parsing.
//!
//! `whisker.toml` configures the host: which maze to load (or the generator
//! parameters when no file is given), how to spawn the bot, and the tick
//! interval driving the movement state machine. Every field has a default,
//! so a missing or unparsable file degrades to a runnable configuration.
//! Unknown fields are ignored to allow forward evolution.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

/// Tick intervals are clamped into this range; a zero interval would spin
/// the event loop and anything beyond a second is indistinguishable from a
/// stalled engine.
pub const MIN_TICK_MS: u64 = 1;
pub const MAX_TICK_MS: u64 = 1000;

#[derive(Debug, Deserialize, Clone)]
pub struct MazeConfig {
    /// Maze file to load (`map` or `num`, auto-detected). When absent a
    /// maze is generated from the fields below.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "MazeConfig::default_width")]
    pub width: i32,
    #[serde(default = "MazeConfig::default_height")]
    pub height: i32,
    #[serde(default = "MazeConfig::default_seed")]
    pub seed: u32,
}

impl MazeConfig {
    const fn default_width() -> i32 {
        16
    }
    const fn default_height() -> i32 {
        16
    }
    const fn default_seed() -> u32 {
        1
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            file: None,
            width: Self::default_width(),
            height: Self::default_height(),
            seed: Self::default_seed(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotConfig {
    /// Command line used to spawn the bot process.
    #[serde(default)]
    pub command: Option<String>,
    /// Working directory for the bot; defaults to the host's.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimConfig {
    #[serde(default = "SimConfig::default_tick_ms")]
    pub tick_ms: u64,
}

impl SimConfig {
    const fn default_tick_ms() -> u64 {
        50
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub maze: MazeConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

impl Config {
    /// The tick interval, clamped to `[MIN_TICK_MS, MAX_TICK_MS]`.
    pub fn tick_interval(&self) -> Duration {
        let raw = self.file.sim.tick_ms;
        let clamped = raw.clamp(MIN_TICK_MS, MAX_TICK_MS);
        if clamped != raw {
            warn!(target: "config", raw, clamped, "tick_ms_clamped");
        }
        Duration::from_millis(clamped)
    }
}

/// Best-effort config path: prefer `whisker.toml` in the working directory,
/// then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("whisker.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("whisker").join("whisker.toml");
    }
    // Final fallback relative filename.
    PathBuf::from("whisker.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "config", path = %path.display(), "config_loaded");
                Ok(Config {
                    raw: Some(content),
                    file,
                })
            }
            Err(e) => {
                // Fall back to defaults rather than refusing to start.
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.maze.width, 16);
        assert_eq!(cfg.file.maze.height, 16);
        assert_eq!(cfg.file.maze.seed, 1);
        assert!(cfg.file.maze.file.is_none());
        assert!(cfg.file.bot.command.is_none());
        assert_eq!(cfg.file.sim.tick_ms, 50);
    }

    #[test]
    fn parses_all_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            concat!(
                "[maze]\nfile = \"contest.num\"\nwidth = 8\nheight = 12\nseed = 99\n",
                "[bot]\ncommand = \"python3 solver.py\"\nworking_dir = \"bots\"\n",
                "[sim]\ntick_ms = 10\n",
            ),
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.maze.file.as_deref(), Some("contest.num".as_ref()));
        assert_eq!(cfg.file.maze.width, 8);
        assert_eq!(cfg.file.maze.height, 12);
        assert_eq!(cfg.file.maze.seed, 99);
        assert_eq!(cfg.file.bot.command.as_deref(), Some("python3 solver.py"));
        assert_eq!(cfg.file.bot.working_dir.as_deref(), Some("bots".as_ref()));
        assert_eq!(cfg.tick_interval(), Duration::from_millis(10));
        assert!(cfg.raw.is_some());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[maze]\nseed = 7\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.maze.seed, 7);
        assert_eq!(cfg.file.maze.width, 16);
        assert_eq!(cfg.file.sim.tick_ms, 50);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "this is not toml [[[").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.maze.width, 16);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn tick_interval_is_clamped() {
        let mut cfg = Config::default();
        cfg.file.sim.tick_ms = 0;
        assert_eq!(cfg.tick_interval(), Duration::from_millis(MIN_TICK_MS));
        cfg.file.sim.tick_ms = 10_000;
        assert_eq!(cfg.tick_interval(), Duration::from_millis(MAX_TICK_MS));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[maze]\nwidth = 5\nfancy_new_option = true\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.maze.width, 5);
    }
}
