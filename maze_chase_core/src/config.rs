//! Game tuning: TOML file, environment overrides, validation.

use std::{path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Size and speed of a moving creature. Defaults describe the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    pub radius: f64,
    /// World units per tick.
    pub speed: f64,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            radius: 25.0,
            speed: 10.0,
        }
    }
}

/// Monster size, speed and pursuit range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterConfig {
    pub radius: f64,
    pub speed: f64,
    /// Step bound of the pursuit search.
    pub max_chase_distance: usize,
}

impl Default for MonsterConfig {
    fn default() -> Self {
        Self {
            radius: 30.0,
            speed: 7.0,
            max_chase_distance: 5,
        }
    }
}

/// Parameters of the maze generator, in maze cells (each cell is 3x3 tiles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    pub monsters: usize,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            monsters: 4,
        }
    }
}

/// Top-level game tuning. Every key is optional in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tile_width: f64,
    pub tick_millis: u64,
    /// RNG seed. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub player: CreatureConfig,
    pub monster: MonsterConfig,
    pub key_radius: f64,
    pub maze: MazeConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_width: 200.0,
            tick_millis: 20,
            seed: None,
            player: CreatureConfig::default(),
            monster: MonsterConfig::default(),
            key_radius: 20.0,
            maze: MazeConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load config from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML config text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MAZE_CHASE_*` environment overrides.
    pub fn apply_env(mut self) -> Self {
        if let Some(seed) = read_env::<u64>("MAZE_CHASE_SEED") {
            self.seed = Some(seed);
        }
        if let Some(ms) = read_env::<u64>("MAZE_CHASE_TICK_MS") {
            self.tick_millis = ms.max(1);
        }
        if let Some(steps) = read_env::<usize>("MAZE_CHASE_MAX_CHASE") {
            self.monster.max_chase_distance = steps;
        }
        self
    }

    /// Checks the geometric preconditions collision resolution relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tile_width > 10.0) {
            return Err(ConfigError::Invalid(format!(
                "tile_width must be greater than 10, got {}",
                self.tile_width
            )));
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::Invalid("tick_millis must be positive".into()));
        }
        let half = self.tile_width / 2.0;
        for (name, radius, speed) in [
            ("player", self.player.radius, self.player.speed),
            ("monster", self.monster.radius, self.monster.speed),
        ] {
            if !(radius > 0.0 && radius <= half) {
                return Err(ConfigError::Invalid(format!(
                    "{name} radius {radius} must be in (0, {half}]"
                )));
            }
            if !(speed > 0.0 && speed < radius) {
                return Err(ConfigError::Invalid(format!(
                    "{name} speed {speed} must be in (0, {radius})"
                )));
            }
        }
        if !(self.key_radius > 0.0) {
            return Err(ConfigError::Invalid("key_radius must be positive".into()));
        }
        Ok(())
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
