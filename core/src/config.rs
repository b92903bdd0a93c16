//! Configuration document consumed by the simulation.
//!
//! Every field is optional in the serialized form; anything missing falls back
//! to the defaults listed in [`GameConfig::default`].

use std::{collections::BTreeMap, fmt, time::Duration};

use log::warn;
use serde::{
    de::{self, Deserializer, MapAccess, Visitor},
    Deserialize,
};

use crate::{BoundaryMode, FoodKind, FoodWeights, LevelInfo, LevelNumber, Portal, Position};

const DEFAULT_GRID_SIZE: u32 = 20;
const DEFAULT_SNAKE_LENGTH: u32 = 3;
const DEFAULT_GAME_SPEED_MS: u64 = 150;
const DEFAULT_SPEED_STEP_MS: u64 = 15;
const DEFAULT_MIN_SPEED_MS: u64 = 70;
const DEFAULT_MAX_SPEED_MS: u64 = 300;
const DEFAULT_SLOW_DOWN_STEP_MS: u64 = 30;
const DEFAULT_TRANSITION_DELAY_MS: u64 = 2_500;
const MIN_GRID_SIZE: u32 = 2;

/// Errors raised while parsing a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("could not parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The TOML document could not be parsed.
    #[error("could not parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Obstacle settings for the global defaults or a single level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Number of obstacles generated on level entry.
    pub count: u32,
}

/// Points and cadence knobs applied when food is eaten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Points for [`FoodKind::Normal`].
    pub normal_points: u32,
    /// Points for [`FoodKind::Big`].
    pub big_points: u32,
    /// Points for [`FoodKind::Slow`].
    pub slow_points: u32,
    /// The snake speeds up each time the score crosses a multiple of this value.
    pub speed_up_every: u32,
    /// The colour theme rotates each time the score crosses a multiple of this value.
    pub theme_every: u32,
    /// Number of colour themes the palette cycles through.
    pub theme_count: u32,
}

impl ScoringConfig {
    /// Points awarded for eating the provided kind of food.
    #[must_use]
    pub const fn points_for(&self, kind: FoodKind) -> u32 {
        match kind {
            FoodKind::Normal => self.normal_points,
            FoodKind::Big => self.big_points,
            FoodKind::Slow => self.slow_points,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            normal_points: 10,
            big_points: 20,
            slow_points: 10,
            speed_up_every: 50,
            theme_every: 100,
            theme_count: 7,
        }
    }
}

/// Per-level overrides. Absent fields inherit the global defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelConfig {
    /// Milliseconds per tick when the level starts.
    pub game_speed: Option<u64>,
    /// Obstacle settings.
    pub obstacles: Option<ObstacleConfig>,
    /// Portal pairs placed on the level.
    pub portals: Option<Vec<Portal>>,
    /// Food kind weights.
    pub food_weights: Option<FoodWeights>,
    /// Boundary policy.
    pub boundary_mode: Option<BoundaryMode>,
    /// Optional time box in seconds.
    pub time_limit_seconds: Option<u64>,
    /// Display name.
    pub name: Option<String>,
    /// Display description.
    pub description: Option<String>,
}

/// Complete configuration document for a session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Side length of the square grid.
    pub grid_size: u32,
    /// Number of segments the snake starts with.
    pub initial_snake_length: u32,
    /// Base milliseconds per tick.
    pub game_speed: u64,
    /// Milliseconds removed from the interval on each speed-up.
    pub speed_step: u64,
    /// Smallest interval a speed-up may reach.
    pub min_speed: u64,
    /// Largest interval slow food may reach.
    pub max_speed: u64,
    /// Milliseconds added to the interval by slow food.
    pub slow_down_step: u64,
    /// Global food kind weights.
    pub food_weights: FoodWeights,
    /// Global obstacle settings.
    pub obstacles: ObstacleConfig,
    /// Global portal pairs.
    pub portals: Vec<Portal>,
    /// Global boundary policy.
    pub boundary_mode: BoundaryMode,
    /// Level definitions keyed by level number.
    #[serde(deserialize_with = "numbered")]
    pub levels: BTreeMap<LevelNumber, LevelConfig>,
    /// Level the session starts on.
    pub default_level: LevelNumber,
    /// Cumulative score required to unlock each level.
    #[serde(deserialize_with = "numbered")]
    pub level_up_scores: BTreeMap<LevelNumber, u32>,
    /// Points and cadence knobs.
    pub scoring: ScoringConfig,
    /// Milliseconds the level-complete celebration lasts before the next level.
    pub transition_delay_ms: u64,
    /// Seed for entity placement; a fixed default is used when absent.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            initial_snake_length: DEFAULT_SNAKE_LENGTH,
            game_speed: DEFAULT_GAME_SPEED_MS,
            speed_step: DEFAULT_SPEED_STEP_MS,
            min_speed: DEFAULT_MIN_SPEED_MS,
            max_speed: DEFAULT_MAX_SPEED_MS,
            slow_down_step: DEFAULT_SLOW_DOWN_STEP_MS,
            food_weights: FoodWeights::default(),
            obstacles: ObstacleConfig::default(),
            portals: Vec::new(),
            boundary_mode: BoundaryMode::Die,
            levels: default_levels(),
            default_level: 1,
            level_up_scores: BTreeMap::from([(2, 300), (3, 800)]),
            scoring: ScoringConfig::default(),
            transition_delay_ms: DEFAULT_TRANSITION_DELAY_MS,
            seed: None,
        }
    }
}

fn default_levels() -> BTreeMap<LevelNumber, LevelConfig> {
    BTreeMap::from([
        (
            1,
            LevelConfig {
                game_speed: Some(150),
                name: Some("Classic".to_owned()),
                description: Some("Open field, walls are deadly".to_owned()),
                ..LevelConfig::default()
            },
        ),
        (
            2,
            LevelConfig {
                game_speed: Some(130),
                obstacles: Some(ObstacleConfig { count: 8 }),
                name: Some("Rockfall".to_owned()),
                description: Some("Rocks are scattered across the field".to_owned()),
                ..LevelConfig::default()
            },
        ),
        (
            3,
            LevelConfig {
                game_speed: Some(110),
                obstacles: Some(ObstacleConfig { count: 12 }),
                portals: Some(vec![
                    Portal::new(Position::new(2, 2), Position::new(17, 17)),
                    Portal::new(Position::new(2, 17), Position::new(17, 2)),
                ]),
                food_weights: Some(FoodWeights::new(0.6, 0.25, 0.15)),
                name: Some("Wormholes".to_owned()),
                description: Some("Linked portals fold the field".to_owned()),
                ..LevelConfig::default()
            },
        ),
    ])
}

/// Fully merged settings of a single level.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLevel {
    /// Display metadata.
    pub info: LevelInfo,
    /// Interval between ticks when the level starts.
    pub tick_interval: Duration,
    /// Number of obstacles to generate.
    pub obstacle_count: u32,
    /// Portals that fit inside the grid.
    pub portals: Vec<Portal>,
    /// Food kind weights.
    pub food_weights: FoodWeights,
    /// Boundary policy.
    pub boundary_mode: BoundaryMode,
    /// Optional time box.
    pub time_limit: Option<Duration>,
}

impl GameConfig {
    /// Parses a JSON configuration document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parses a TOML configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Clamps values that would make the simulation meaningless and warns
    /// about suspicious but tolerated settings.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.grid_size < MIN_GRID_SIZE {
            warn!(
                "grid size {} is too small; using {MIN_GRID_SIZE}",
                self.grid_size
            );
            self.grid_size = MIN_GRID_SIZE;
        }

        let length = self.initial_snake_length.clamp(1, self.grid_size);
        if length != self.initial_snake_length {
            warn!(
                "initial snake length {} does not fit the grid; using {length}",
                self.initial_snake_length
            );
            self.initial_snake_length = length;
        }

        if self.min_speed > self.max_speed {
            warn!(
                "minSpeed {} exceeds maxSpeed {}; swapping them",
                self.min_speed, self.max_speed
            );
            std::mem::swap(&mut self.min_speed, &mut self.max_speed);
        }

        if !self.food_weights.is_normalized() {
            warn!(
                "food weights {:?} do not form a distribution; the slow branch absorbs the remainder",
                self.food_weights
            );
        }
        for (number, level) in &self.levels {
            if let Some(weights) = level.food_weights {
                if !weights.is_normalized() {
                    warn!("food weights {weights:?} of level {number} do not form a distribution");
                }
            }
        }

        self
    }

    /// Whether the level exists in this configuration.
    ///
    /// The default level always exists so that a document without a `levels`
    /// table is still playable.
    #[must_use]
    pub fn defines_level(&self, level: LevelNumber) -> bool {
        self.levels.contains_key(&level) || level == self.default_level
    }

    /// Merges the overrides of `level` with the global defaults.
    #[must_use]
    pub fn resolve_level(&self, level: LevelNumber) -> ResolvedLevel {
        let overrides = self.levels.get(&level).cloned().unwrap_or_default();
        let grid_size = i32::try_from(self.grid_size).unwrap_or(i32::MAX);
        let inside = |position: Position| {
            (0..grid_size).contains(&position.row) && (0..grid_size).contains(&position.col)
        };

        let portals: Vec<Portal> = overrides
            .portals
            .unwrap_or_else(|| self.portals.clone())
            .into_iter()
            .filter(|portal| {
                let fits = inside(portal.a) && inside(portal.b) && portal.a != portal.b;
                if !fits {
                    warn!("dropping portal {portal:?} on level {level}: endpoints do not fit the grid");
                }
                fits
            })
            .collect();

        ResolvedLevel {
            info: LevelInfo {
                number: level,
                name: overrides.name.unwrap_or_else(|| format!("Level {level}")),
                description: overrides.description.unwrap_or_default(),
            },
            tick_interval: Duration::from_millis(overrides.game_speed.unwrap_or(self.game_speed)),
            obstacle_count: overrides.obstacles.unwrap_or(self.obstacles).count,
            portals,
            food_weights: overrides.food_weights.unwrap_or(self.food_weights),
            boundary_mode: overrides.boundary_mode.unwrap_or(self.boundary_mode),
            time_limit: overrides.time_limit_seconds.map(Duration::from_secs),
        }
    }
}

/// Deserializes a map whose keys are level numbers written as strings, which
/// is the only form JSON objects and TOML tables can express.
fn numbered<'de, D, V>(deserializer: D) -> Result<BTreeMap<LevelNumber, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct NumberedVisitor<V>(std::marker::PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for NumberedVisitor<V> {
        type Value = BTreeMap<LevelNumber, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map keyed by level number")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut levels = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                let number = key.trim().parse::<LevelNumber>().map_err(|_| {
                    de::Error::custom(format!("level key `{key}` is not a level number"))
                })?;
                if levels.insert(number, value).is_some() {
                    return Err(de::Error::custom(format!("level {number} is defined twice")));
                }
            }
            Ok(levels)
        }
    }

    deserializer.deserialize_map(NumberedVisitor(std::marker::PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = GameConfig::from_json_str("{}").expect("empty object parses");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn json_fields_use_camel_case_and_numbered_levels() {
        let config = GameConfig::from_json_str(
            r#"{
                "gridSize": 12,
                "initialSnakeLength": 4,
                "gameSpeed": 200,
                "foodWeights": { "normal": 0.5, "big": 0.3, "slow": 0.2 },
                "obstacles": { "count": 3 },
                "levels": {
                    "1": { "name": "Warmup" },
                    "2": { "gameSpeed": 120, "boundaryMode": "wrap", "timeLimitSeconds": 60 }
                },
                "levelUpScores": { "2": 50 },
                "seed": 7
            }"#,
        )
        .expect("document parses");

        assert_eq!(config.grid_size, 12);
        assert_eq!(config.initial_snake_length, 4);
        assert_eq!(config.level_up_scores.get(&2), Some(&50));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.speed_step, 15, "unspecified fields keep defaults");

        let first = config.resolve_level(1);
        assert_eq!(first.info.name, "Warmup");
        assert_eq!(first.tick_interval, Duration::from_millis(200));
        assert_eq!(first.obstacle_count, 3);

        let second = config.resolve_level(2);
        assert_eq!(second.info.name, "Level 2");
        assert_eq!(second.boundary_mode, BoundaryMode::Wrap);
        assert_eq!(second.time_limit, Some(Duration::from_secs(60)));
        assert_eq!(second.food_weights, FoodWeights::new(0.5, 0.3, 0.2));
    }

    #[test]
    fn toml_document_parses_levels() {
        let config = GameConfig::from_toml_str(
            r#"
                gridSize = 16
                boundaryMode = "wrap"

                [levels.1]
                name = "Loop"

                [levels.2]
                gameSpeed = 90
                portals = [{ a = { row = 1, col = 1 }, b = { row = 14, col = 14 } }]
            "#,
        )
        .expect("toml parses");

        assert_eq!(config.grid_size, 16);
        assert_eq!(config.resolve_level(1).boundary_mode, BoundaryMode::Wrap);
        assert_eq!(config.resolve_level(2).portals.len(), 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            GameConfig::from_json_str("{ \"gridSize\": "),
            Err(ConfigError::Json(_))
        ));
        assert!(GameConfig::from_json_str(r#"{ "levels": { "two": {} } }"#).is_err());
    }

    #[test]
    fn portals_outside_the_grid_are_dropped() {
        let config = GameConfig {
            grid_size: 10,
            ..GameConfig::default()
        };
        assert!(
            config.resolve_level(3).portals.is_empty(),
            "default wormholes sit at row 17 which a 10x10 grid cannot hold"
        );
    }

    #[test]
    fn sanitizing_clamps_degenerate_values() {
        let config = GameConfig {
            grid_size: 1,
            initial_snake_length: 9,
            min_speed: 400,
            max_speed: 100,
            ..GameConfig::default()
        }
        .sanitized();

        assert_eq!(config.grid_size, 2);
        assert_eq!(config.initial_snake_length, 2);
        assert_eq!((config.min_speed, config.max_speed), (100, 400));
    }

    #[test]
    fn default_level_is_always_defined() {
        let config = GameConfig {
            levels: BTreeMap::new(),
            default_level: 4,
            ..GameConfig::default()
        };
        assert!(config.defines_level(4));
        assert!(!config.defines_level(5));
    }
}
