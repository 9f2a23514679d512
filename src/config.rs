// All tunable simulation constants in one place.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

// Herbivore
pub const HERBIVORE_SPEED: u32 = 1;
pub const HERBIVORE_INITIAL_HP: i32 = 70;
pub const HERBIVORE_FOOD_VALUE: i32 = 20;

// Predator
pub const PREDATOR_SPEED: u32 = 2;
pub const PREDATOR_INITIAL_HP: i32 = 100;
pub const PREDATOR_ATTACK_DAMAGE: i32 = 30;
pub const PREDATOR_FOOD_VALUE: i32 = 30;
pub const PREDATOR_ESCAPE_CHANCE: f64 = 0.3; // chance the prey gets away

// Board
pub const BOARD_WIDTH: i32 = 10;
pub const BOARD_HEIGHT: i32 = 10;

// Initial population
pub const INITIAL_HERBIVORES: usize = 3;
pub const INITIAL_PREDATORS: usize = 2;
pub const INITIAL_GRASS: usize = 4;
pub const INITIAL_STONES: usize = 3;

// Per-turn economy
pub const MIN_GRASS: usize = 4;
pub const GRASS_SPAWN_CHANCE: f64 = 0.3;
pub const HUNGER_DAMAGE: i32 = 5;

// Run loop
pub const MAX_TURNS: u64 = 100;
pub const TURN_DELAY_MS: u64 = 1000;
pub const HISTORY_RETENTION: usize = 2;
pub const DEFAULT_SEED: u64 = 42;

/// Per-species parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub speed: u32,
    pub initial_hp: i32,
    pub food_value: i32,
    #[serde(default)]
    pub attack_damage: i32,
    #[serde(default)]
    pub escape_chance: f64,
}

impl SpeciesConfig {
    pub fn herbivore() -> Self {
        Self {
            speed: HERBIVORE_SPEED,
            initial_hp: HERBIVORE_INITIAL_HP,
            food_value: HERBIVORE_FOOD_VALUE,
            attack_damage: 0,
            escape_chance: 0.0,
        }
    }

    pub fn predator() -> Self {
        Self {
            speed: PREDATOR_SPEED,
            initial_hp: PREDATOR_INITIAL_HP,
            food_value: PREDATOR_FOOD_VALUE,
            attack_damage: PREDATOR_ATTACK_DAMAGE,
            escape_chance: PREDATOR_ESCAPE_CHANCE,
        }
    }

    fn validate(&self, species: &str) -> SimResult<()> {
        if self.speed == 0 {
            return Err(SimError::Configuration(format!("{species} speed must be positive")));
        }
        if self.initial_hp <= 0 {
            return Err(SimError::Configuration(format!(
                "{species} initial_hp must be positive, got {}",
                self.initial_hp
            )));
        }
        if self.food_value < 0 || self.attack_damage < 0 {
            return Err(SimError::Configuration(format!(
                "{species} food_value and attack_damage must not be negative"
            )));
        }
        if !(0.0..=1.0).contains(&self.escape_chance) {
            return Err(SimError::Configuration(format!(
                "{species} escape_chance {} must be between 0.0 and 1.0",
                self.escape_chance
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "CreatureOverrides")]
pub struct CreatureConfig {
    pub herbivore: SpeciesConfig,
    pub predator: SpeciesConfig,
}

/// Per-species fields as they appear in a JSON file. Anything left out keeps
/// that species' default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpeciesOverrides {
    speed: Option<u32>,
    initial_hp: Option<i32>,
    food_value: Option<i32>,
    attack_damage: Option<i32>,
    escape_chance: Option<f64>,
}

impl SpeciesOverrides {
    fn apply(self, base: SpeciesConfig) -> SpeciesConfig {
        SpeciesConfig {
            speed: self.speed.unwrap_or(base.speed),
            initial_hp: self.initial_hp.unwrap_or(base.initial_hp),
            food_value: self.food_value.unwrap_or(base.food_value),
            attack_damage: self.attack_damage.unwrap_or(base.attack_damage),
            escape_chance: self.escape_chance.unwrap_or(base.escape_chance),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreatureOverrides {
    herbivore: SpeciesOverrides,
    predator: SpeciesOverrides,
}

impl From<CreatureOverrides> for CreatureConfig {
    fn from(overrides: CreatureOverrides) -> Self {
        Self {
            herbivore: overrides.herbivore.apply(SpeciesConfig::herbivore()),
            predator: overrides.predator.apply(SpeciesConfig::predator()),
        }
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            herbivore: SpeciesConfig::herbivore(),
            predator: SpeciesConfig::predator(),
        }
    }
}

/// Parameters for one simulation run. Any field missing from a JSON
/// override falls back to the constants above.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub board_width: i32,
    pub board_height: i32,
    pub initial_herbivores: usize,
    pub initial_predators: usize,
    pub initial_grass: usize,
    pub initial_stones: usize,
    pub min_grass: usize,
    pub grass_spawn_chance: f64,
    pub hunger_damage: i32,
    pub max_turns: u64,
    pub turn_delay_ms: u64,
    /// Number of most recent turns kept in the state history.
    pub history_retention: usize,
    pub seed: u64,
    pub creatures: CreatureConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            initial_herbivores: INITIAL_HERBIVORES,
            initial_predators: INITIAL_PREDATORS,
            initial_grass: INITIAL_GRASS,
            initial_stones: INITIAL_STONES,
            min_grass: MIN_GRASS,
            grass_spawn_chance: GRASS_SPAWN_CHANCE,
            hunger_damage: HUNGER_DAMAGE,
            max_turns: MAX_TURNS,
            turn_delay_ms: TURN_DELAY_MS,
            history_retention: HISTORY_RETENTION,
            seed: DEFAULT_SEED,
            creatures: CreatureConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| SimError::Configuration(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.board_width <= 0 || self.board_height <= 0 {
            return Err(SimError::Configuration(format!(
                "board dimensions must be positive, got {}x{}",
                self.board_width, self.board_height
            )));
        }
        if !(0.0..=1.0).contains(&self.grass_spawn_chance) {
            return Err(SimError::Configuration(format!(
                "grass_spawn_chance {} must be between 0.0 and 1.0",
                self.grass_spawn_chance
            )));
        }
        if self.hunger_damage < 0 {
            return Err(SimError::Configuration(
                "hunger_damage must not be negative".to_string(),
            ));
        }
        if self.history_retention == 0 {
            return Err(SimError::Configuration(
                "history_retention must keep at least one turn".to_string(),
            ));
        }
        self.creatures.herbivore.validate("herbivore")?;
        self.creatures.predator.validate("predator")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = SimulationConfig::from_json(r#"{ "board_width": 6, "seed": 7 }"#).unwrap();
        assert_eq!(config.board_width, 6);
        assert_eq!(config.seed, 7);
        assert_eq!(config.board_height, BOARD_HEIGHT);
        assert_eq!(config.creatures.predator.attack_damage, PREDATOR_ATTACK_DAMAGE);
    }

    #[test]
    fn single_species_field_can_be_overridden() {
        let config = SimulationConfig::from_json(
            r#"{ "creatures": { "predator": { "escape_chance": 0.5 } } }"#,
        )
        .unwrap();
        let predator = &config.creatures.predator;
        assert_eq!(predator.escape_chance, 0.5);
        assert_eq!(predator.speed, PREDATOR_SPEED);
        assert_eq!(predator.initial_hp, PREDATOR_INITIAL_HP);
        assert_eq!(predator.attack_damage, PREDATOR_ATTACK_DAMAGE);
        assert_eq!(config.creatures.herbivore, SpeciesConfig::herbivore());
    }

    #[test]
    fn herbivore_override_does_not_pick_up_predator_defaults() {
        let config =
            SimulationConfig::from_json(r#"{ "creatures": { "herbivore": { "speed": 2 } } }"#)
                .unwrap();
        let herbivore = &config.creatures.herbivore;
        assert_eq!(herbivore.speed, 2);
        assert_eq!(herbivore.initial_hp, HERBIVORE_INITIAL_HP);
        assert_eq!(herbivore.attack_damage, 0);
        assert_eq!(config.creatures.predator, SpeciesConfig::predator());
    }

    #[test]
    fn misspelled_species_field_is_rejected() {
        let result =
            SimulationConfig::from_json(r#"{ "creatures": { "predator": { "sped": 3 } } }"#);
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }

    #[test]
    fn non_positive_board_is_rejected() {
        let config = SimulationConfig {
            board_width: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));
    }

    #[test]
    fn escape_chance_outside_unit_interval_is_rejected() {
        let mut config = SimulationConfig::default();
        config.creatures.predator.escape_chance = 1.5;
        assert!(config.validate().is_err());
    }
}
