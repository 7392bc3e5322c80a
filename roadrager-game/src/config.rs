//! Engine configuration passed explicitly into every session.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::constants::{
    CAR_HEALTH_MAX, CAR_HEALTH_MIN, DAILY_FOOD_COST, DAILY_FUEL_COST, FALLBACK_SCORE_EASY,
    FALLBACK_SCORE_HARD, FALLBACK_SCORE_MEDIUM, INTRO_ENCOUNTER_ID, START_CAR_HEALTH, START_FOOD,
    START_FUEL, START_LOCATION, START_MEDICINE, START_PARTS, STORAGE_KEY,
};
use crate::state::Resources;

/// Scores reported when a minigame ends through the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackScores {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for FallbackScores {
    fn default() -> Self {
        Self {
            easy: FALLBACK_SCORE_EASY,
            medium: FALLBACK_SCORE_MEDIUM,
            hard: FALLBACK_SCORE_HARD,
        }
    }
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: i32 },
    #[error("starting car health must be between {min} and {max} (got {value})")]
    CarHealthRange { min: i32, max: i32, value: i32 },
    #[error("start location '{location}' is not declared in the location table")]
    UnknownStartLocation { location: String },
    #[error("intro encounter '{encounter}' is not in the catalog")]
    UnknownIntroEncounter { encounter: String },
    #[error("failed to parse engine config: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub start_location: String,
    pub intro_encounter_id: String,
    /// Persistence slot the session reads and writes.
    pub storage_key: String,
    pub starting_resources: Resources,
    pub starting_car_health: i32,
    pub daily_food_cost: i32,
    pub daily_fuel_cost: i32,
    pub fallback_scores: FallbackScores,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_location: START_LOCATION.to_string(),
            intro_encounter_id: INTRO_ENCOUNTER_ID.to_string(),
            storage_key: STORAGE_KEY.to_string(),
            starting_resources: Resources {
                fuel: START_FUEL,
                food: START_FOOD,
                medicine: START_MEDICINE,
                parts: START_PARTS,
            },
            starting_car_health: START_CAR_HEALTH,
            daily_food_cost: DAILY_FOOD_COST,
            daily_fuel_cost: DAILY_FUEL_COST,
            fallback_scores: FallbackScores::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_location.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "start_location",
            });
        }
        if self.intro_encounter_id.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "intro_encounter_id",
            });
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "storage_key",
            });
        }
        if self.daily_food_cost <= 0 {
            return Err(ConfigError::NotPositive {
                field: "daily_food_cost",
                value: self.daily_food_cost,
            });
        }
        if self.daily_fuel_cost <= 0 {
            return Err(ConfigError::NotPositive {
                field: "daily_fuel_cost",
                value: self.daily_fuel_cost,
            });
        }
        if !(CAR_HEALTH_MIN..=CAR_HEALTH_MAX).contains(&self.starting_car_health) {
            return Err(ConfigError::CarHealthRange {
                min: CAR_HEALTH_MIN,
                max: CAR_HEALTH_MAX,
                value: self.starting_car_health,
            });
        }
        Ok(())
    }

    /// Validate references into a loaded catalog.
    ///
    /// Catalogs without a location table are accepted as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the start location or intro encounter is unknown.
    pub fn validate_against(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        self.validate()?;
        if !catalog.locations().is_empty() && catalog.location(&self.start_location).is_none() {
            return Err(ConfigError::UnknownStartLocation {
                location: self.start_location.clone(),
            });
        }
        if catalog.encounter(&self.intro_encounter_id).is_none() {
            return Err(ConfigError::UnknownIntroEncounter {
                encounter: self.intro_encounter_id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EncounterData;

    #[test]
    fn defaults_match_opening_snapshot() {
        let config = EngineConfig::default();
        assert_eq!(config.start_location, "apartment");
        assert_eq!(config.storage_key, "roadRagerGameState");
        assert_eq!(config.starting_resources.food, 70);
        assert_eq!(config.starting_resources.fuel, 50);
        assert_eq!(config.starting_car_health, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "dailyFoodCost": 12 }"#).unwrap();
        assert_eq!(config.daily_food_cost, 12);
        assert_eq!(config.daily_fuel_cost, 5);
        assert_eq!(config.fallback_scores.hard, 20);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = EngineConfig::from_json(r#"{ "dailyFuelCost": 0 }"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotPositive {
                field: "daily_fuel_cost",
                value: 0
            }
        );

        let config = EngineConfig {
            starting_car_health: 140,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CarHealthRange { value: 140, .. })
        ));

        let config = EngineConfig {
            start_location: "  ".into(),
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Empty {
                field: "start_location"
            })
        );

        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn validates_against_bundled_catalog() {
        let catalog = Catalog::new(EncounterData::bundled().unwrap()).unwrap();
        assert!(EngineConfig::default().validate_against(&catalog).is_ok());

        let config = EngineConfig {
            start_location: "moon-base".into(),
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate_against(&catalog),
            Err(ConfigError::UnknownStartLocation {
                location: "moon-base".into()
            })
        );
    }
}
