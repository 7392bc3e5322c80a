//! Road Rager Game Engine
//!
//! Platform-agnostic narrative and state engine for the Road Rager escape game.
//! This crate provides content loading, encounter selection, effect
//! resolution, survival checks and minigame folding without UI or
//! platform-specific dependencies.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod data;
pub mod day_accounting;
pub mod effects;
pub mod encounters;
pub mod error;
pub mod locations;
pub mod minigame;
pub mod result;
pub mod session;
pub mod state;
pub mod storage;

use std::sync::Arc;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogDiagnostic, CatalogError};
pub use config::{ConfigError, EngineConfig, FallbackScores};
pub use data::{
    Character, CharacterIntro, Encounter, EncounterData, EncounterOption, Faction, Outcome,
    RequiredChoice, ResourceDelta, TrustEffect,
};
pub use day_accounting::{TravelOutcome, advance_day};
pub use effects::{ChoiceOutcome, StateDelta, apply_delta, apply_option};
pub use encounters::{EncounterPick, EncounterRequest, SelectionRule, pick_encounter};
pub use error::EngineError;
pub use locations::{Availability, Location, LocationChoice, available_locations};
pub use minigame::{
    Difficulty, MinigameDescriptor, MinigameKind, MinigameResult, MinigameSession,
    MinigameSignal, SettledMinigame, minigame_delta,
};
pub use result::{Ending, EndingSummary, ResourceWarning, TrustTier, ending_summary};
pub use session::{GameSession, MinigameReport, MinigameTicket};
pub use state::{ChoiceLog, Resources, WorldState};
pub use storage::{JsonFileStorage, MemoryStorage, StorageError};

/// Trait for abstracting content loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the content catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be loaded.
    fn load_encounter_data(&self) -> Result<EncounterData, Self::Error>;

    /// Load engine configuration; defaults unless overridden
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(EngineConfig::default())
    }
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save world state into a slot
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    fn save_state(&self, slot: &str, state: &WorldState) -> Result<(), Self::Error>;

    /// Load world state from a slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn load_state(&self, slot: &str) -> Result<Option<WorldState>, Self::Error>;

    /// Delete a saved slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    fn delete_state(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Loader serving the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl DataLoader for BundledLoader {
    type Error = serde_json::Error;

    fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
        EncounterData::bundled()
    }
}

/// Main game engine wiring content and storage into sessions
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Load, index and validate the catalog and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if content or configuration cannot be loaded, the
    /// catalog has colliding ids, or the configuration does not fit it.
    pub fn prepare(&self) -> Result<(Arc<Catalog>, EngineConfig), anyhow::Error> {
        let data = self.data_loader.load_encounter_data()?;
        let catalog = Catalog::new(data)?;
        let config = self.data_loader.load_engine_config()?;
        config.validate_against(&catalog)?;
        Ok((Arc::new(catalog), config))
    }

    /// Start a session, resuming the persisted slot when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or configuration cannot be prepared.
    pub fn start_session(&self) -> Result<GameSession<S>, anyhow::Error>
    where
        S: Clone,
    {
        let (catalog, config) = self.prepare()?;
        Ok(GameSession::new(catalog, config, self.storage.clone()))
    }

    /// Save a world state into a slot
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be saved.
    pub fn save_state(&self, slot: &str, state: &WorldState) -> Result<(), S::Error> {
        self.storage.save_state(slot, state)
    }

    /// Load a world state from a slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    pub fn load_state(&self, slot: &str) -> Result<Option<WorldState>, S::Error> {
        self.storage.load_state(slot)
    }

    /// Delete a saved slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    pub fn delete_state(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_state(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
            Ok(EncounterData::from_encounters(vec![Encounter {
                id: "intro".into(),
                title: "Start".into(),
                description: String::new(),
                location: "apartment".into(),
                day: Some(1),
                image: None,
                character: None,
                required_choice: None,
                minigame: None,
                auto_progress_after_minigame: false,
                options: vec![EncounterOption {
                    id: "go".into(),
                    text: "Go".into(),
                    resource_effect: ResourceDelta::default(),
                    car_health_effect: None,
                    trust_effect: Vec::new(),
                    outcome: Outcome::default(),
                }],
                is_deceptive: false,
            }]))
        }

        fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
            Ok(EngineConfig {
                storage_key: "fixture-slot".into(),
                ..EngineConfig::default()
            })
        }
    }

    #[test]
    fn engine_starts_and_resumes_sessions() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::new());
        let mut session = engine.start_session().unwrap();
        assert_eq!(session.current_encounter().unwrap().id, "intro");
        session.choose_option("go").unwrap();

        let resumed = engine.start_session().unwrap();
        assert!(resumed.state().is_completed("intro"));
        assert!(engine.load_state("fixture-slot").unwrap().is_some());
        engine.delete_state("fixture-slot").unwrap();
        assert!(engine.load_state("fixture-slot").unwrap().is_none());
    }

    #[test]
    fn bundled_loader_prepares_clean_catalog() {
        let engine = GameEngine::new(BundledLoader, MemoryStorage::new());
        let (catalog, config) = engine.prepare().unwrap();
        assert!(catalog.diagnostics().is_empty());
        assert_eq!(config.storage_key, constants::STORAGE_KEY);
    }

    #[test]
    fn engine_rejects_config_that_misses_catalog() {
        struct BadConfigLoader;
        impl DataLoader for BadConfigLoader {
            type Error = serde_json::Error;

            fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
                EncounterData::bundled()
            }

            fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
                Ok(EngineConfig {
                    intro_encounter_id: "prologue".into(),
                    ..EngineConfig::default()
                })
            }
        }

        let engine = GameEngine::new(BadConfigLoader, MemoryStorage::new());
        let err = engine.start_session().err().unwrap();
        assert!(err.to_string().contains("prologue"));
    }
}
